use std::time::Duration;

use alloy::{
    eips::BlockId,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use url::Url;

use crate::{
    abis::{Call3, IMulticall3, McResult},
    error::TransportError,
};

/// Timeout for a single RPC round trip (30 seconds)
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The chain reads the aggregator needs. Kept as a trait so the state layer
/// can run against a recorded or in-memory chain.
#[async_trait]
pub trait MulticallTransport: Send + Sync {
    /// Current head block number.
    async fn block_number(&self) -> Result<u64, TransportError>;

    /// Execute one Multicall3 `aggregate3` pinned to `block_number`.
    async fn aggregate3(
        &self,
        calls: Vec<Call3>,
        block_number: u64,
    ) -> Result<Vec<McResult>, TransportError>;
}

/// JSON-RPC backed transport using a deployed Multicall3 contract.
#[derive(Clone)]
pub struct RpcTransport {
    provider: DynProvider,
    multicall_address: Address,
    call_timeout: Duration,
}

impl RpcTransport {
    pub fn new(rpc_url: Url, multicall_address: Address, call_timeout: Duration) -> Self {
        let client = ProviderBuilder::new().connect_http(rpc_url);

        Self {
            provider: DynProvider::new(client),
            multicall_address,
            call_timeout,
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl MulticallTransport for RpcTransport {
    async fn block_number(&self) -> Result<u64, TransportError> {
        let block = tokio::time::timeout(self.call_timeout, self.provider.get_block_number())
            .await
            .map_err(|_| TransportError::Timeout(self.call_timeout))??;

        Ok(block)
    }

    async fn aggregate3(
        &self,
        calls: Vec<Call3>,
        block_number: u64,
    ) -> Result<Vec<McResult>, TransportError> {
        let multicall = IMulticall3::new(self.multicall_address, &self.provider);

        let results = tokio::time::timeout(
            self.call_timeout,
            multicall
                .aggregate3(calls)
                .block(BlockId::number(block_number))
                .call(),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.call_timeout))??;

        Ok(results)
    }
}
