use std::sync::Arc;

use alloy::{primitives::Address, rpc::types::Log, sol_types::SolCall};
use async_trait::async_trait;
use log::{debug, warn};

use super::{
    events::{FactoryEvent, LiquidityEvent},
    factory::fetch_all_pools,
    pool::{decode_pool_with_reserves, ensure_pool},
    types::{CommonAddresses, LiquidityProxyState, PoolWithReserves},
};
use crate::{
    abis::IFluidDexResolver,
    error::{DecodeError, SyncError},
    multicall::{CallSpec, MultiWrapper},
    state::{StateStore, SynchronizableStateSource},
};

/// Reserves of every pool the resolver lists at `block_number`.
///
/// One request lists the pools, then one `getPoolReserves` per pool goes out
/// through the aggregator in batches of `default_batch_size`, all pinned to
/// the same height.
pub async fn generate_all_reserves(
    multi: &MultiWrapper,
    resolver: Address,
    block_number: u64,
) -> Result<Vec<PoolWithReserves>, SyncError> {
    let pools = fetch_all_pools(multi, resolver, block_number).await?;
    if pools.is_empty() {
        return Ok(Vec::new());
    }

    let calls: Vec<_> = pools
        .iter()
        .map(|pool| {
            CallSpec::new(
                resolver,
                IFluidDexResolver::getPoolReservesCall { pool_: pool.address }.abi_encode(),
                decode_pool_with_reserves,
            )
        })
        .collect();

    let results = multi
        .aggregate(&calls, block_number, multi.default_batch_size)
        .await?;

    pools
        .iter()
        .zip(results)
        .map(|(pool, reserves)| ensure_pool(pool.address, reserves))
        .collect::<Result<Vec<_>, DecodeError>>()
        .map_err(Into::into)
}

/// Reserves of all Fluid DEX pools, kept as one state.
///
/// Listens to the liquidity proxy for `LogOperate` of any tracked pool and to
/// the factory for newly deployed pools. Either way the whole set is re-read
/// at one head height and committed there.
pub struct FluidDexLiquidityProxy {
    name: String,
    common_addresses: CommonAddresses,
    multi: Arc<MultiWrapper>,
    store: StateStore<LiquidityProxyState>,
    addresses_subscribed: Vec<Address>,
}

impl FluidDexLiquidityProxy {
    pub fn new(
        parent_name: &str,
        common_addresses: CommonAddresses,
        multi: Arc<MultiWrapper>,
        max_versions: u64,
    ) -> Self {
        Self {
            name: format!("{parent_name}_{}", common_addresses.liquidity_proxy),
            common_addresses,
            multi,
            store: StateStore::new(max_versions),
            addresses_subscribed: vec![
                common_addresses.liquidity_proxy,
                common_addresses.dex_factory,
            ],
        }
    }

    async fn regenerate_at_head(&self) -> Result<Option<LiquidityProxyState>, SyncError> {
        let block_number = self.multi.transport().block_number().await?;

        let state = LiquidityProxyState {
            pools: generate_all_reserves(&self.multi, self.common_addresses.resolver, block_number)
                .await?,
        };

        self.store.set_state(state.clone(), block_number).await;

        debug!(
            "{}: reserves of {} pool(s) regenerated at block {}",
            self.name,
            state.pools.len(),
            block_number
        );

        Ok(Some(state))
    }

    fn skip_undecodable(
        &self,
        log: &Log,
        e: DecodeError,
    ) -> Result<Option<LiquidityProxyState>, SyncError> {
        warn!(
            "{}: skipping undecodable log at block {:?} (tx {:?}): {}",
            self.name, log.block_number, log.transaction_hash, e
        );
        Ok(None)
    }
}

#[async_trait]
impl SynchronizableStateSource for FluidDexLiquidityProxy {
    type State = LiquidityProxyState;

    fn name(&self) -> &str {
        &self.name
    }

    fn addresses_subscribed(&self) -> &[Address] {
        &self.addresses_subscribed
    }

    fn store(&self) -> &StateStore<LiquidityProxyState> {
        &self.store
    }

    async fn process_log(
        &self,
        state: &LiquidityProxyState,
        log: &Log,
    ) -> Result<Option<LiquidityProxyState>, SyncError> {
        let emitter = log.address();

        if emitter == self.common_addresses.liquidity_proxy {
            match LiquidityEvent::decode(log.data()) {
                Ok(LiquidityEvent::Operate(event)) if state.contains(event.user) => {
                    self.regenerate_at_head().await
                },
                Ok(_) => Ok(None),
                Err(e) => self.skip_undecodable(log, e),
            }
        } else if emitter == self.common_addresses.dex_factory {
            match FactoryEvent::decode(log.data()) {
                Ok(FactoryEvent::DexDeployed(_)) => self.regenerate_at_head().await,
                Ok(FactoryEvent::Unknown) => Ok(None),
                Err(e) => self.skip_undecodable(log, e),
            }
        } else {
            Ok(None)
        }
    }

    async fn generate_state(&self, block_number: u64) -> Result<LiquidityProxyState, SyncError> {
        Ok(LiquidityProxyState {
            pools: generate_all_reserves(&self.multi, self.common_addresses.resolver, block_number)
                .await?,
        })
    }
}
