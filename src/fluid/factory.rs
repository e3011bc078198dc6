use std::sync::Arc;

use alloy::{primitives::Address, rpc::types::Log, sol_types::SolCall};
use async_trait::async_trait;
use log::{info, warn};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use super::{
    events::FactoryEvent,
    types::{CommonAddresses, DexPool},
};
use crate::{
    abis::IFluidDexResolver,
    error::{DecodeError, SyncError},
    multicall::{decode_call_output, CallOutput, CallSpec, MultiWrapper},
    state::{StateStore, SynchronizableStateSource},
};

/// Decode a `getAllPools` answer.
pub fn decode_all_pools(output: CallOutput<'_>) -> Result<Vec<DexPool>, DecodeError> {
    decode_call_output::<IFluidDexResolver::getAllPoolsCall>(output)
        .map(|pools| pools.into_iter().map(DexPool::from).collect())
}

/// Every pool the resolver lists at `block_number`, in resolver order.
pub async fn fetch_all_pools(
    multi: &MultiWrapper,
    resolver: Address,
    block_number: u64,
) -> Result<Vec<DexPool>, SyncError> {
    let calls = [CallSpec::new(
        resolver,
        IFluidDexResolver::getAllPoolsCall {}.abi_encode(),
        decode_all_pools,
    )];

    let mut results = multi
        .aggregate(&calls, block_number, multi.default_batch_size)
        .await?;

    Ok(results.pop().unwrap_or_default())
}

/// Append every pool of `fetched` not already in `known`, keeping first-seen order.
///
/// Returns the merged list and the pools that were new.
pub fn merge_pools(known: &[DexPool], fetched: Vec<DexPool>) -> (Vec<DexPool>, Vec<DexPool>) {
    let mut seen: FxHashSet<Address> = known.iter().map(|p| p.address).collect();
    let mut merged = known.to_vec();
    let mut discovered = Vec::new();

    for pool in fetched {
        if seen.insert(pool.address) {
            merged.push(pool);
            discovered.push(pool);
        }
    }

    (merged, discovered)
}

/// Set of deployed DEX pools, grown from the factory's `LogDexDeployed`.
///
/// Newly discovered pools are forwarded to `on_pools_discovered` so the host
/// can start tracking their reserves.
pub struct FluidDexFactory {
    name: String,
    common_addresses: CommonAddresses,
    multi: Arc<MultiWrapper>,
    store: StateStore<Vec<DexPool>>,
    addresses_subscribed: Vec<Address>,
    on_pools_discovered: Option<mpsc::Sender<Vec<DexPool>>>,
}

impl FluidDexFactory {
    pub fn new(
        parent_name: &str,
        common_addresses: CommonAddresses,
        multi: Arc<MultiWrapper>,
        max_versions: u64,
        on_pools_discovered: Option<mpsc::Sender<Vec<DexPool>>>,
    ) -> Self {
        Self {
            name: format!("{parent_name}_factory"),
            common_addresses,
            multi,
            store: StateStore::new(max_versions),
            addresses_subscribed: vec![common_addresses.dex_factory],
            on_pools_discovered,
        }
    }

    async fn handle_dex_deployed(
        &self,
        state: &[DexPool],
    ) -> Result<Option<Vec<DexPool>>, SyncError> {
        let block_number = self.multi.transport().block_number().await?;
        let fetched =
            fetch_all_pools(&self.multi, self.common_addresses.resolver, block_number).await?;

        let (merged, discovered) = merge_pools(state, fetched);

        self.store.set_state(merged.clone(), block_number).await;

        if !discovered.is_empty() {
            info!(
                "{}: discovered {} new pool(s) at block {}",
                self.name,
                discovered.len(),
                block_number
            );

            if let Some(sender) = &self.on_pools_discovered {
                if sender.send(discovered).await.is_err() {
                    warn!("{}: pool discovery receiver dropped", self.name);
                }
            }
        }

        Ok(Some(merged))
    }
}

#[async_trait]
impl SynchronizableStateSource for FluidDexFactory {
    type State = Vec<DexPool>;

    fn name(&self) -> &str {
        &self.name
    }

    fn addresses_subscribed(&self) -> &[Address] {
        &self.addresses_subscribed
    }

    fn store(&self) -> &StateStore<Vec<DexPool>> {
        &self.store
    }

    async fn process_log(
        &self,
        state: &Vec<DexPool>,
        log: &Log,
    ) -> Result<Option<Vec<DexPool>>, SyncError> {
        let event = match FactoryEvent::decode(log.data()) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "{}: skipping undecodable log at block {:?} (tx {:?}): {}",
                    self.name, log.block_number, log.transaction_hash, e
                );
                return Ok(None);
            },
        };

        match event {
            FactoryEvent::DexDeployed(_) => self.handle_dex_deployed(state).await,
            FactoryEvent::Unknown => Ok(None),
        }
    }

    async fn generate_state(&self, block_number: u64) -> Result<Vec<DexPool>, SyncError> {
        let fetched =
            fetch_all_pools(&self.multi, self.common_addresses.resolver, block_number).await?;
        Ok(merge_pools(&[], fetched).0)
    }
}
