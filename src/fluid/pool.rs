use std::sync::Arc;

use alloy::{primitives::Address, rpc::types::Log, sol_types::SolCall};
use async_trait::async_trait;
use log::{debug, warn};

use super::{
    events::LiquidityEvent,
    types::{CommonAddresses, PoolWithReserves, ReserveSnapshot},
};
use crate::{
    abis::{IFluidDexResolver, IFluidLiquidity},
    error::{DecodeError, SyncError},
    multicall::{decode_call_output, CallOutput, CallSpec, MultiWrapper},
    state::{StateStore, SynchronizableStateSource},
};

/// Decode a `getPoolReserves` answer into [`PoolWithReserves`].
pub fn decode_pool_with_reserves(output: CallOutput<'_>) -> Result<PoolWithReserves, DecodeError> {
    decode_call_output::<IFluidDexResolver::getPoolReservesCall>(output).map(Into::into)
}

/// Read the reserves of `pool` from the resolver at `block_number`.
///
/// The chain is immutable at a finalized height, so the same inputs always
/// produce the same snapshot. Failures are returned as-is; retrying is up to
/// the caller.
pub async fn generate_pool_state(
    multi: &MultiWrapper,
    resolver: Address,
    pool: Address,
    block_number: u64,
) -> Result<ReserveSnapshot, SyncError> {
    let calls = [CallSpec::new(
        resolver,
        IFluidDexResolver::getPoolReservesCall { pool_: pool }.abi_encode(),
        decode_pool_with_reserves,
    )];

    let results = multi
        .aggregate(&calls, block_number, multi.default_batch_size)
        .await?;

    let Some(reserves) = results.into_iter().next() else {
        return Err(DecodeError::EmptyData {
            what: IFluidDexResolver::getPoolReservesCall::SIGNATURE,
        }
        .into());
    };

    Ok(ensure_pool(pool, reserves)?.snapshot())
}

/// `reserves` as long as the resolver answered for `requested`.
pub(crate) fn ensure_pool(
    requested: Address,
    reserves: PoolWithReserves,
) -> Result<PoolWithReserves, DecodeError> {
    if reserves.pool.address != requested {
        return Err(DecodeError::PoolMismatch {
            expected: requested,
            actual: reserves.pool.address,
        });
    }

    Ok(reserves)
}

/// Reserve state of a single Fluid DEX pool.
///
/// Listens to the liquidity proxy: every swap, deposit or withdrawal on the
/// pool settles through the liquidity layer, which emits `LogOperate` with the
/// pool as `user`. On such a log the reserves are re-read in full from the
/// resolver instead of applying the operate amounts.
pub struct FluidDexEventPool {
    name: String,
    pool: Address,
    common_addresses: CommonAddresses,
    multi: Arc<MultiWrapper>,
    store: StateStore<ReserveSnapshot>,
    addresses_subscribed: Vec<Address>,
}

impl FluidDexEventPool {
    pub fn new(
        parent_name: &str,
        pool: Address,
        common_addresses: CommonAddresses,
        multi: Arc<MultiWrapper>,
        max_versions: u64,
    ) -> Self {
        Self {
            name: format!("{parent_name}_{pool}"),
            pool,
            common_addresses,
            multi,
            store: StateStore::new(max_versions),
            addresses_subscribed: vec![common_addresses.liquidity_proxy],
        }
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    async fn handle_operate(
        &self,
        event: IFluidLiquidity::LogOperate,
    ) -> Result<Option<ReserveSnapshot>, SyncError> {
        if event.user != self.pool {
            return Ok(None);
        }

        // One height for both the read and the cache key
        let block_number = self.multi.transport().block_number().await?;

        let state = generate_pool_state(
            &self.multi,
            self.common_addresses.resolver,
            self.pool,
            block_number,
        )
        .await?;

        self.store.set_state(state.clone(), block_number).await;

        debug!("{}: reserves regenerated at block {}", self.name, block_number);

        Ok(Some(state))
    }
}

#[async_trait]
impl SynchronizableStateSource for FluidDexEventPool {
    type State = ReserveSnapshot;

    fn name(&self) -> &str {
        &self.name
    }

    fn addresses_subscribed(&self) -> &[Address] {
        &self.addresses_subscribed
    }

    fn store(&self) -> &StateStore<ReserveSnapshot> {
        &self.store
    }

    async fn process_log(
        &self,
        _state: &ReserveSnapshot,
        log: &Log,
    ) -> Result<Option<ReserveSnapshot>, SyncError> {
        let event = match LiquidityEvent::decode(log.data()) {
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
            LiquidityEvent::Operate(operate) => self.handle_operate(operate).await,
            LiquidityEvent::Unknown => Ok(None),
        }
    }

    async fn generate_state(&self, block_number: u64) -> Result<ReserveSnapshot, SyncError> {
        generate_pool_state(
            &self.multi,
            self.common_addresses.resolver,
            self.pool,
            block_number,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abis::{Call3, McResult},
        error::TransportError,
        fluid::fixtures::{
            common_addresses, multi, operate_log, pool_address, reserves_at, resolver_chain,
            rpc_log, LIQUIDITY_PROXY, RESOLVER,
        },
        multicall::mock::MockTransport,
        state::DEFAULT_MAX_VERSIONS,
    };
    use alloy::{
        primitives::{Bytes, LogData, B256},
        sol_types::{SolEvent, SolValue},
    };

    fn event_pool(pool: Address, head: u64) -> (FluidDexEventPool, Arc<MockTransport>) {
        let transport = resolver_chain(head, vec![]);
        let subscriber = FluidDexEventPool::new(
            "FluidDex",
            pool,
            common_addresses(),
            multi(transport.clone()),
            DEFAULT_MAX_VERSIONS,
        );
        (subscriber, transport)
    }

    #[tokio::test]
    async fn test_subscribes_to_liquidity_proxy_only() {
        let pool = pool_address(1);
        let (subscriber, _) = event_pool(pool, 100);

        assert_eq!(subscriber.addresses_subscribed(), &[LIQUIDITY_PROXY]);
        assert_eq!(subscriber.name(), format!("FluidDex_{pool}"));
    }

    #[tokio::test]
    async fn test_generate_state_is_deterministic() {
        let pool = pool_address(1);
        let (subscriber, _) = event_pool(pool, 100);

        let first = subscriber.generate_state(21091850).await.unwrap();
        let second = subscriber.generate_state(21091850).await.unwrap();

        assert_eq!(first, second);
        let expected: PoolWithReserves = reserves_at(pool, 21091850).into();
        assert_eq!(first, expected.snapshot());
    }

    #[tokio::test]
    async fn test_generate_state_does_not_commit() {
        let (subscriber, _) = event_pool(pool_address(1), 100);

        subscriber.generate_state(50).await.unwrap();

        assert!(subscriber.store().get_state(50).await.is_none());
    }

    #[tokio::test]
    async fn test_get_state_or_generate_hits_network_once() {
        let (subscriber, transport) = event_pool(pool_address(1), 100);

        let first = subscriber.get_state_or_generate(60, false).await.unwrap();
        let second = subscriber.get_state_or_generate(60, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.aggregate_count(), 1);
        assert_eq!(subscriber.store().get_state(60).await, Some(first));
    }

    #[tokio::test]
    async fn test_readonly_generation_is_not_cached() {
        let (subscriber, transport) = event_pool(pool_address(1), 100);

        subscriber.get_state_or_generate(60, true).await.unwrap();
        subscriber.get_state_or_generate(60, true).await.unwrap();

        assert_eq!(transport.aggregate_count(), 2);
        assert!(subscriber.store().get_state(60).await.is_none());
    }

    #[tokio::test]
    async fn test_operate_for_pool_regenerates_at_head() {
        let pool = pool_address(1);
        let (subscriber, transport) = event_pool(pool, 21091882);
        let state = ReserveSnapshot::default();

        let updated = subscriber
            .process_log(&state, &operate_log(pool, 21091880))
            .await
            .unwrap()
            .expect("operate on tracked pool updates state");

        let expected: PoolWithReserves = reserves_at(pool, 21091882).into();
        assert_eq!(updated, expected.snapshot());
        assert_eq!(transport.requested_blocks(), vec![21091882]);
        assert_eq!(subscriber.store().get_state(21091882).await, Some(updated));
        assert!(subscriber.store().get_state(21091880).await.is_none());
    }

    #[tokio::test]
    async fn test_operate_reads_and_commits_at_one_height() {
        let pool = pool_address(1);
        let (subscriber, transport) = event_pool(pool, 500);
        transport.advance_head_per_read(1);

        let updated = subscriber
            .process_log(&ReserveSnapshot::default(), &operate_log(pool, 499))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(transport.requested_blocks(), vec![500]);
        assert_eq!(subscriber.store().get_state(500).await, Some(updated));
        assert!(subscriber.store().get_state(501).await.is_none());
        assert_eq!(subscriber.store().latest().await.map(|(block, _)| block), Some(500));
    }

    #[tokio::test]
    async fn test_operate_for_other_user_is_ignored() {
        let (subscriber, transport) = event_pool(pool_address(1), 100);

        let result = subscriber
            .process_log(&ReserveSnapshot::default(), &operate_log(pool_address(2), 100))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(transport.aggregate_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_selector_leaves_store_unchanged() {
        let (subscriber, transport) = event_pool(pool_address(1), 100);
        subscriber.get_state_or_generate(90, false).await.unwrap();
        let before = subscriber.store().get_state(90).await;

        let log = rpc_log(
            LIQUIDITY_PROXY,
            LogData::new_unchecked(vec![B256::repeat_byte(0x77)], Bytes::from(vec![1, 2, 3])),
            100,
        );
        let result = subscriber
            .process_log(&ReserveSnapshot::default(), &log)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(subscriber.store().get_state(90).await, before);
        assert!(subscriber.store().get_state(100).await.is_none());
        assert_eq!(transport.aggregate_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_operate_log_is_swallowed() {
        let (subscriber, transport) = event_pool(pool_address(1), 100);

        let log = rpc_log(
            LIQUIDITY_PROXY,
            LogData::new_unchecked(
                vec![IFluidLiquidity::LogOperate::SIGNATURE_HASH],
                Bytes::from(vec![0u8; 7]),
            ),
            100,
        );
        let result = subscriber.process_log(&ReserveSnapshot::default(), &log).await;

        assert!(matches!(result, Ok(None)));
        assert_eq!(transport.aggregate_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_keeps_previous_state() {
        let pool = pool_address(1);
        let (subscriber, transport) = event_pool(pool, 100);
        let committed = subscriber.get_state_or_generate(100, false).await.unwrap();

        transport.set_head(101);
        transport.fail_next(1);
        let result = subscriber
            .process_log(&committed, &operate_log(pool, 101))
            .await;

        assert!(matches!(
            result,
            Err(SyncError::Transport(TransportError::Timeout(_)))
        ));
        assert_eq!(subscriber.store().get_state(100).await, Some(committed));
        assert!(subscriber.store().get_state(101).await.is_none());
    }

    #[tokio::test]
    async fn test_resolver_answer_for_wrong_pool_is_rejected() {
        // Resolver that always answers with pool 1's reserves
        let transport = Arc::new(MockTransport::new(100, |_: &Call3, block_number| McResult {
            success: true,
            returnData: reserves_at(pool_address(1), block_number).abi_encode().into(),
        }));
        let multi = multi(transport);

        let err = generate_pool_state(&multi, RESOLVER, pool_address(2), 100)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Decode(DecodeError::PoolMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_reverting_resolver_is_transport_error() {
        let multi = multi(resolver_chain(100, vec![]));

        let err = generate_pool_state(&multi, Address::repeat_byte(0x01), pool_address(1), 100)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport(TransportError::CallReverted { index: 0, .. })
        ));
    }
}
