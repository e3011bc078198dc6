use alloy::{primitives::Address, rpc::types::Log};
use async_trait::async_trait;

use super::store::StateStore;
use crate::error::SyncError;

/// A piece of on-chain state kept in sync from event logs.
///
/// The host offers every log emitted by [`addresses_subscribed`] to
/// [`process_log`], one at a time, and calls [`generate_state`] for cold
/// starts or after it lost track of the chain.
///
/// [`addresses_subscribed`]: SynchronizableStateSource::addresses_subscribed
/// [`process_log`]: SynchronizableStateSource::process_log
/// [`generate_state`]: SynchronizableStateSource::generate_state
#[async_trait]
pub trait SynchronizableStateSource: Send + Sync {
    type State: Clone + Send + Sync + 'static;

    fn name(&self) -> &str;

    fn addresses_subscribed(&self) -> &[Address];

    fn store(&self) -> &StateStore<Self::State>;

    /// Apply `log` on top of `state`. `Ok(None)` means the log did not change
    /// anything this source tracks.
    async fn process_log(
        &self,
        state: &Self::State,
        log: &Log,
    ) -> Result<Option<Self::State>, SyncError>;

    /// Rebuild the state from chain reads pinned to `block_number`.
    async fn generate_state(&self, block_number: u64) -> Result<Self::State, SyncError>;

    /// Committed state at `block_number`, regenerating it on a miss. The
    /// regenerated state is committed unless `readonly` is set.
    async fn get_state_or_generate(
        &self,
        block_number: u64,
        readonly: bool,
    ) -> Result<Self::State, SyncError> {
        if let Some(state) = self.store().get_state(block_number).await {
            return Ok(state);
        }

        let state = self.generate_state(block_number).await?;
        if !readonly {
            self.store().set_state(state.clone(), block_number).await;
        }

        Ok(state)
    }
}
