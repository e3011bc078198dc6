//! Fluid DEX reserve tracking.
//!
//! - [`pool`] - per-pool reserve snapshots regenerated on `LogOperate`
//! - [`liquidity_proxy`] - reserves of every pool as one state
//! - [`factory`] - discovery of deployed pools from `LogDexDeployed`
//! - [`events`] - typed routing of the logs the subscribers listen to
//! - [`types`] - reserve snapshot and pool value types

pub mod events;
pub mod factory;
pub mod liquidity_proxy;
pub mod pool;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use events::{FactoryEvent, LiquidityEvent};
pub use factory::{decode_all_pools, fetch_all_pools, merge_pools, FluidDexFactory};
pub use liquidity_proxy::{generate_all_reserves, FluidDexLiquidityProxy};
pub use pool::{decode_pool_with_reserves, generate_pool_state, FluidDexEventPool};
pub use types::{
    CollateralReserves, CommonAddresses, DebtReserves, DexPool, LiquidityProxyState,
    PoolWithReserves, ReserveSnapshot,
};
