pub mod abis;
pub mod config;
pub mod error;
pub mod fluid;
pub mod multicall;
pub mod state;
pub mod worker;

pub use config::Settings;
pub use error::{DecodeError, SyncError, TransportError};
pub use fluid::{FluidDexEventPool, FluidDexFactory, FluidDexLiquidityProxy, ReserveSnapshot};
pub use multicall::{MultiWrapper, RpcTransport};
pub use state::{StateStore, SynchronizableStateSource};
pub use worker::LogPoller;
