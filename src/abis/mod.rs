pub mod fluid_dex;
pub mod multicall;

pub use fluid_dex::{IFluidDexFactory, IFluidDexResolver, IFluidLiquidity};
pub use multicall::{Call3, IMulticall3, McResult};
