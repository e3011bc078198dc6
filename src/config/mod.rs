mod settings;

pub use settings::{FluidSettings, RpcSettings, Settings, SyncSettings};
