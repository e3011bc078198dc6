pub mod store;
pub mod subscriber;

pub use store::{StateStore, DEFAULT_MAX_VERSIONS};
pub use subscriber::SynchronizableStateSource;
