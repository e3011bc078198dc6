pub mod poller;

pub use poller::{LogFeed, LogPoller};
