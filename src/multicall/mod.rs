//! Batched read-only contract calls and the decoding of their results.

pub mod aggregator;
pub mod decode;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{CallSpec, DecodeFn, MultiWrapper, DEFAULT_BATCH_SIZE};
pub use decode::{decode_call_output, decode_event, general_decode, CallOutput};
pub use transport::{MulticallTransport, RpcTransport, DEFAULT_CALL_TIMEOUT};
