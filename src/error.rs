//! Error types shared by the decode, multicall and state layers.
//!
//! Decode failures of logs are swallowed at the event routers; everything
//! else propagates to whoever drives the subscriber.

use alloy::primitives::Address;
use thiserror::Error;

/// Raw bytes did not match the declared ABI layout.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no data to decode as {what}")]
    EmptyData { what: &'static str },

    #[error("failed to decode {what}: {source}")]
    Abi {
        what: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },

    #[error("call reverted, nothing to decode")]
    CallFailed,

    #[error("resolver answered for pool {actual}, expected {expected}")]
    PoolMismatch { expected: Address, actual: Address },
}

/// Network, RPC or multicall-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rpc request failed: {0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("multicall request failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("rpc request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("call #{index} to {target} reverted")]
    CallReverted { index: usize, target: Address },

    #[error("call #{index} to {target} returned no data")]
    EmptyReturnData { index: usize, target: Address },

    #[error("multicall returned {got} results for {expected} calls")]
    ResultCountMismatch { expected: usize, got: usize },
}

/// Anything that can stop a state regeneration.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("aggregate called with an empty call list")]
    EmptyCallList,
}
