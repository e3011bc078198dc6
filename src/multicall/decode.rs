//! ABI decoding for call results and event logs.
//!
//! Both paths funnel through [`general_decode`], so adding a new layout only
//! means declaring it in `abis` and pointing one of the helpers at it.

use alloy::{
    primitives::{Bytes, LogData},
    sol_types::{SolCall, SolEvent},
};

use crate::{abis::McResult, error::DecodeError};

/// A call result as handed to a decode function: either plain return data or
/// a Multicall3 result that still carries its success flag.
#[derive(Debug, Clone, Copy)]
pub enum CallOutput<'a> {
    Raw(&'a [u8]),
    Multi(&'a McResult),
}

impl CallOutput<'_> {
    /// The bytes to decode, or [`DecodeError::CallFailed`] for a reverted multicall entry.
    pub fn return_data(&self) -> Result<&[u8], DecodeError> {
        match self {
            CallOutput::Raw(data) => Ok(data),
            CallOutput::Multi(result) if result.success => Ok(result.returnData.as_ref()),
            CallOutput::Multi(_) => Err(DecodeError::CallFailed),
        }
    }
}

impl<'a> From<&'a [u8]> for CallOutput<'a> {
    fn from(data: &'a [u8]) -> Self {
        CallOutput::Raw(data)
    }
}

impl<'a> From<&'a Bytes> for CallOutput<'a> {
    fn from(data: &'a Bytes) -> Self {
        CallOutput::Raw(data.as_ref())
    }
}

impl<'a> From<&'a McResult> for CallOutput<'a> {
    fn from(result: &'a McResult) -> Self {
        CallOutput::Multi(result)
    }
}

/// Shared entry point: runs `decoder` over `input` and tags any failure with
/// `what`, the name of the layout being decoded.
pub fn general_decode<I, T, F>(
    what: &'static str,
    input: &I,
    is_empty: bool,
    decoder: F,
) -> Result<T, DecodeError>
where
    I: ?Sized,
    F: FnOnce(&I) -> alloy::sol_types::Result<T>,
{
    if is_empty {
        return Err(DecodeError::EmptyData { what });
    }

    decoder(input).map_err(|source| DecodeError::Abi { what, source })
}

/// Decode the return value of `C` from a call result.
pub fn decode_call_output<C: SolCall>(output: CallOutput<'_>) -> Result<C::Return, DecodeError> {
    let data = output.return_data()?;
    general_decode(C::SIGNATURE, data, data.is_empty(), |d: &[u8]| {
        C::abi_decode_returns(d)
    })
}

/// Decode event `E` from raw log topics and data.
pub fn decode_event<E: SolEvent>(log: &LogData) -> Result<E, DecodeError> {
    general_decode(E::SIGNATURE, log, log.topics().is_empty(), E::decode_log_data)
}
