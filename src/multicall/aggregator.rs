use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use futures::future::try_join_all;
use log::debug;

use super::{decode::CallOutput, transport::MulticallTransport};
use crate::{
    abis::{Call3, McResult},
    error::{DecodeError, SyncError, TransportError},
};

/// Default number of calls per multicall request
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Stateless decoder for a single call result.
pub type DecodeFn<T> = fn(CallOutput<'_>) -> Result<T, DecodeError>;

/// One read to bundle into a multicall: where to send it, what to send, and
/// how to turn the answer into `T`.
pub struct CallSpec<T> {
    pub target: Address,
    pub call_data: Bytes,
    pub decode: DecodeFn<T>,
}

impl<T> CallSpec<T> {
    pub fn new(target: Address, call_data: impl Into<Bytes>, decode: DecodeFn<T>) -> Self {
        Self {
            target,
            call_data: call_data.into(),
            decode,
        }
    }
}

/// Splits call lists into Multicall3 batches and reassembles decoded results.
///
/// Nothing is cached here: every [`MultiWrapper::aggregate`] goes to the chain.
#[derive(Clone)]
pub struct MultiWrapper {
    transport: Arc<dyn MulticallTransport>,
    pub default_batch_size: usize,
}

impl MultiWrapper {
    pub fn new(transport: Arc<dyn MulticallTransport>, default_batch_size: usize) -> Self {
        Self {
            transport,
            default_batch_size: default_batch_size.max(1),
        }
    }

    pub fn transport(&self) -> &Arc<dyn MulticallTransport> {
        &self.transport
    }

    /// Execute `calls` at `block_number` in batches of at most `max_batch_size`.
    ///
    /// Batches are issued concurrently. The returned values are in the same
    /// order as `calls`. A revert, an empty answer or a decode failure in any
    /// call fails the whole aggregate.
    pub async fn aggregate<T>(
        &self,
        calls: &[CallSpec<T>],
        block_number: u64,
        max_batch_size: usize,
    ) -> Result<Vec<T>, SyncError> {
        if calls.is_empty() {
            return Err(SyncError::EmptyCallList);
        }

        let batch_size = max_batch_size.max(1);

        debug!(
            "Aggregating {} calls at block {} in batches of {}",
            calls.len(),
            block_number,
            batch_size
        );

        let batches = calls
            .chunks(batch_size)
            .enumerate()
            .map(|(i, chunk)| self.execute_batch(chunk, i * batch_size, block_number));

        let decoded = try_join_all(batches).await?;

        Ok(decoded.into_iter().flatten().collect())
    }

    async fn execute_batch<T>(
        &self,
        chunk: &[CallSpec<T>],
        offset: usize,
        block_number: u64,
    ) -> Result<Vec<T>, SyncError> {
        let calls: Vec<Call3> = chunk
            .iter()
            .map(|spec| Call3 {
                target: spec.target,
                allowFailure: true,
                callData: spec.call_data.clone(),
            })
            .collect();

        let results = self.transport.aggregate3(calls, block_number).await?;

        if results.len() != chunk.len() {
            return Err(TransportError::ResultCountMismatch {
                expected: chunk.len(),
                got: results.len(),
            }
            .into());
        }

        chunk
            .iter()
            .zip(results.iter())
            .enumerate()
            .map(|(i, (spec, result))| decode_checked(spec, result, offset + i))
            .collect()
    }
}

fn decode_checked<T>(spec: &CallSpec<T>, result: &McResult, index: usize) -> Result<T, SyncError> {
    if !result.success {
        return Err(TransportError::CallReverted {
            index,
            target: spec.target,
        }
        .into());
    }

    if result.returnData.is_empty() {
        return Err(TransportError::EmptyReturnData {
            index,
            target: spec.target,
        }
        .into());
    }

    Ok((spec.decode)(CallOutput::Multi(result))?)
}
