//! In-memory chain used by unit tests.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;

use super::transport::MulticallTransport;
use crate::{
    abis::{Call3, McResult},
    error::TransportError,
};

type Responder = Box<dyn Fn(&Call3, u64) -> McResult + Send + Sync>;

/// Answers every `aggregate3` entry through `respond`, which also sees the
/// pinned block, and records each request.
pub struct MockTransport {
    head: AtomicU64,
    head_step: AtomicU64,
    respond: Responder,
    aggregate_calls: AtomicUsize,
    blocks: Mutex<Vec<u64>>,
    fail_next: AtomicUsize,
}

impl MockTransport {
    pub fn new(
        head: u64,
        respond: impl Fn(&Call3, u64) -> McResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            head: AtomicU64::new(head),
            head_step: AtomicU64::new(0),
            respond: Box::new(respond),
            aggregate_calls: AtomicUsize::new(0),
            blocks: Mutex::new(Vec::new()),
            fail_next: AtomicUsize::new(0),
        }
    }

    pub fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    /// Move the head forward by `step` after every `block_number` read.
    pub fn advance_head_per_read(&self, step: u64) {
        self.head_step.store(step, Ordering::SeqCst);
    }

    /// Make the next `n` aggregate requests time out.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }

    pub fn requested_blocks(&self) -> Vec<u64> {
        self.blocks.lock().unwrap().clone()
    }
}

#[async_trait]
impl MulticallTransport for MockTransport {
    async fn block_number(&self) -> Result<u64, TransportError> {
        let step = self.head_step.load(Ordering::SeqCst);
        Ok(self.head.fetch_add(step, Ordering::SeqCst))
    }

    async fn aggregate3(
        &self,
        calls: Vec<Call3>,
        block_number: u64,
    ) -> Result<Vec<McResult>, TransportError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        self.blocks.lock().unwrap().push(block_number);

        let pending_failures = self.fail_next.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.fail_next.store(pending_failures - 1, Ordering::SeqCst);
            return Err(TransportError::Timeout(std::time::Duration::from_secs(30)));
        }

        Ok(calls
            .iter()
            .map(|call| (self.respond)(call, block_number))
            .collect())
    }
}
