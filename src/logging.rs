use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::model::{Operation, ParticipantId};

/// A unique identifier for a particular operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct OperationId(pub usize);

impl Display for OperationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OperationId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> OperationId {
        static OPERATION_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        OperationId(OPERATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Log an incoming operation and assign it an ID.
pub fn log_request(caller: &ParticipantId, operation: &Operation) -> OperationId {
    let id = OperationId::next();
    info!("->op{id} {caller} {operation}");
    id
}

/// Log the outcome of an operation.
pub fn log_response(id: OperationId, result: &Result<()>) {
    match result {
        Ok(()) => info!("<-op{id} ok"),
        Err(err) => warn!("<-op{id} {} error: {err}", err.kind()),
    }
}
