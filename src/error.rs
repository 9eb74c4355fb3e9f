use thiserror::Error;

use crate::resource::Resource;

/// Error taxonomy for the scheduler core.
///
/// `MalformedInput` and `Io` are fatal: the caller should abort. `InfeasibleJob`
/// is recoverable: the offending job is reported and dropped, simulation
/// continues. `InvariantViolation` signals a programmer error in the
/// reservation map and should never occur for well-formed input; it is
/// surfaced rather than masked.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("malformed input in '{file}', field '{field}': {reason}")]
    MalformedInput { file: String, field: String, reason: String },

    #[error("job {job_id} is infeasible: requires {node_num} nodes with req {req:?}, only {available} node(s) qualify")]
    InfeasibleJob { job_id: u64, node_num: usize, req: Resource, available: usize },

    #[error("reservation map invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
