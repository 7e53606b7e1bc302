use crate::core::error::PoolError;

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("trace line {line}: {detail}")]
    Trace { line: usize, detail: String },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("gave up after {limit} cycles with {pending} operations pending")]
    CycleLimit { limit: u64, pending: usize },
}

pub type Result<T> = std::result::Result<T, IssueError>;
