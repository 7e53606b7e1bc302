use super::op_class::OpClass;

/// Errors raised by the functional unit pool.
///
/// A stall is not an error: see [`AllocationResult::Stall`](super::pool::AllocationResult).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Two descriptors of one pool claim the same operation class.
    #[error("operation class {op} is declared by both {first} and {second}")]
    DuplicateOperationClass {
        op: OpClass,
        first: String,
        second: String,
    },

    /// No descriptor of the pool services the operation class.
    #[error("no functional unit services operation class {0}")]
    UnsupportedOperation(OpClass),

    /// Requested operand width is above the unit's width cap.
    /// The requester must split the operation.
    #[error("{op} requests {requested} bits but {unit} is capped at {cap} bits")]
    WidthExceeded {
        op: OpClass,
        unit: String,
        requested: u32,
        cap: u32,
    },

    #[error("instance {0} does not exist")]
    UnknownInstance(usize),

    #[error("invalid functional unit {name}: {detail}")]
    InvalidDescriptor { name: String, detail: String },
}

pub type Result<T> = std::result::Result<T, PoolError>;
