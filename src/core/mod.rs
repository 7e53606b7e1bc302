pub mod error;
pub mod latency;
pub mod op_class;
pub mod pool;
