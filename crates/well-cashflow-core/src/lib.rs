pub mod error;
pub mod time_axis;
pub mod types;

#[cfg(feature = "dda")]
pub mod dda;

#[cfg(feature = "income_tax")]
pub mod income_tax;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

pub use error::EngineError;
pub use types::*;

/// Standard result type for all cash-flow engine operations
pub type EngineResult<T> = Result<T, EngineError>;
