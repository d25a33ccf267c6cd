pub mod error;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "investment")]
pub mod investment;

#[cfg(feature = "transfer_tax")]
pub mod transfer_tax;

pub use error::PropFinError;
pub use types::*;

/// Standard result type for all propfin operations
pub type PropFinResult<T> = Result<T, PropFinError>;
