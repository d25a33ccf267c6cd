pub mod frequency;
pub mod monthly;
pub mod schedule;
pub mod source;
pub mod validator;

#[cfg(feature = "statement")]
pub mod statement;
