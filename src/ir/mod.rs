//! Intermediate representation: the DSL expression tree.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::{ValidationError, validate_ir};
