//! Core types shared by every stage of the compiler

pub mod error;
pub mod error_code;
pub mod period;
pub mod value;

pub use error::*;
pub use period::Period;
pub use value::{EnumValue, Value};
