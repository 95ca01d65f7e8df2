pub mod common;
pub mod convert;
