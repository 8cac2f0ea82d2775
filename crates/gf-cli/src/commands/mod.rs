//! Run modes.

pub mod fill;
pub mod streams;
pub mod validate;
