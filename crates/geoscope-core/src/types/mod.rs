//! # Types
//!
//! Small value types shared by the session facade and the memory reader.

pub mod address;
pub mod typename;

// Re-export all public types
pub use address::Address;
pub use typename::{split_array_type, template_arguments, type_id};
