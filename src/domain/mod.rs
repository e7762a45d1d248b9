//! Domain types and DTOs
//!
//! Project inputs, reference data and the computed estimate shared by the
//! engine and the HTTP layer.

pub mod catalog;
pub mod estimate;
pub mod project;

// Re-export commonly used types
pub use catalog::*;
pub use estimate::*;
pub use project::*;
