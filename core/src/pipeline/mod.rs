// provisor/src/pipeline/mod.rs

//! Defines the `Pipeline<C>` struct, its composition, and execution logic.

pub mod definition;
pub mod execution;

// Re-export the main Pipeline struct and the free-standing runners
pub use definition::Pipeline;
pub use execution::{run, run_with_deadline};
