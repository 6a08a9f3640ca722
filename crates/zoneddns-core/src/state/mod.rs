// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileStateStore, DEFAULT_STATE_FILE};
pub use memory::MemoryStateStore;
