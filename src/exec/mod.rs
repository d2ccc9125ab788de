// src/exec/mod.rs

//! Execution of the delegated program.

pub mod delegate;

pub use delegate::{build_command, run_delegate};
