//! Driving adapters. The terminal shell is the only one.

pub mod shell;

pub use self::shell::{Flow, Shell};
