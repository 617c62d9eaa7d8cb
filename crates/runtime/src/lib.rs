//! An in-process host for compiled agent plans.
//!
//! The [`LocalRunner`] plays the part of the execution engine for tests,
//! demos and local runs:
//!
//! 1. **Wrap** each input in an `InputEvent`
//! 2. **Route** the event through the plan's dispatch table
//! 3. **Run** every listening action in dispatch order; events the actions
//!    send are queued behind the current one
//! 4. **Collect** `OutputEvent`s as results
//!
//! The loop ends when the queue drains, or fails once one input has produced
//! more events than the configured limit.

pub mod error;
pub mod runner;

pub use error::RuntimeError;
pub use runner::LocalRunner;
