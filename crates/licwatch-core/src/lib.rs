//! Core license check scheduler for licwatch
//!
//! This crate is the heart of licwatch, containing:
//! - Variant resolution (which product variant is installed)
//! - Process-wide activation and run state with atomic check-and-set
//! - The timer abstraction (tokio-backed and manual)
//! - The scheduler state machine (Idle -> Armed -> Checking -> Armed)

mod bus;
mod events;
mod resolver;
mod scheduler;
mod state;
mod timer;

pub use bus::*;
pub use events::*;
pub use resolver::*;
pub use scheduler::*;
pub use state::*;
pub use timer::*;
