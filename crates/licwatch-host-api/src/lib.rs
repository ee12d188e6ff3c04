//! Host integration traits for licwatch
//!
//! This crate defines the interface between the license scheduler and the
//! collaborators it does not own: the host's plugin registry, the license
//! oracle, the license prompt and the refresh notification bus. It contains
//! no host code itself, only the traits and mock implementations for tests.

mod mock;
mod result;
mod traits;

pub use mock::*;
pub use result::*;
pub use traits::*;
