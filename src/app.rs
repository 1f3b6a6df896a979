//! Application module
//!
//! Re-exports the main application type and the state it mirrors, so the
//! binary only needs one import path.

pub use crate::frontend::ScopeApp;

// Re-export commonly used types for convenience
pub use crate::frontend::{AppAction, ScopeState};
