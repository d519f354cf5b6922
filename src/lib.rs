//! lintpost library crate
//!
//! Exposes the reconciliation core and channel adapters so tests and
//! external tooling can exercise them without going through CLI startup.

pub mod channels;
pub mod config;
pub mod diffmap;
pub mod engine;
pub mod feedback;
pub mod github;
pub mod marker;
pub mod reporter;
pub mod router;
pub mod util;
