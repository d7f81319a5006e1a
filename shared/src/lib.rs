//! Shared types and models for the Branch Inventory Management System
//!
//! This crate contains the domain vocabulary shared between the backend
//! and other components: movement directions and reference kinds, the
//! transfer state machine, document numbering, and pure validation
//! helpers. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
