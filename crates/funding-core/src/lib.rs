//! Core domain layer for the WiFi Funding Dashboard.
//!
//! Holds the canonical tabular data model, the declarative sheet schemas,
//! state-name normalization, the error taxonomy, CLI settings and the
//! formatting helpers shared by every other crate.

pub mod error;
pub mod formatting;
pub mod models;
pub mod schema;
pub mod settings;
pub mod states;
