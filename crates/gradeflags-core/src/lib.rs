//! Core types and trait definitions for the grades feature-toggle store.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::ConfigStore`]; the API and server crates resolve toggles
//! through [`resolver::ToggleResolver`].

pub mod cache;
pub mod course;
pub mod error;
pub mod resolver;
pub mod store;
pub mod toggle;

pub use error::{Error, Result};
