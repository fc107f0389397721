//! Core types and trait definitions for the AT/MP dispute tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies; all
//! other crates in the workspace depend on it.

pub mod action;
pub mod audit;
pub mod dispute;
pub mod document;
pub mod dossier;
pub mod error;
pub mod reference;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
