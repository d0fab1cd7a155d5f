//! Core types and utilities for cdflow-action.
//!
//! This crate holds everything needed to turn a version request into an
//! installed `cdflow2` executable:
//!
//! - [`Error`] - the error taxonomy shared by every crate in the workspace
//! - [`tools`] - platform identity, version requests, the on-disk tool cache,
//!   the executable search path registry and the [`tools::ToolProvider`] seam

mod error;
pub mod tools;

pub use error::{Error, Result};
