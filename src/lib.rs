//! photobooth library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod backend;
pub mod booth;
pub mod camera;
pub mod cli;
pub mod config;
pub mod detect;
