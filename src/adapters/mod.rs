//! Adapters module — concrete rendering surfaces.
//!
//! The core only knows the [`crate::controller::Surface`] trait; adapters
//! decide how inputs are collected and results displayed.
//!
//! # Supported Surfaces
//!
//! - **CLI** — one-shot commands and a menu-driven terminal session

pub mod cli;

pub use cli::{run_interactive, TerminalSurface};
