//! Guru - polished client replies from a short instruction
//!
//! This library provides the core: prompt construction, the Gemini
//! request, response parsing, and a bounded persisted history, driven by an
//! [`controller::InteractionController`] behind a pluggable rendering surface.

pub mod adapters;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod store;
pub mod ui;

pub use error::{Error, Result};
