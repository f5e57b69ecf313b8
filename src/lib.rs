//! Rephrase Library
//!
//! Shortcut-triggered text rewriting through a local language model.

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod hotkey;
pub mod services;
