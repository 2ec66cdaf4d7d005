//! Lumen Console Library Crate
//!
//! This library contains the console application: configuration, the view
//! layer behind the authentication gate, the control tray for local media,
//! and the seam to the realtime session provider. The `bin/console.rs`
//! binary is a thin wrapper around this library.

pub mod app;
pub mod audio;
pub mod config;
pub mod live;
pub mod media;
pub mod tray;
pub mod views;
