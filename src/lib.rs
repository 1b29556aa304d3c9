//! Incremental scanline renderer for planetary surface maps.
//!
//! Re-exports modules for use by binaries and tools.

pub mod config;
pub mod elevation;
pub mod grid;
pub mod palette;
pub mod projection;
pub mod render;
pub mod resource;
pub mod services;
pub mod viewport;
