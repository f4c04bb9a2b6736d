//! Residential electrical panel simulator.
//!
//! Models a breaker panel as a slot grid, computes per-circuit load from the
//! devices wired to it, and advances breaker heat and component temperature
//! one tick at a time, tripping breakers and the main when limits are crossed.

#[cfg(feature = "api")]
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
/// Panel data model, slot allocation, and the mutable workspace.
pub mod panel;
pub mod runner;
/// Load, thermal, and tick engine modules.
pub mod sim;
pub mod telemetry;
