//! Reqwest-backed REST adapter.
//!
//! One [`HttpConsoleApi`] implements every collaborator port: areas (read and
//! write), cameras, reports, and the user directory.

mod area_api;
mod client;
mod collections;
mod errors;

pub use client::HttpConsoleApi;
