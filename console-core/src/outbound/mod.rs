//! Outbound adapters implementing the domain ports.
//!
//! - **http**: `reqwest` client for the area, camera, report, and user
//!   endpoints of the REST API.
//!
//! Adapters translate between HTTP and domain types. They hold no caching or
//! validation logic.

pub mod http;
