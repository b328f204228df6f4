//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) passed between the
//! transport and the command gateway.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::KeyPairs;
pub use responses::StatsReport;
