//! Applicant tracking: validation, persistence and a cache-aside page cache
//! behind an axum router.

pub mod applicants;
pub mod config;
pub mod error;
pub mod telemetry;
