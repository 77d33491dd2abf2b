//! FloatScope - conversational front-end core for ARGO float data.
//!
//! Extracts query context from a chat log, keeps the backend's copy of it
//! current, and maps backend result rows to chart-ready render specs.

pub mod cli;
pub mod config;
pub mod context;
pub mod mapping;
pub mod models;
pub mod report;
pub mod session;
pub mod stats;
