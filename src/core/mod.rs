//! core
//!
//! Core domain types and configuration for Skyway.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ProjectId, ServiceId, Project, GitInfo, etc.
//! - [`config`] - Configuration schema, loading and project resolution
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid identifiers from reaching the API
//! - Configuration is resolved once per invocation and never re-read

pub mod config;
pub mod types;
