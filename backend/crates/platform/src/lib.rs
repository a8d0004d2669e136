//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations for every module:
//! - Database configuration and pool setup
//! - The transactional execution layer (storage contexts, unit of work,
//!   unit-of-work registry, transactional handler decorators)
//!
//! Nothing here knows about a concrete module; modules plug their storage
//! in through the registry during startup.

pub mod config;
pub mod transaction;
