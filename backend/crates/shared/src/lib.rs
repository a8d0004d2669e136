//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" every module agrees on:
//! - Common error types and result aliases
//! - Typed IDs that cross module boundaries
//! - Pagination of ordered result sets
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all modules.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod pagination;
