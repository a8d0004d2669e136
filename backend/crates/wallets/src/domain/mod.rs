//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Wallet)
//! - Domain value objects (Currency)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod value_objects;
