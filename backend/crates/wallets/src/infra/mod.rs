//! Infrastructure Layer - Persistence
//!
//! - `postgres` - repository and read model over the `wallets` schema
//! - `memory` - in-process implementations over [`platform::transaction::MemoryStorage`]

pub mod memory;
pub mod postgres;
