//! Application Layer - Use Cases
//!
//! Command and event handlers receive the open transaction from their
//! transactional decorator; queries read outside any unit of work.

pub mod browse_wallets;
pub mod customer_completed;
pub mod debit_wallet;
