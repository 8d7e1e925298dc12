//! Balance derivation over append-only transaction logs.

pub mod balance;

pub use balance::{Balance, BalanceCalculator, BalanceDirection, SETTLEMENT_THRESHOLD};
