#![doc(test(attr(deny(warnings))))]

//! Markily core keeps per-contact debt ledgers for chat users: contacts,
//! lend/borrow transactions with derived balances, one-shot reminders fired
//! by a background scheduler, and the multi-turn dialogs that drive them.
//! The chat platform is reached only through the traits in [`ports`].

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod ports;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Markily core tracing initialized.");
    });
}
