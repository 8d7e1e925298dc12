//! Persistence-friendly records shared by the stores, the dialog engine, and
//! the scheduler.

pub mod book;
pub mod common;
pub mod contact;
pub mod reminder;
pub mod transaction;

pub use book::{CascadeReport, TenantBook, CURRENT_SCHEMA_VERSION};
pub use common::{ContactId, Identifiable, Owned, OwnerId, ReminderId, TenantId, TransactionId};
pub use contact::Contact;
pub use reminder::{Reminder, ReminderWindow};
pub use transaction::{Transaction, TransactionKind};
