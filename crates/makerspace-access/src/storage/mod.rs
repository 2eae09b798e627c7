//! Storage layer for the skill ledger.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.makerspace/` (see
//! [`crate::config::AccessConfig`]):
//!
//! ```text
//! ~/.makerspace/
//! ├── skills/
//! ├── grants/
//! ├── requests/
//! └── revocations/
//! ```
//!
//! - [`ledger_store`] — CRUD for every ledger record plus whole-ledger load/save.

pub mod ledger_store;

pub use ledger_store::LedgerStore;
