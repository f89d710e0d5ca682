//! Transaction Module
//!
//! The durable transaction record, its status lifecycle, storage backends,
//! and the service that mutates records and talks to the wallet and
//! notification services.
//!
//! # Lifecycle
//!
//! ```text
//! PENDING ──► SUCCESS ──► REVERSED
//!    │
//!    ├──► FAILED
//!    └──► REVERSED
//! ```

pub mod adapters;
pub mod db;
pub mod error;
pub mod memory;
pub mod repository;
pub mod service;
pub mod state;
pub mod types;

pub use db::PgTransactionRepository;
pub use error::TransactionError;
pub use memory::InMemoryTransactionRepository;
pub use repository::{LockedTransaction, PendingCursor, TransactionRepository};
pub use service::TransactionService;
pub use state::{TransactionStatus, is_valid_transition};
pub use types::{
    CreateTransactionRequest, TokenData, Transaction, TransactionType, generate_reference,
    mask_token,
};
