//! E-Wallet Transaction Service
//!
//! Top-ups and purchases driven by a confirm/cancel saga over a durable
//! transaction record.
//!
//! # Modules
//!
//! - [`transaction`] - Record, status lifecycle, storage and wallet calls
//! - [`saga`] - Saga workflow, signals, retry policy and coordinator
//! - [`gateway`] - HTTP API
//! - [`db`] - PostgreSQL pool and schema
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod saga;
pub mod transaction;

// Convenient re-exports at crate root
pub use saga::{SagaCoordinator, SagaState, SagaStep, Signal};
pub use transaction::{
    CreateTransactionRequest, TokenData, Transaction, TransactionError, TransactionService,
    TransactionStatus, TransactionType, is_valid_transition,
};
