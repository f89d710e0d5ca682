//! Transaction Saga
//!
//! Orchestrates one transaction from creation to settlement:
//!
//! 1. Record the transaction as PENDING
//! 2. Wait for a confirm or cancel signal (first one wins)
//! 3. On confirm, move funds through the wallet service, then mark SUCCESS
//!    and notify; on cancel, mark FAILED
//!
//! Progress is observable at any time through [`SagaCoordinator::query`].

pub mod activities;
pub mod coordinator;
pub mod retry;
pub mod signal;
pub mod state;
pub mod workflow;


pub use coordinator::SagaCoordinator;
pub use retry::RetryPolicy;
pub use signal::{Disposition, SIGNAL_CANCEL, SIGNAL_CONFIRM, Signal};
pub use state::{SagaState, SagaStep};
