//! Session Validation
//!
//! Compares claimed outcomes against the canonical replay and records
//! write-once verdicts.
//!
//! ## Module Structure
//!
//! - `session`: Submitted sessions, verdicts, validation policy
//! - `validator`: The verdict algorithm (replay + exact checks + heuristics)
//! - `store`: Write-once concurrent verdict store and adjudication

pub mod session;
pub mod store;
pub mod validator;

// Re-export key types
pub use session::{GameSession, SessionId, ValidationPolicy, ValidationVerdict, WalletId};
pub use store::{PipelineError, SessionPipeline, VerdictRecord};
pub use validator::{validate, Validation};
