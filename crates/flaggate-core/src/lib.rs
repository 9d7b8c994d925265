//! flaggate-core library.
//!
//! Reads a tracker ticket, decides whether the work needs a feature flag, and
//! derives a flag name, type, and rollout strategy.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, each mapped to an
//!   [`error::ErrorCode`]; `anyhow::Result` where files are loaded.
//! - **Logging**: `tracing` macros only; the binary decides where they go.

pub mod classify;
pub mod error;
pub mod rules;
pub mod session;
pub mod suggest;
pub mod ticket;

pub use classify::{Classification, Classifier, PatternError, Reason};
pub use error::ErrorCode;
pub use rules::RuleSet;
pub use session::{SessionError, SessionRecorder};
pub use suggest::{
    FlagType, RolloutStrategy, Suggestions, suggest_flag_name, suggest_flag_type,
    suggest_rollout_strategy,
};
pub use ticket::{HookInput, Label, Project, TicketError, TicketRecord};
