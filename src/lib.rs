// Student ACID Lab - Core Library
// Exposes the record store and the transaction walkthrough for the TUI, scripts, and tests

pub mod error;
pub mod config;
pub mod notice;
pub mod records;      // Record Store - student entries
pub mod accounts;     // SQLite access for the accounts table
pub mod txlog;        // Timestamped transaction log
pub mod walkthrough;  // Transaction Walkthrough - session state machine
pub mod scenarios;    // Scripted walkthroughs

// Re-export commonly used types
pub use error::{RecordError, WalkthroughError};
pub use config::{IdleTransferPolicy, WalkthroughConfig};
pub use notice::{Notice, NoticeLevel};
pub use records::{
    ImportSummary, Listing, RecordStore, SortOutcome, Student, StudentDraft,
};
pub use accounts::Account;
pub use txlog::{LogEntry, Tone, TxLog};
pub use walkthrough::{Phase, Session, Step, TxState};
pub use scenarios::{run_scenario, Scenario, ScenarioReport, SCENARIOS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
