// 🔁 Transaction Walkthrough - commit / rollback / crash / reconnect
// One SQLite connection plus an explicitly tracked transaction state

use crate::accounts::{self, Account};
use crate::config::{IdleTransferPolicy, WalkthroughConfig};
use crate::error::{WalkthroughError, WalkthroughResult};
use crate::notice::Notice;
use crate::txlog::{Tone, TxLog};
use rusqlite::Connection;
use tracing::{debug, info};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Open,
}

/// What the walkthrough screen shows as the session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoTransaction,
    OpenUncommitted,
    ClosedByCrash,
}

impl Phase {
    pub fn label(&self) -> &str {
        match self {
            Phase::NoTransaction => "No transaction",
            Phase::OpenUncommitted => "Open (uncommitted)",
            Phase::ClosedByCrash => "Closed by crash",
        }
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// One user action of the walkthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Start,
    Transfer,
    Commit,
    Rollback,
    Crash,
    Reconnect,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Start,
        Step::Transfer,
        Step::Commit,
        Step::Rollback,
        Step::Crash,
        Step::Reconnect,
    ];

    pub fn label(&self) -> &str {
        match self {
            Step::Start => "Start Transaction",
            Step::Transfer => "Transfer",
            Step::Commit => "Commit",
            Step::Rollback => "Rollback",
            Step::Crash => "Simulate Crash",
            Step::Reconnect => "Reconnect DB",
        }
    }

    /// Notice shown after the step succeeds. Transfer only updates the log.
    pub fn success_notice(&self) -> Option<Notice> {
        match self {
            Step::Start => Some(Notice::info("Transaction", "Transaction started.")),
            Step::Transfer => None,
            Step::Commit => Some(Notice::info("Commit", "Transaction committed successfully!")),
            Step::Rollback => Some(Notice::info("Rollback", "Transaction rolled back successfully.")),
            Step::Crash => Some(Notice::warning("Crash", "System crash simulated! Database closed.")),
            Step::Reconnect => Some(Notice::info("Reconnect", "Reconnected to database successfully.")),
        }
    }

    fn error_prefix(&self) -> &str {
        match self {
            Step::Start => "Error starting transaction",
            Step::Transfer => "Transfer error",
            Step::Commit => "Commit error",
            Step::Rollback => "Rollback error",
            Step::Crash => "Crash simulation error",
            Step::Reconnect => "Reconnect error",
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    config: WalkthroughConfig,
    conn: Option<Connection>,
    tx: TxState,
    log: TxLog,
    /// Balances from the last successful read, kept on screen after a crash
    last_balances: Vec<Account>,
}

impl Session {
    /// Reset the database, connect, and log the seeded balances
    pub fn open(config: WalkthroughConfig) -> WalkthroughResult<Self> {
        Self::initialize(&config)?;

        let mut session = Self {
            conn: None,
            tx: TxState::Idle,
            log: TxLog::new(),
            last_balances: Vec::new(),
            config,
        };
        session.connect()?;
        let balances = session.read_balances()?;
        session.log.push(
            Tone::Neutral,
            format!("Initialized new database with {}", accounts::format_balances(&balances)),
        );

        Ok(session)
    }

    /// Drop and recreate the accounts table on a short-lived connection
    pub fn initialize(config: &WalkthroughConfig) -> WalkthroughResult<()> {
        let conn = accounts::open_connection(&config.database_path)?;
        accounts::reset_accounts(
            &conn,
            &[config.source.as_str(), config.destination.as_str()],
            config.seed_balance,
        )?;
        conn.close().map_err(|(_, e)| e)?;

        info!(path = ?config.database_path, seed = config.seed_balance, "accounts table reset");
        Ok(())
    }

    fn connect(&mut self) -> WalkthroughResult<()> {
        self.conn = Some(accounts::open_connection(&self.config.database_path)?);
        self.tx = TxState::Idle;
        debug!(path = ?self.config.database_path, "connected");
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &WalkthroughConfig {
        &self.config
    }

    pub fn tx_state(&self) -> TxState {
        self.tx
    }

    pub fn phase(&self) -> Phase {
        match (&self.conn, self.tx) {
            (None, _) => Phase::ClosedByCrash,
            (Some(_), TxState::Open) => Phase::OpenUncommitted,
            (Some(_), TxState::Idle) => Phase::NoTransaction,
        }
    }

    pub fn log(&self) -> &TxLog {
        &self.log
    }

    pub fn last_balances(&self) -> &[Account] {
        &self.last_balances
    }

    fn connection(&self) -> WalkthroughResult<&Connection> {
        self.conn.as_ref().ok_or(WalkthroughError::Disconnected)
    }

    /// Balances as the current connection sees them, uncommitted changes included
    pub fn read_balances(&mut self) -> WalkthroughResult<Vec<Account>> {
        let balances = accounts::get_balances(self.connection()?)?;
        self.last_balances = balances.clone();
        Ok(balances)
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub fn start_transaction(&mut self) -> WalkthroughResult<Vec<Account>> {
        let result = self.try_start();
        self.settle(Step::Start, result)
    }

    pub fn transfer(&mut self) -> WalkthroughResult<Vec<Account>> {
        let result = self.try_transfer();
        self.settle(Step::Transfer, result)
    }

    pub fn commit(&mut self) -> WalkthroughResult<Vec<Account>> {
        let result = self.try_finish("COMMIT;");
        if result.is_ok() {
            self.log.push(Tone::Success, "COMMIT executed (changes saved permanently)");
        }
        self.settle(Step::Commit, result)
    }

    pub fn rollback(&mut self) -> WalkthroughResult<Vec<Account>> {
        let result = self.try_finish("ROLLBACK;");
        if result.is_ok() {
            self.log.push(Tone::Failure, "ROLLBACK executed (changes undone)");
        }
        self.settle(Step::Rollback, result)
    }

    /// Close the connection without COMMIT or ROLLBACK
    pub fn simulate_crash(&mut self) -> WalkthroughResult<()> {
        let result = self.try_crash();
        self.settle(Step::Crash, result)
    }

    /// Open a fresh connection; only committed state is visible afterwards
    pub fn reconnect(&mut self) -> WalkthroughResult<Vec<Account>> {
        let result = self.try_reconnect();
        self.settle(Step::Reconnect, result)
    }

    /// Run one step. Crash yields no balances because nothing can be read.
    pub fn apply(&mut self, step: Step) -> WalkthroughResult<Option<Vec<Account>>> {
        match step {
            Step::Start => self.start_transaction().map(Some),
            Step::Transfer => self.transfer().map(Some),
            Step::Commit => self.commit().map(Some),
            Step::Rollback => self.rollback().map(Some),
            Step::Crash => self.simulate_crash().map(|_| None),
            Step::Reconnect => self.reconnect().map(Some),
        }
    }

    /// Apply every step in order, carrying on past failures. Returns the failure count.
    pub fn run(&mut self, steps: &[Step]) -> usize {
        steps.iter().filter(|step| self.apply(**step).is_err()).count()
    }

    // ========================================================================
    // STEP BODIES
    // ========================================================================

    fn try_start(&mut self) -> WalkthroughResult<Vec<Account>> {
        let conn = self.connection()?;
        if self.tx == TxState::Open {
            return Err(WalkthroughError::AlreadyOpen);
        }

        conn.execute_batch("BEGIN;")?;
        self.tx = TxState::Open;
        self.log.push(Tone::Begin, "BEGIN TRANSACTION");
        self.read_balances()
    }

    fn try_transfer(&mut self) -> WalkthroughResult<Vec<Account>> {
        let conn = self.connection()?;
        let from = self.config.source.as_str();
        let to = self.config.destination.as_str();
        let amount = self.config.transfer_amount;

        if self.tx == TxState::Idle && self.config.idle_transfer == IdleTransferPolicy::Reject {
            return Err(WalkthroughError::NoOpenTransaction);
        }

        // Both rows must exist before anything is written
        for name in [from, to] {
            if accounts::get_balance(conn, name)?.is_none() {
                return Err(WalkthroughError::UnknownAccount(name.to_string()));
            }
        }

        accounts::apply_transfer(conn, from, to, amount)?;

        let message = match self.tx {
            TxState::Open => format!("Executed transfer {amount} from {from} → {to} (pending commit)"),
            TxState::Idle => format!(
                "Executed transfer {amount} from {from} → {to} outside a transaction \
                 (auto-committed, cannot be rolled back)"
            ),
        };
        let tone = match self.tx {
            TxState::Open => Tone::Pending,
            TxState::Idle => Tone::Caution,
        };

        let balances = self.read_balances()?;
        self.log.push(tone, message);
        Ok(balances)
    }

    fn try_finish(&mut self, statement: &str) -> WalkthroughResult<Vec<Account>> {
        let conn = self.connection()?;
        if self.tx == TxState::Idle {
            return Err(WalkthroughError::NoOpenTransaction);
        }

        conn.execute_batch(statement)?;
        self.tx = TxState::Idle;
        self.read_balances()
    }

    fn try_crash(&mut self) -> WalkthroughResult<()> {
        let conn = self.conn.take().ok_or(WalkthroughError::Disconnected)?;
        let was_open = self.tx == TxState::Open;
        self.tx = TxState::Idle;

        // A failed close still leaves the handle dropped, which is the crash we want
        conn.close().map_err(|(_, e)| e)?;

        debug!(was_open, "connection closed without commit or rollback");
        self.log.push(Tone::Failure, "💥 Simulated crash! Connection closed unexpectedly.");
        Ok(())
    }

    fn try_reconnect(&mut self) -> WalkthroughResult<Vec<Account>> {
        if let Some(old) = self.conn.take() {
            if self.tx == TxState::Open {
                self.log.push(
                    Tone::Caution,
                    "Previous connection still had an open transaction; it was discarded",
                );
            }
            drop(old);
        }

        self.connect()?;
        let balances = self.read_balances()?;
        self.log.push(Tone::Begin, "🔁 Database reconnected (checking durability)");
        Ok(balances)
    }

    /// Log a failed step and resynchronise the tracked state with the engine
    fn settle<T>(&mut self, step: Step, result: WalkthroughResult<T>) -> WalkthroughResult<T> {
        if let Err(err) = &result {
            self.log.push(Tone::Failure, format!("{}: {}", step.error_prefix(), err));

            if let Some(conn) = &self.conn {
                self.tx = if conn.is_autocommit() {
                    TxState::Idle
                } else {
                    TxState::Open
                };
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir) -> Session {
        Session::open(WalkthroughConfig::with_database(dir.path().join("visual_acid.db"))).unwrap()
    }

    fn pairs(accounts: &[Account]) -> Vec<(&str, i64)> {
        accounts.iter().map(|a| (a.name.as_str(), a.balance)).collect()
    }

    #[test]
    fn test_initialize_seeds_balances() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        let balances = session.read_balances().unwrap();
        assert_eq!(pairs(&balances), vec![("Alice", 1000), ("Bob", 1000)]);
        assert_eq!(session.phase(), Phase::NoTransaction);
        assert_eq!(
            session.log().last().unwrap().message,
            "Initialized new database with Alice=1000, Bob=1000"
        );
    }

    #[test]
    fn test_commit_persists_across_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start_transaction().unwrap();
        assert_eq!(session.phase(), Phase::OpenUncommitted);
        session.transfer().unwrap();
        let committed = session.commit().unwrap();
        assert_eq!(pairs(&committed), vec![("Alice", 900), ("Bob", 1100)]);

        let after = session.reconnect().unwrap();
        assert_eq!(pairs(&after), vec![("Alice", 900), ("Bob", 1100)]);
        assert_eq!(session.log().count(Tone::Failure), 0);
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start_transaction().unwrap();
        let pending = session.transfer().unwrap();
        assert_eq!(pairs(&pending), vec![("Alice", 900), ("Bob", 1100)]);

        let reverted = session.rollback().unwrap();
        assert_eq!(pairs(&reverted), vec![("Alice", 1000), ("Bob", 1000)]);
        assert_eq!(session.tx_state(), TxState::Idle);
    }

    #[test]
    fn test_crash_loses_uncommitted_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start_transaction().unwrap();
        session.transfer().unwrap();
        session.simulate_crash().unwrap();
        assert_eq!(session.phase(), Phase::ClosedByCrash);

        // Last display survives the crash
        assert_eq!(pairs(session.last_balances()), vec![("Alice", 900), ("Bob", 1100)]);

        let recovered = session.reconnect().unwrap();
        assert_eq!(pairs(&recovered), vec![("Alice", 1000), ("Bob", 1000)]);
    }

    #[test]
    fn test_idle_transfer_autocommits() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        let balances = session.transfer().unwrap();
        assert_eq!(pairs(&balances), vec![("Alice", 900), ("Bob", 1100)]);
        assert_eq!(session.log().last().unwrap().tone, Tone::Caution);

        assert!(matches!(session.rollback(), Err(WalkthroughError::NoOpenTransaction)));

        session.simulate_crash().unwrap();
        let after = session.reconnect().unwrap();
        assert_eq!(pairs(&after), vec![("Alice", 900), ("Bob", 1100)]);
    }

    #[test]
    fn test_idle_transfer_rejected_by_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WalkthroughConfig::with_database(dir.path().join("acid.db"));
        config.idle_transfer = IdleTransferPolicy::Reject;
        let mut session = Session::open(config).unwrap();

        assert!(matches!(session.transfer(), Err(WalkthroughError::NoOpenTransaction)));
        let balances = session.read_balances().unwrap();
        assert_eq!(pairs(&balances), vec![("Alice", 1000), ("Bob", 1000)]);
        assert!(session.log().last().unwrap().message.starts_with("Transfer error"));
    }

    #[test]
    fn test_double_begin_is_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start_transaction().unwrap();
        let err = session.start_transaction().unwrap_err();
        assert!(matches!(err, WalkthroughError::AlreadyOpen));
        assert_eq!(session.tx_state(), TxState::Open);
        assert_eq!(session.log().last().unwrap().tone, Tone::Failure);

        // The first transaction is still usable
        session.transfer().unwrap();
        let balances = session.commit().unwrap();
        assert_eq!(pairs(&balances), vec![("Alice", 900), ("Bob", 1100)]);
    }

    #[test]
    fn test_operations_after_crash_report_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.simulate_crash().unwrap();

        assert!(matches!(session.start_transaction(), Err(WalkthroughError::Disconnected)));
        assert!(matches!(session.transfer(), Err(WalkthroughError::Disconnected)));
        assert!(matches!(session.commit(), Err(WalkthroughError::Disconnected)));
        assert!(matches!(session.simulate_crash(), Err(WalkthroughError::Disconnected)));
        assert_eq!(session.log().count(Tone::Failure), 5);

        assert!(session.reconnect().is_ok());
        assert_eq!(session.phase(), Phase::NoTransaction);
    }

    #[test]
    fn test_reconnect_discards_open_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start_transaction().unwrap();
        session.transfer().unwrap();
        let balances = session.reconnect().unwrap();

        assert_eq!(pairs(&balances), vec![("Alice", 1000), ("Bob", 1000)]);
        assert_eq!(session.log().count(Tone::Caution), 1);
    }

    #[test]
    fn test_run_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        let failures = session.run(&[Step::Commit, Step::Start, Step::Transfer, Step::Commit]);
        assert_eq!(failures, 1);
        assert_eq!(pairs(session.last_balances()), vec![("Alice", 900), ("Bob", 1100)]);
    }

    #[test]
    fn test_unknown_account_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.config.destination = "Carol".to_string();

        assert!(matches!(session.transfer(), Err(WalkthroughError::UnknownAccount(name)) if name == "Carol"));
        let balances = session.read_balances().unwrap();
        assert_eq!(pairs(&balances), vec![("Alice", 1000), ("Bob", 1000)]);
    }

    #[test]
    fn test_step_notices() {
        assert!(Step::Transfer.success_notice().is_none());
        assert_eq!(Step::Commit.success_notice().unwrap().body, "Transaction committed successfully!");
        assert_eq!(Step::ALL.len(), 6);
    }
}
