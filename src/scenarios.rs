// Student ACID Lab - Scripted Scenarios
// The four walkthroughs the demo is built around, runnable without a terminal UI

use crate::accounts::Account;
use crate::config::WalkthroughConfig;
use crate::error::WalkthroughResult;
use crate::txlog::LogEntry;
use crate::walkthrough::{Session, Step};

pub struct Scenario {
    pub name: &'static str,
    pub steps: &'static [Step],
    /// Whether the transfer survives to the end of the scenario
    pub transfer_persists: bool,
}

impl Scenario {
    /// (source, destination) balances the scenario should end with
    pub fn expected(&self, config: &WalkthroughConfig) -> (i64, i64) {
        let moved = if self.transfer_persists { config.transfer_amount } else { 0 };
        (config.seed_balance - moved, config.seed_balance + moved)
    }
}

pub const SCENARIOS: [Scenario; 4] = [
    Scenario {
        name: "commit",
        steps: &[Step::Start, Step::Transfer, Step::Commit, Step::Reconnect],
        transfer_persists: true,
    },
    Scenario {
        name: "rollback",
        steps: &[Step::Start, Step::Transfer, Step::Rollback],
        transfer_persists: false,
    },
    Scenario {
        name: "crash",
        steps: &[Step::Start, Step::Transfer, Step::Crash, Step::Reconnect],
        transfer_persists: false,
    },
    Scenario {
        name: "transfer-without-begin",
        steps: &[Step::Transfer, Step::Rollback, Step::Reconnect],
        transfer_persists: true,
    },
];

#[derive(Debug)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub failures: usize,
    pub expected: (i64, i64),
    pub actual: (Option<i64>, Option<i64>),
    pub balances: Vec<Account>,
    pub log: Vec<LogEntry>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.actual == (Some(self.expected.0), Some(self.expected.1))
    }

    pub fn balance_of(&self, name: &str) -> Option<i64> {
        self.balances.iter().find(|a| a.name == name).map(|a| a.balance)
    }
}

/// Run a scenario against a freshly reset database
pub fn run_scenario(scenario: &Scenario, config: WalkthroughConfig) -> WalkthroughResult<ScenarioReport> {
    let expected = scenario.expected(&config);
    let (source, destination) = (config.source.clone(), config.destination.clone());

    let mut session = Session::open(config)?;
    let failures = session.run(scenario.steps);
    let balances = session.read_balances()?;
    let find = |name: &str| balances.iter().find(|a| a.name == name).map(|a| a.balance);
    let actual = (find(&source), find(&destination));

    Ok(ScenarioReport {
        name: scenario.name,
        failures,
        expected,
        actual,
        balances,
        log: session.log().entries().to_vec(),
    })
}
