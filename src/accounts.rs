// 💾 Account Storage - SQLite access for the `accounts` table
// Plain statements only; transaction control is left to the caller

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub balance: i64,
}

/// Open the database in autocommit mode: no statement starts a transaction
/// implicitly, only an explicit BEGIN does.
pub fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    debug_assert!(conn.is_autocommit());
    Ok(conn)
}

/// Drop and recreate the accounts table, seeding each name with `seed_balance`
pub fn reset_accounts(conn: &Connection, names: &[&str], seed_balance: i64) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("DROP TABLE IF EXISTS accounts", [])?;
    tx.execute(
        "CREATE TABLE accounts (
            name TEXT PRIMARY KEY,
            balance INTEGER NOT NULL
        )",
        [],
    )?;

    {
        let mut stmt = tx.prepare("INSERT INTO accounts (name, balance) VALUES (?1, ?2)")?;
        for name in names {
            stmt.execute(params![name, seed_balance])?;
        }
    }

    tx.commit()
}

/// All rows ordered by name
pub fn get_balances(conn: &Connection) -> rusqlite::Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT name, balance FROM accounts ORDER BY name")?;

    let accounts = stmt
        .query_map([], |row| {
            Ok(Account {
                name: row.get(0)?,
                balance: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(accounts)
}

pub fn get_balance(conn: &Connection, name: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT balance FROM accounts WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
}

/// Debit `from` and credit `to` with two separate UPDATE statements.
/// Atomicity comes only from a transaction the caller already opened.
pub fn apply_transfer(conn: &Connection, from: &str, to: &str, amount: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE accounts SET balance = balance - ?1 WHERE name = ?2",
        params![amount, from],
    )?;
    conn.execute(
        "UPDATE accounts SET balance = balance + ?1 WHERE name = ?2",
        params![amount, to],
    )?;
    Ok(())
}

pub fn total_balance(accounts: &[Account]) -> i64 {
    accounts.iter().map(|a| a.balance).sum()
}

/// "Alice=1000, Bob=1000"
pub fn format_balances(accounts: &[Account]) -> String {
    accounts
        .iter()
        .map(|a| format!("{}={}", a.name, a.balance))
        .collect::<Vec<_>>()
        .join(", ")
}
