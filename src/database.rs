use crate::common::error::NonFatalError;

use chrono::NaiveDateTime;
use std::fmt;

pub mod mysql;

/// A bound parameter or result-set scalar.
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Null,
}

/// Outcome of executing one statement: a full row set for reads, or an
/// affected-rows signal for everything else. Produced and consumed within a
/// single template execution.
#[derive(PartialEq, Debug, Clone)]
pub enum StatementResult {
    Rows(Vec<Vec<Value>>),
    Affected(u64),
}

impl StatementResult {
    pub fn rows(&self) -> Option<&Vec<Vec<Value>>> {
        match self {
            StatementResult::Rows(rows) => Some(rows),
            StatementResult::Affected(_) => None,
        }
    }
}

/// Database connection capability with explicit transaction boundaries.
///
/// Connections are never shared across concurrent transactions; each driver
/// owns its own.
pub trait Connection {
    /// Execute a statement with positional bound parameters.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<StatementResult, NonFatalError>;

    fn commit(&mut self) -> Result<(), NonFatalError>;

    fn rollback(&mut self) -> Result<(), NonFatalError>;
}

/// A statement is a read if it leads with the read keyword.
pub fn is_read(stmt: &str) -> bool {
    let stmt = stmt.trim_start();
    stmt.len() >= 6 && stmt[..6].eq_ignore_ascii_case("select")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Value::*;
        match self {
            Int(i) => write!(f, "{}", i),
            Float(v) => write!(f, "{}", v),
            Text(s) => write!(f, "{}", s),
            Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Scripted connection used by executor and driver tests.
    use super::*;
    use std::collections::VecDeque;

    pub(crate) struct StubConnection {
        /// Statements executed so far, with their resolved parameters.
        pub executed: Vec<(String, Vec<Value>)>,

        /// Row sets handed out to reads, in order; empty once exhausted.
        pub read_results: VecDeque<Vec<Vec<Value>>>,

        /// Fail the nth executed statement.
        pub fail_on: Option<usize>,

        /// Fail every commit.
        pub fail_commit: bool,

        pub commits: u32,
        pub rollbacks: u32,
    }

    impl StubConnection {
        pub(crate) fn new() -> Self {
            StubConnection {
                executed: Vec::new(),
                read_results: VecDeque::new(),
                fail_on: None,
                fail_commit: false,
                commits: 0,
                rollbacks: 0,
            }
        }

        pub(crate) fn with_reads(reads: Vec<Vec<Vec<Value>>>) -> Self {
            let mut conn = Self::new();
            conn.read_results = reads.into();
            conn
        }
    }

    impl Connection for StubConnection {
        fn execute(
            &mut self,
            sql: &str,
            params: &[Value],
        ) -> Result<StatementResult, NonFatalError> {
            let ordinal = self.executed.len();
            self.executed.push((sql.to_string(), params.to_vec()));

            if self.fail_on == Some(ordinal) {
                return Err(NonFatalError::StatementExecution("stub failure".into()));
            }

            if is_read(sql) {
                let rows = self.read_results.pop_front().unwrap_or_default();
                Ok(StatementResult::Rows(rows))
            } else {
                Ok(StatementResult::Affected(1))
            }
        }

        fn commit(&mut self) -> Result<(), NonFatalError> {
            if self.fail_commit {
                return Err(NonFatalError::StatementExecution(
                    "commit rejected".into(),
                ));
            }
            self.commits += 1;
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), NonFatalError> {
            self.rollbacks += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_read_test() {
        assert!(is_read("SELECT 1"));
        assert!(is_read("  select balance FROM savingAccount"));
        assert!(!is_read("UPDATE savingAccount SET balance = 0"));
        assert!(!is_read("INSERT INTO transfer VALUES (?)"));
        assert!(!is_read(""));
    }
}
