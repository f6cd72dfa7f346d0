use crate::common::error::{FatalError, NonFatalError};
use crate::database::{is_read, Connection, StatementResult, Value};

use chrono::{Datelike, NaiveDate, Timelike};
use config::Config;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Row};
use tracing::debug;

/// Live connection over the MySQL wire protocol.
///
/// Autocommit is disabled at connect; every template execution is bracketed
/// by an explicit COMMIT or ROLLBACK.
pub struct MySqlConnection {
    conn: Conn,
}

impl MySqlConnection {
    pub fn connect(config: &Config) -> Result<MySqlConnection, FatalError> {
        let host = config
            .get_str("host")
            .unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = config.get_int("port").unwrap_or(3306) as u16;
        let user = config.get_str("user").unwrap_or_else(|_| "root".to_string());
        let password = config.get_str("password").unwrap_or_default();
        let database = config
            .get_str("database")
            .unwrap_or_else(|_| "hybench".to_string());

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(host.clone()))
            .tcp_port(port)
            .user(Some(user))
            .pass(Some(password))
            .db_name(Some(database))
            .init(vec!["SET autocommit = 0"]);

        let conn =
            Conn::new(opts).map_err(|e| FatalError::DatabaseConnection(e.to_string()))?;
        debug!("connected to {}:{}", host, port);

        Ok(MySqlConnection { conn })
    }
}

impl Connection for MySqlConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<StatementResult, NonFatalError> {
        let params = if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(to_sql).collect())
        };

        if is_read(sql) {
            let rows: Vec<Row> = self
                .conn
                .exec(sql, params)
                .map_err(|e| NonFatalError::StatementExecution(e.to_string()))?;
            Ok(StatementResult::Rows(
                rows.into_iter().map(from_row).collect(),
            ))
        } else {
            self.conn
                .exec_drop(sql, params)
                .map_err(|e| NonFatalError::StatementExecution(e.to_string()))?;
            Ok(StatementResult::Affected(self.conn.affected_rows()))
        }
    }

    fn commit(&mut self) -> Result<(), NonFatalError> {
        self.conn
            .query_drop("COMMIT")
            .map_err(|e| NonFatalError::StatementExecution(e.to_string()))
    }

    fn rollback(&mut self) -> Result<(), NonFatalError> {
        self.conn
            .query_drop("ROLLBACK")
            .map_err(|e| NonFatalError::StatementExecution(e.to_string()))
    }
}

fn to_sql(value: &Value) -> mysql::Value {
    match value {
        Value::Int(i) => mysql::Value::Int(*i),
        Value::Float(v) => mysql::Value::Double(*v),
        Value::Text(s) => mysql::Value::Bytes(s.clone().into_bytes()),
        Value::Timestamp(ts) => mysql::Value::Date(
            ts.year() as u16,
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            ts.nanosecond() / 1_000,
        ),
        Value::Null => mysql::Value::NULL,
    }
}

fn from_row(row: Row) -> Vec<Value> {
    row.unwrap().into_iter().map(from_sql).collect()
}

fn from_sql(value: mysql::Value) -> Value {
    match value {
        mysql::Value::Int(i) => Value::Int(i),
        mysql::Value::UInt(u) => Value::Int(u as i64),
        mysql::Value::Float(v) => Value::Float(v as f64),
        mysql::Value::Double(v) => Value::Float(v),
        mysql::Value::Bytes(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        mysql::Value::Date(y, mo, d, h, mi, s, us) => {
            match NaiveDate::from_ymd_opt(y as i32, mo as u32, d as u32)
                .and_then(|date| date.and_hms_micro_opt(h as u32, mi as u32, s as u32, us))
            {
                Some(ts) => Value::Timestamp(ts),
                None => Value::Null,
            }
        }
        mysql::Value::NULL => Value::Null,
        other => Value::Text(other.as_sql(true)),
    }
}
