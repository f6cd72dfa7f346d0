//! Template executor: a sequential state machine with one state per
//! statement index. Parameters for each statement come, in priority order,
//! from its data-dependency recipe, from the synthesized parameter cursor,
//! or from repair. The length invariant holds at the point of execution:
//! every statement runs with exactly its own placeholder count.

use crate::catalog::{statement_arity, Template};
use crate::common::error::NonFatalError;
use crate::database::{is_read, Connection, StatementResult, Value};
use crate::workloads::dataflow::{self, Binding};
use crate::workloads::paramgen::ParameterGenerator;

/// Explicit cursor over the flat synthesized parameter sequence.
pub struct ParamCursor {
    values: Vec<Value>,
    next: usize,
}

impl ParamCursor {
    pub fn new(values: Vec<Value>) -> ParamCursor {
        ParamCursor { values, next: 0 }
    }

    /// Next unconsumed value, if any.
    pub fn next_unconsumed(&mut self) -> Option<Value> {
        let value = self.values.get(self.next).cloned();
        if value.is_some() {
            self.next += 1;
        }
        value
    }

    /// Up to `n` values; fewer if the sequence runs out.
    pub fn take(&mut self, n: usize) -> Vec<Value> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.next_unconsumed() {
                Some(value) => out.push(value),
                None => break,
            }
        }
        out
    }
}

/// Execute a template's statements in order inside the connection's current
/// transaction, threading prior result-set values into later parameter
/// lists. Any statement failure aborts the whole template immediately.
pub fn execute(
    conn: &mut dyn Connection,
    template: &Template,
    params: Vec<Value>,
    name: &str,
    gen: &mut ParameterGenerator,
) -> Result<Vec<StatementResult>, NonFatalError> {
    let statements = template.statements();
    let mut cursor = ParamCursor::new(params);
    let mut results: Vec<StatementResult> = Vec::with_capacity(statements.len());

    for (i, stmt) in statements.iter().enumerate() {
        let needed = statement_arity(stmt);

        let mut stmt_params = match dataflow::bindings(name, i) {
            Some(recipe) => resolve(recipe, &results, gen),
            None => cursor.take(needed),
        };
        repair(&mut stmt_params, needed, &results, gen);

        let result = conn.execute(stmt, &stmt_params)?;

        if is_read(stmt) {
            match result {
                StatementResult::Rows(rows) => results.push(StatementResult::Rows(rows)),
                StatementResult::Affected(_) => results.push(StatementResult::Rows(Vec::new())),
            }
        } else {
            match result {
                StatementResult::Affected(n) => results.push(StatementResult::Affected(n)),
                StatementResult::Rows(_) => results.push(StatementResult::Affected(0)),
            }
        }
    }

    Ok(results)
}

/// Resolve an extraction recipe against the results collected so far.
fn resolve(
    recipe: &[Binding],
    results: &[StatementResult],
    gen: &mut ParameterGenerator,
) -> Vec<Value> {
    recipe
        .iter()
        .map(|binding| match binding {
            Binding::Prior {
                stmt,
                row,
                col,
                fallback,
            } => match extract(results, *stmt, *row, *col) {
                Some(value) => value,
                None => gen.value(fallback, &[]),
            },
            Binding::Synth(rule) => gen.value(rule, &[]),
            Binding::Accepted => Value::Text("accept".to_string()),
            Binding::Decision => gen.status(),
            Binding::Zero => Value::Int(0),
        })
        .collect()
}

/// Value at (statement, row, column), if present.
fn extract(results: &[StatementResult], stmt: usize, row: usize, col: usize) -> Option<Value> {
    results
        .get(stmt)
        .and_then(|r| r.rows())
        .and_then(|rows| rows.get(row))
        .and_then(|row| row.get(col))
        .cloned()
}

/// Force the parameter list to exactly `needed` entries. Surplus is
/// truncated. Shortfall is filled by threading the most recent prior row's
/// leading columns into the trailing slots, then synthesizing the rest.
fn repair(
    params: &mut Vec<Value>,
    needed: usize,
    results: &[StatementResult],
    gen: &mut ParameterGenerator,
) {
    if params.len() >= needed {
        params.truncate(needed);
        return;
    }

    let mut shortfall = needed - params.len();
    let mut tail = Vec::new();
    if let Some(row) = latest_row(results) {
        let take = shortfall.min(row.len());
        tail.extend_from_slice(&row[..take]);
        shortfall -= take;
    }
    params.extend(gen.fill(shortfall));
    params.extend(tail);
}

/// First row of the most recent statement that returned any rows.
fn latest_row(results: &[StatementResult]) -> Option<&Vec<Value>> {
    results
        .iter()
        .rev()
        .find_map(|r| r.rows().and_then(|rows| rows.first()))
}
