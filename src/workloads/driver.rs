//! Category driver: one iteration picks a template from a category, runs it
//! inside a transaction and records the outcome. Template execution failures
//! roll back and the run continues; only startup problems are fatal.

use crate::catalog::Catalog;
use crate::common::error::{FatalError, NonFatalError};
use crate::common::statistics::LocalStatistics;
use crate::database::Connection;
use crate::workloads::executor;
use crate::workloads::paramgen::ParameterGenerator;
use crate::workloads::Category;

use rand::rngs::StdRng;
use rand::Rng;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// Run one iteration of `category`: pick a template name uniformly from the
/// category's set and execute it in its own transaction. Names absent from
/// the catalog are skipped. Returns whether an execution was recorded.
pub fn run_iteration(
    catalog: &Catalog,
    category: Category,
    conn: &mut dyn Connection,
    gen: &mut ParameterGenerator,
    rng: &mut StdRng,
    stats: &mut LocalStatistics,
) -> bool {
    let names = category.templates();
    let name = names[rng.gen_range(0..names.len())];

    run_template(catalog, category, name, conn, gen, stats)
}

/// Execute template `name` once, if the catalog has it.
pub fn run_template(
    catalog: &Catalog,
    category: Category,
    name: &str,
    conn: &mut dyn Connection,
    gen: &mut ParameterGenerator,
    stats: &mut LocalStatistics,
) -> bool {
    match attempt(catalog, name, conn, gen) {
        Ok(elapsed) => {
            if let Err(e) = conn.commit() {
                warn!("{} commit failed: {}", name, e);
                abort(name, conn);
                return false;
            }
            stats.record(category, name, elapsed);
            true
        }
        // Unknown names are skipped without opening a transaction.
        Err(NonFatalError::UnknownTemplate(_)) => false,
        Err(e) => {
            warn!("{} aborted: {}", name, e);
            abort(name, conn);
            false
        }
    }
}

/// Run `name`'s statements, returning the executor latency.
fn attempt(
    catalog: &Catalog,
    name: &str,
    conn: &mut dyn Connection,
    gen: &mut ParameterGenerator,
) -> Result<Duration, NonFatalError> {
    let template = catalog
        .get(name)
        .ok_or_else(|| NonFatalError::UnknownTemplate(name.to_string()))?;

    let params = gen.synthesize(name, template.arity());

    let start = Instant::now();
    executor::execute(conn, template, params, name, gen)?;
    Ok(start.elapsed())
}

/// Roll the open transaction back; the connection is reused by later
/// iterations, so it must not be left mid-transaction.
fn abort(name: &str, conn: &mut dyn Connection) {
    if let Err(e) = conn.rollback() {
        warn!("{} rollback failed: {}", name, e);
    }
}

/// Execute every catalog-present template of every category exactly once.
pub fn run_all_once(
    catalog: &Catalog,
    conn: &mut dyn Connection,
    gen: &mut ParameterGenerator,
    stats: &mut LocalStatistics,
) {
    for category in Category::iter() {
        for name in category.templates() {
            if !catalog.contains(name) {
                debug!("{} not in catalog, skipped", name);
                continue;
            }
            run_template(catalog, category, name, conn, gen, stats);
        }
    }
}

/// Check every category name against the catalog; enabled by the
/// `validate_catalog` setting.
pub fn validate(catalog: &Catalog) -> Result<(), FatalError> {
    let missing: Vec<String> = Category::iter()
        .flat_map(|c| c.templates())
        .filter(|name| !catalog.contains(name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FatalError::MissingTemplates(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::stub::StubConnection;
    use crate::workloads::HyBenchParameters;
    use rand::SeedableRng;

    fn catalog() -> Catalog {
        Catalog::parse(
            r#"
"TP-1" = "SELECT * FROM customer WHERE custID = ?"
"TP-9" = ["SELECT balance FROM savingAccount WHERE accountID = ?", "UPDATE savingAccount SET balance = balance - ? WHERE accountID = ?"]
"#,
        )
        .unwrap()
    }

    fn generator() -> ParameterGenerator {
        ParameterGenerator::new(true, Some(3), HyBenchParameters::default())
    }

    #[test]
    fn commit_and_record_test() {
        let catalog = catalog();
        let mut conn = StubConnection::new();
        let mut gen = generator();
        let mut stats = LocalStatistics::new(0);

        let ran = run_template(&catalog, Category::Tp, "TP-1", &mut conn, &mut gen, &mut stats);

        assert!(ran);
        assert_eq!(conn.commits, 1);
        assert_eq!(conn.rollbacks, 0);
        assert_eq!(stats.get(Category::Tp, "TP-1").unwrap().count, 1);
    }

    #[test]
    fn rollback_on_failure_test() {
        let catalog = catalog();
        let mut conn = StubConnection::new();
        conn.fail_on = Some(1);
        let mut gen = generator();
        let mut stats = LocalStatistics::new(0);

        let ran = run_template(&catalog, Category::Tp, "TP-9", &mut conn, &mut gen, &mut stats);

        assert!(!ran);
        assert_eq!(conn.commits, 0);
        assert_eq!(conn.rollbacks, 1);
        assert!(stats.get(Category::Tp, "TP-9").is_none());
    }

    #[test]
    fn rollback_on_commit_failure_test() {
        // The connection is reused by later iterations; a failed commit must
        // not leave its transaction open.
        let catalog = catalog();
        let mut conn = StubConnection::new();
        conn.fail_commit = true;
        let mut gen = generator();
        let mut stats = LocalStatistics::new(0);

        let ran = run_template(&catalog, Category::Tp, "TP-1", &mut conn, &mut gen, &mut stats);

        assert!(!ran);
        assert_eq!(conn.commits, 0);
        assert_eq!(conn.rollbacks, 1);
        assert!(stats.get(Category::Tp, "TP-1").is_none());
    }

    #[test]
    fn silent_skip_test() {
        let catalog = catalog();
        let mut conn = StubConnection::new();
        let mut gen = generator();
        let mut stats = LocalStatistics::new(0);

        let ran = run_template(&catalog, Category::Iq, "IQ-1", &mut conn, &mut gen, &mut stats);

        assert!(!ran);
        assert!(conn.executed.is_empty());
        assert_eq!(stats.committed(), 0);
    }

    #[test]
    fn run_all_once_test() {
        let catalog = catalog();
        let mut conn = StubConnection::new();
        let mut gen = generator();
        let mut stats = LocalStatistics::new(0);

        run_all_once(&catalog, &mut conn, &mut gen, &mut stats);

        assert_eq!(stats.committed(), 2);
        assert_eq!(stats.get(Category::Tp, "TP-1").unwrap().count, 1);
        assert_eq!(stats.get(Category::Tp, "TP-9").unwrap().count, 1);
    }

    #[test]
    fn iteration_draws_from_category_test() {
        let catalog = catalog();
        let mut conn = StubConnection::new();
        let mut gen = generator();
        let mut rng = StdRng::seed_from_u64(11);
        let mut stats = LocalStatistics::new(0);

        for _ in 0..200 {
            run_iteration(
                &catalog,
                Category::Tp,
                &mut conn,
                &mut gen,
                &mut rng,
                &mut stats,
            );
        }

        // Only the two catalog-present TP templates are ever recorded.
        assert!(stats.committed() > 0);
        assert_eq!(
            stats.committed(),
            stats.get(Category::Tp, "TP-1").map(|s| s.count).unwrap_or(0)
                + stats.get(Category::Tp, "TP-9").map(|s| s.count).unwrap_or(0)
        );
    }

    #[test]
    fn validate_missing_test() {
        let err = validate(&catalog()).unwrap_err();
        match err {
            FatalError::MissingTemplates(names) => {
                assert!(names.contains(&"AP-1".to_string()));
                assert!(!names.contains(&"TP-1".to_string()));
            }
            other => panic!("expected missing templates, got {:?}", other),
        }
    }
}
