//! Hard-coded extraction recipes for templates with true data dependencies
//! between statements inside one logical transaction.
//!
//! A recipe names, per parameter slot, where the value comes from: a column
//! of a row of a prior statement's result set, fresh synthesis, or a
//! literal. Read statements may legitimately return zero rows, so every
//! extraction carries a fallback of the correct semantic type; execution
//! never aborts for missing dependency data.

use crate::workloads::paramgen::SlotRule;

/// Source of one bound parameter in a dependent statement.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Binding {
    /// Column `col` of row `row` of statement `stmt`'s result set;
    /// synthesize `fallback` when the row or column is absent.
    Prior {
        stmt: usize,
        row: usize,
        col: usize,
        fallback: SlotRule,
    },

    /// Synthesize fresh.
    Synth(SlotRule),

    /// Contract acceptance literal.
    Accepted,

    /// Random accept/reject decision.
    Decision,

    /// Literal zero (initial delinquency).
    Zero,
}

use Binding::*;
use SlotRule::*;

const LOAN_AMOUNT: SlotRule = Amount(1.0, 100_000.0);

/// TP-13 statement 1: INSERT INTO loantrans from the pending application.
const TP13_INSERT: &[Binding] = &[
    Prior { stmt: 0, row: 0, col: 0, fallback: GenericId },
    Prior { stmt: 0, row: 0, col: 1, fallback: GenericId },
    Prior { stmt: 0, row: 0, col: 2, fallback: LOAN_AMOUNT },
    Prior { stmt: 0, row: 0, col: 3, fallback: DurationDays },
    Synth(Timestamp),
    Accepted,
    Synth(Timestamp),
    Zero,
];

/// TP-13/TP-14 balance updates: amount then entity id.
const BALANCE_UPDATE: &[Binding] = &[
    Prior { stmt: 0, row: 0, col: 2, fallback: LOAN_AMOUNT },
    Prior { stmt: 0, row: 0, col: 1, fallback: GenericId },
];

/// TP-13 statement 4: resolve the application.
const TP13_RESOLVE: &[Binding] = &[
    Decision,
    Prior { stmt: 0, row: 0, col: 0, fallback: GenericId },
];

/// Touch the loan transaction row: new timestamp, id from statement 0.
const LOAN_TOUCH: &[Binding] = &[
    Synth(Timestamp),
    Prior { stmt: 0, row: 0, col: 0, fallback: GenericId },
];

const TP16_BALANCE: &[Binding] = &[
    Prior { stmt: 0, row: 0, col: 1, fallback: GenericId },
];

/// TP-16 statement 2: repayment amount from statement 0, account id from
/// the balance lookup in statement 1.
const TP16_REPAY: &[Binding] = &[
    Prior { stmt: 0, row: 0, col: 3, fallback: Amount(1.0, 10_000.0) },
    Prior { stmt: 1, row: 0, col: 0, fallback: GenericId },
];

const AT3_INSERT: &[Binding] = &[
    Synth(GenericId),
    Synth(GenericId),
    Synth(LOAN_AMOUNT),
    Synth(DurationDays),
    Synth(Timestamp),
    Accepted,
    Synth(Timestamp),
    Zero,
];

const AT3_RESOLVE: &[Binding] = &[Synth(Timestamp), Synth(GenericId)];

const AT4_REPAY: &[Binding] = &[Synth(LOAN_AMOUNT), Synth(GenericId)];

const AT5_LOOKUP: &[Binding] = &[
    Prior { stmt: 0, row: 0, col: 0, fallback: GenericId },
];

const AT6_LOOKUP: &[Binding] = &[Synth(GenericId)];

/// Extraction recipe for statement `stmt` of template `name`, if one exists.
pub fn bindings(name: &str, stmt: usize) -> Option<&'static [Binding]> {
    match (name, stmt) {
        ("TP-13", 1) => Some(TP13_INSERT),
        ("TP-13", 2) | ("TP-13", 3) => Some(BALANCE_UPDATE),
        ("TP-13", 4) => Some(TP13_RESOLVE),

        ("TP-14", 1) => Some(BALANCE_UPDATE),
        ("TP-14", 2) => Some(LOAN_TOUCH),

        ("TP-15", i) if i > 0 => Some(LOAN_TOUCH),

        ("TP-16", 1) => Some(TP16_BALANCE),
        ("TP-16", 2) => Some(TP16_REPAY),
        ("TP-16", 3) => Some(LOAN_TOUCH),

        ("AT-3", 2) => Some(AT3_INSERT),
        ("AT-3", 3) | ("AT-3", 4) => Some(AT3_RESOLVE),

        ("AT-4", 1) => Some(AT4_REPAY),
        ("AT-4", 2) => Some(AT3_RESOLVE),

        ("AT-5", i) if i > 0 => Some(AT5_LOOKUP),

        ("AT-6", i) if i > 0 => Some(AT6_LOOKUP),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_lookup_test() {
        assert_eq!(bindings("TP-13", 0), None);
        assert_eq!(bindings("TP-13", 1), Some(TP13_INSERT));
        assert_eq!(bindings("TP-15", 3), Some(LOAN_TOUCH));
        assert_eq!(bindings("TP-9", 1), None);
        assert_eq!(bindings("AT-5", 0), None);
        assert_eq!(bindings("AT-5", 1), Some(AT5_LOOKUP));
    }

    #[test]
    fn insert_recipe_shape_test() {
        // Loan insert binds id, applicant, amount, duration, then the
        // contract fields.
        let recipe = bindings("TP-13", 1).unwrap();
        assert_eq!(recipe.len(), 8);
        assert!(matches!(
            recipe[2],
            Binding::Prior { stmt: 0, row: 0, col: 2, .. }
        ));
        assert_eq!(recipe[5], Binding::Accepted);
        assert_eq!(recipe[7], Binding::Zero);
    }
}
