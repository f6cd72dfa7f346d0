use crate::database::Value;
use crate::workloads::{HyBenchParameters, CHECKING_TYPES, COMPANY_CATEGORIES, TRANSFER_TYPES};

use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rule for one bound-parameter slot.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum SlotRule {
    CustomerId,
    CompanyId,
    AccountId,
    SourceId,
    TargetId,
    ApplicantId,
    /// Monetary amount drawn uniformly from the half-open range.
    Amount(f64, f64),
    /// Loan duration in days, 1 to 365.
    DurationDays,
    CompanyCategory,
    TransferType,
    CheckingType,
    /// Current wall-clock time.
    Timestamp,
    /// Repeat the value synthesized for an earlier slot.
    EchoSlot(usize),
    /// Fallback id in [1, 100000] for slots no rule covers.
    GenericId,
}

/// How a template's slots are synthesized.
pub enum Synthesis {
    /// One rule per slot position; positions past the table fall back to
    /// [`SlotRule::GenericId`].
    PerSlot(&'static [SlotRule]),
    /// Every slot uses the same rule.
    Uniform(SlotRule),
    /// Zero parameters up front; the executor produces them from prior
    /// statements' result sets.
    Deferred,
    /// No rule known for this name; every slot is a generic id.
    Fallback,
}

use SlotRule::*;

/// Per-template slot semantics. The order encodes which domain entity each
/// slot refers to, so synthesized values stay valid foreign keys against
/// the pre-loaded dataset.
pub fn rules_for(name: &str) -> Synthesis {
    match name {
        // AP: sourceid/targetid pair repeated across the union branches.
        "AP-1" => Synthesis::PerSlot(&[
            SourceId,
            SourceId,
            EchoSlot(0),
            EchoSlot(1),
            EchoSlot(0),
            EchoSlot(1),
            EchoSlot(0),
            EchoSlot(1),
        ]),
        "AP-2" | "AP-3" | "AP-4" => Synthesis::Uniform(CustomerId),
        "AP-2.1" => Synthesis::Uniform(ApplicantId),
        "AP-5" | "AP-7" => Synthesis::Uniform(CompanyId),
        "AP-12" => Synthesis::Uniform(CompanyCategory),
        "AP-13" => Synthesis::Uniform(SourceId),

        "TP-1" => Synthesis::Uniform(CustomerId),
        "TP-2" => Synthesis::Uniform(CompanyId),
        "TP-3" | "TP-4" => Synthesis::Uniform(AccountId),
        "TP-5" | "TP-6" => Synthesis::Uniform(CustomerId),
        "TP-7" | "TP-8" => Synthesis::Uniform(ApplicantId),
        // Transfer between accounts.
        "TP-9" => Synthesis::PerSlot(&[
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            SourceId,
            TargetId,
            Amount(1.0, 10_000.0),
            TransferType,
            Timestamp,
        ]),
        "TP-10" => Synthesis::PerSlot(&[
            CompanyId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            SourceId,
            Amount(1.0, 10_000.0),
            TargetId,
            TransferType,
            Timestamp,
        ]),
        "TP-11" => Synthesis::PerSlot(&[
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            SourceId,
            Amount(1.0, 10_000.0),
            TargetId,
            CheckingType,
            Timestamp,
        ]),
        // Loan application.
        "TP-12" => Synthesis::PerSlot(&[
            CustomerId,
            Amount(1.0, 100_000.0),
            CustomerId,
            CompanyId,
            Amount(1.0, 100_000.0),
            CompanyId,
            ApplicantId,
            Amount(1.0, 100_000.0),
            DurationDays,
            Timestamp,
            Timestamp,
        ]),
        // First statement takes no parameters; later statements are bound
        // from its result set by the executor.
        "TP-13" | "TP-14" | "TP-15" | "TP-16" => Synthesis::Deferred,
        "TP-17" | "TP-18" => Synthesis::PerSlot(&[
            AccountId,
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
        ]),

        "AT-00" | "AT-0" => Synthesis::Uniform(CompanyId),
        "AT-1" => Synthesis::PerSlot(&[
            AccountId,
            SourceId,
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            SourceId,
            TargetId,
            TransferType,
            Timestamp,
        ]),
        "AT-2" => Synthesis::PerSlot(&[
            AccountId,
            SourceId,
            AccountId,
            Amount(1.0, 10_000.0),
            AccountId,
            Amount(1.0, 10_000.0),
            SourceId,
            TargetId,
            CheckingType,
            Timestamp,
        ]),
        "AT-3" => Synthesis::PerSlot(&[AccountId, AccountId, AccountId]),
        "AT-4" => Synthesis::PerSlot(&[AccountId, Amount(1.0, 100_000.0), Timestamp]),
        "AT-5" | "AT-6" => Synthesis::Uniform(ApplicantId),

        "IQ-1" => Synthesis::PerSlot(&[SourceId, TargetId]),
        "IQ-2" | "IQ-4" => Synthesis::PerSlot(&[SourceId, SourceId]),
        "IQ-3" => Synthesis::Uniform(CompanyId),
        "IQ-5" => Synthesis::PerSlot(&[SourceId]),

        _ => Synthesis::Fallback,
    }
}

/// HyBench parameter generator.
pub struct ParameterGenerator {
    /// Random number generator.
    rng: StdRng,

    /// Domain entity bounds.
    params: HyBenchParameters,

    /// Number of templates synthesized for.
    generated: u32,
}

impl ParameterGenerator {
    /// Create new `ParameterGenerator`.
    pub fn new(set_seed: bool, seed: Option<u64>, params: HyBenchParameters) -> ParameterGenerator {
        let rng: StdRng;
        if set_seed {
            rng = SeedableRng::seed_from_u64(seed.unwrap());
        } else {
            rng = SeedableRng::from_entropy();
        }

        ParameterGenerator {
            rng,
            params,
            generated: 0,
        }
    }

    /// Synthesize one value per slot for `name`.
    ///
    /// Returns exactly `slots` values, except for deferred templates which
    /// synthesize nothing up front.
    pub fn synthesize(&mut self, name: &str, slots: usize) -> Vec<Value> {
        self.generated += 1;

        if slots == 0 {
            return Vec::new();
        }

        match rules_for(name) {
            Synthesis::Deferred => Vec::new(),
            Synthesis::Uniform(rule) => {
                let mut out = Vec::with_capacity(slots);
                for _ in 0..slots {
                    let value = self.value(&rule, &out);
                    out.push(value);
                }
                out
            }
            Synthesis::PerSlot(table) => {
                let mut out = Vec::with_capacity(slots);
                for i in 0..slots {
                    let rule = table.get(i).copied().unwrap_or(GenericId);
                    let value = self.value(&rule, &out);
                    out.push(value);
                }
                out
            }
            Synthesis::Fallback => {
                let mut out = Vec::with_capacity(slots);
                for _ in 0..slots {
                    let value = self.value(&GenericId, &out);
                    out.push(value);
                }
                out
            }
        }
    }

    /// Generic fallback values, used by the executor's repair step.
    pub fn fill(&mut self, n: usize) -> Vec<Value> {
        (0..n).map(|_| Value::Int(self.generic_id())).collect()
    }

    /// Synthesize one value for `rule`; `earlier` holds the values already
    /// produced for this template, for echo slots.
    pub fn value(&mut self, rule: &SlotRule, earlier: &[Value]) -> Value {
        match rule {
            CustomerId => Value::Int(self.rng.gen_range(1..=self.params.max_custid) as i64),
            CompanyId => Value::Int(self.rng.gen_range(1..=self.params.max_companyid) as i64),
            AccountId => Value::Int(self.rng.gen_range(1..=self.params.max_accountid) as i64),
            SourceId => Value::Int(self.rng.gen_range(1..=self.params.max_sourceid) as i64),
            TargetId => Value::Int(self.rng.gen_range(1..=self.params.max_targetid) as i64),
            ApplicantId => Value::Int(self.rng.gen_range(1..=self.params.max_applicantid) as i64),
            Amount(lo, hi) => Value::Float(self.rng.gen_range(*lo..*hi)),
            DurationDays => Value::Int(self.rng.gen_range(1..=365)),
            CompanyCategory => Value::Text(self.choice(COMPANY_CATEGORIES)),
            TransferType => Value::Text(self.choice(TRANSFER_TYPES)),
            CheckingType => Value::Text(self.choice(CHECKING_TYPES)),
            Timestamp => Value::Timestamp(Local::now().naive_local()),
            EchoSlot(i) => match earlier.get(*i) {
                Some(value) => value.clone(),
                None => Value::Int(self.generic_id()),
            },
            GenericId => Value::Int(self.generic_id()),
        }
    }

    /// Loan status chosen at contract time.
    pub fn status(&mut self) -> Value {
        let n: f64 = self.rng.gen();
        if n > 0.5 {
            Value::Text("accept".to_string())
        } else {
            Value::Text("reject".to_string())
        }
    }

    /// Get number of templates synthesized for.
    pub fn get_generated(&self) -> u32 {
        self.generated
    }

    fn generic_id(&mut self) -> i64 {
        self.rng.gen_range(1..=100_000)
    }

    fn choice(&mut self, options: &[&str]) -> String {
        options[self.rng.gen_range(0..options.len())].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::Category;
    use strum::IntoEnumIterator;

    fn generator() -> ParameterGenerator {
        ParameterGenerator::new(true, Some(42), HyBenchParameters::default())
    }

    fn is_deferred(name: &str) -> bool {
        matches!(rules_for(name), Synthesis::Deferred)
    }

    #[test]
    fn synthesis_completeness_test() {
        let mut gen = generator();
        for category in Category::iter() {
            for name in category.templates() {
                for &slots in &[0usize, 1, 2, 5, 10, 12] {
                    let values = gen.synthesize(name, slots);
                    if is_deferred(name) && slots > 0 {
                        assert!(values.is_empty(), "{} should defer", name);
                    } else {
                        assert_eq!(values.len(), slots, "{} slot count", name);
                    }
                }
            }
        }
    }

    #[test]
    fn domain_bounds_test() {
        let params = HyBenchParameters::default();
        let mut gen = generator();

        for _ in 0..100 {
            let values = gen.synthesize("AP-2", 3);
            for value in values {
                match value {
                    Value::Int(id) => {
                        assert!(id >= 1 && id <= params.max_custid as i64);
                    }
                    other => panic!("expected customer id, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn transfer_slot_semantics_test() {
        let params = HyBenchParameters::default();
        let mut gen = generator();
        let values = gen.synthesize("TP-9", 10);

        for &slot in &[0usize, 2, 4] {
            match &values[slot] {
                Value::Int(id) => assert!(*id >= 1 && *id <= params.max_accountid as i64),
                other => panic!("slot {} expected account id, got {:?}", slot, other),
            }
        }
        for &slot in &[1usize, 3, 7] {
            match &values[slot] {
                Value::Float(amount) => assert!(*amount >= 1.0 && *amount < 10_000.0),
                other => panic!("slot {} expected amount, got {:?}", slot, other),
            }
        }
        match &values[8] {
            Value::Text(label) => assert!(TRANSFER_TYPES.contains(&label.as_str())),
            other => panic!("slot 8 expected transfer type, got {:?}", other),
        }
        assert!(matches!(values[9], Value::Timestamp(_)));
    }

    #[test]
    fn echo_slot_test() {
        let mut gen = generator();
        let values = gen.synthesize("AP-1", 8);

        for i in 2..8 {
            assert_eq!(values[i], values[i % 2], "slot {} echoes slot {}", i, i % 2);
        }
    }

    #[test]
    fn unknown_template_fallback_test() {
        let mut gen = generator();
        let values = gen.synthesize("X-99", 4);
        assert_eq!(values.len(), 4);
        for value in values {
            match value {
                Value::Int(id) => assert!(id >= 1 && id <= 100_000),
                other => panic!("expected generic id, got {:?}", other),
            }
        }
    }

    #[test]
    fn fill_test() {
        let mut gen = generator();
        assert!(gen.fill(0).is_empty());
        assert_eq!(gen.fill(5).len(), 5);
    }
}
