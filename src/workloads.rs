use config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

pub mod dataflow;

pub mod driver;

pub mod executor;

pub mod mixer;

pub mod paramgen;

/// The four query categories, each with a fixed template name set.
#[derive(
    EnumIter, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy,
)]
pub enum Category {
    /// Analytical processing.
    Ap,
    /// Transactional processing.
    Tp,
    /// Compound account-transaction operations.
    At,
    /// Interactive-query lookups.
    Iq,
}

pub const AP_TEMPLATES: &[&str] = &[
    "AP-1", "AP-2", "AP-3", "AP-4", "AP-5", "AP-6", "AP-7", "AP-8", "AP-9", "AP-10", "AP-11",
    "AP-12", "AP-13",
];

pub const TP_TEMPLATES: &[&str] = &[
    "TP-1", "TP-2", "TP-3", "TP-4", "TP-5", "TP-6", "TP-7", "TP-8", "TP-9", "TP-10", "TP-11",
    "TP-12", "TP-13", "TP-14", "TP-15", "TP-16", "TP-17", "TP-18",
];

pub const AT_TEMPLATES: &[&str] = &[
    "AT-00", "AT-0", "AT-1", "AT-2", "AT-3", "AT-3.1", "AT-4", "AT-4.1", "AT-5", "AT-5.1",
    "AT-6", "AT-6.1",
];

pub const IQ_TEMPLATES: &[&str] = &["IQ-1", "IQ-2", "IQ-3", "IQ-4", "IQ-5", "IQ-5.1", "IQ-6"];

impl Category {
    pub fn templates(&self) -> &'static [&'static str] {
        use Category::*;
        match self {
            Ap => AP_TEMPLATES,
            Tp => TP_TEMPLATES,
            At => AT_TEMPLATES,
            Iq => IQ_TEMPLATES,
        }
    }

    pub fn label(&self) -> &'static str {
        use Category::*;
        match self {
            Ap => "AP",
            Tp => "TP",
            At => "AT",
            Iq => "IQ",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Company category labels.
pub const COMPANY_CATEGORIES: &[&str] = &[
    "software_IT",
    "internet_service",
    "telecommunication",
    "technology_service",
    "computer_communication_manufacturing",
];

/// Transfer-type labels.
pub const TRANSFER_TYPES: &[&str] = &["salary", "invest", "transfer"];

/// Checking-type labels.
pub const CHECKING_TYPES: &[&str] = &["checking", "transfer"];

/// Upper bounds for domain entity identifiers. Fixed for the process
/// lifetime; defaults match the pre-loaded dataset.
#[derive(Debug, Clone)]
pub struct HyBenchParameters {
    pub max_custid: u64,
    pub max_companyid: u64,
    pub max_accountid: u64,
    pub max_sourceid: u64,
    pub max_targetid: u64,
    pub max_applicantid: u64,
}

impl Default for HyBenchParameters {
    fn default() -> Self {
        HyBenchParameters {
            max_custid: 300_000,
            max_companyid: 302_000,
            max_accountid: 302_000,
            max_sourceid: 301_999,
            max_targetid: 301_999,
            max_applicantid: 301_999,
        }
    }
}

impl HyBenchParameters {
    /// Bounds from configuration, falling back to dataset defaults.
    pub fn from_config(config: &Config) -> HyBenchParameters {
        let defaults = HyBenchParameters::default();
        let bound = |key: &str, default: u64| -> u64 {
            config.get_int(key).map(|v| v as u64).unwrap_or(default)
        };

        HyBenchParameters {
            max_custid: bound("max_custid", defaults.max_custid),
            max_companyid: bound("max_companyid", defaults.max_companyid),
            max_accountid: bound("max_accountid", defaults.max_accountid),
            max_sourceid: bound("max_sourceid", defaults.max_sourceid),
            max_targetid: bound("max_targetid", defaults.max_targetid),
            max_applicantid: bound("max_applicantid", defaults.max_applicantid),
        }
    }
}
