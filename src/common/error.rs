//! There are two types of errors, (i) fatal errors, and (ii) non-fatal errors.
//! Fatal errors abort startup before any workload runs.
//! Non-fatal errors are contained at the driver-iteration boundary: the
//! iteration is rolled back and the benchmark keeps making forward progress.
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

/// Represents a fatal error.
#[derive(PartialEq, Debug, Clone)]
pub enum FatalError {
    /// Catalog file unreadable or rejected by both parser strategies.
    CatalogLoad(String),

    /// Unable to establish a database connection.
    DatabaseConnection(String),

    /// Catalog validation enabled and a category names absent templates.
    MissingTemplates(Vec<String>),

    /// Settings file unreadable or malformed.
    Configuration(String),
}

/// Represents a non-fatal error.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub enum NonFatalError {
    /// Template absent from the catalog; the driver skips the iteration.
    UnknownTemplate(String),

    /// Statement rejected by the connection; the driver rolls back.
    StatementExecution(String),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use FatalError::*;
        match *self {
            CatalogLoad(ref reason) => write!(f, "unable to load catalog: {}", reason),
            DatabaseConnection(ref reason) => write!(f, "unable to connect: {}", reason),
            MissingTemplates(ref names) => {
                write!(f, "templates missing from catalog: {}", names.join(", "))
            }
            Configuration(ref reason) => write!(f, "invalid configuration: {}", reason),
        }
    }
}

impl fmt::Display for NonFatalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use NonFatalError::*;
        match *self {
            UnknownTemplate(ref name) => write!(f, "not found: template {}", name),
            StatementExecution(ref reason) => write!(f, "statement failed: {}", reason),
        }
    }
}

impl error::Error for FatalError {}

impl error::Error for NonFatalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_test() {
        let e1 = FatalError::CatalogLoad("no such file".to_string());
        let e2 = FatalError::MissingTemplates(vec!["TP-1".to_string(), "IQ-5".to_string()]);
        let e3 = NonFatalError::UnknownTemplate("AT-7".to_string());
        let e4 = NonFatalError::StatementExecution("lock wait timeout".to_string());

        assert_eq!(
            format!("{}", e1),
            format!("unable to load catalog: no such file")
        );
        assert_eq!(
            format!("{}", e2),
            format!("templates missing from catalog: TP-1, IQ-5")
        );
        assert_eq!(format!("{}", e3), format!("not found: template AT-7"));
        assert_eq!(
            format!("{}", e4),
            format!("statement failed: lock wait timeout")
        );
    }
}
