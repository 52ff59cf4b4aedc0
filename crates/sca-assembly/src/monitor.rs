//! Diagnostic sink threaded through every build stage

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub severity: Severity,
    pub message_id: &'static str,
    /// Path of the offending model object, e.g. `Store/Catalog#currencyConverter`
    pub model: String,
    pub params: Vec<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message_id, self.model)?;
        if !self.params.is_empty() {
            write!(f, " ({})", self.params.join(", "))?;
        }
        Ok(())
    }
}

/// Append-only problem accumulator
#[derive(Debug, Default)]
pub struct Monitor {
    problems: Vec<Problem>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, problem: Problem) {
        match problem.severity {
            Severity::Warning => tracing::warn!(
                message_id = problem.message_id,
                model = %problem.model,
                params = ?problem.params,
                "assembly warning"
            ),
            Severity::Error => tracing::error!(
                message_id = problem.message_id,
                model = %problem.model,
                params = ?problem.params,
                "assembly error"
            ),
        }
        self.problems.push(problem);
    }

    pub fn warning(&mut self, message_id: &'static str, model: impl Into<String>, params: &[&str]) {
        self.report(Problem {
            severity: Severity::Warning,
            message_id,
            model: model.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
    }

    pub fn error(&mut self, message_id: &'static str, model: impl Into<String>, params: &[&str]) {
        self.report(Problem {
            severity: Severity::Error,
            message_id,
            model: model.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }

    /// Number of problems with the given message id
    pub fn count(&self, message_id: &str) -> usize {
        self.problems
            .iter()
            .filter(|p| p.message_id == message_id)
            .count()
    }

    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_accumulates_in_order() {
        let mut monitor = Monitor::new();
        monitor.warning("DuplicateComponentName", "Store", &["Catalog"]);
        monitor.error("ImplementationNotFound", "Store/Catalog", &[]);

        assert_eq!(monitor.problems().len(), 2);
        assert!(monitor.has_errors());
        assert_eq!(monitor.count("DuplicateComponentName"), 1);
        assert_eq!(
            monitor.problems()[0].to_string(),
            "warning: DuplicateComponentName at Store (Catalog)"
        );
    }
}
