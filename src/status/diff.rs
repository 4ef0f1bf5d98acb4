use std::collections::BTreeMap;
use std::fmt;

use crate::StatusMessage;
use crate::UnitName;

/// Last observed status against what was expected, per expected role.
///
/// Carried verbatim by [`crate::ConvergenceError::TimedOut`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDiff {
    pub roles: Vec<RoleDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDiff {
    pub role: String,
    /// Rendered expectation
    pub expected: String,
    /// Unit count required by a one-per-unit list expectation
    pub expected_units: Option<usize>,
    pub observed: BTreeMap<UnitName, StatusMessage>,
    /// Units whose message could not be matched
    pub unmatched: Vec<UnitName>,
    pub satisfied: bool,
}

impl StatusDiff {
    pub fn is_satisfied(&self) -> bool {
        self.roles.iter().all(|r| r.satisfied)
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &RoleDiff> {
        self.roles.iter().filter(|r| !r.satisfied)
    }
}

impl fmt::Display for StatusDiff {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for role in &self.roles {
            write!(f, "{role}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RoleDiff {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let verdict = if self.satisfied { "ok" } else { "MISMATCH" };
        writeln!(f, "[{}] {}", self.role, verdict)?;
        writeln!(f, "  expected: {}", self.expected)?;
        if let Some(count) = self.expected_units {
            if count != self.observed.len() {
                writeln!(
                    f,
                    "  expected {} units, observed {}",
                    count,
                    self.observed.len()
                )?;
            }
        }
        if self.observed.is_empty() {
            writeln!(f, "  observed: <no units reported>")?;
        }
        for (unit, message) in &self.observed {
            let marker = if self.unmatched.contains(unit) { "  <-- unmatched" } else { "" };
            writeln!(f, "  {unit}: {message:?}{marker}")?;
        }
        Ok(())
    }
}
