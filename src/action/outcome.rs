use std::collections::BTreeMap;

use crate::ActionHandle;
use crate::ActionResult;

/// What can honestly be concluded from an action result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action completed and set result fields
    Succeeded(BTreeMap<String, String>),
    /// The control plane explicitly reported a failure
    Failed(String),
    /// No signal: silent success, unreported failure and a fetch that gave up
    /// before completion are indistinguishable
    Unknown,
}

/// A resolved action: the raw result as reported, plus its handle
#[derive(Debug, Clone)]
pub struct Resolution {
    handle: ActionHandle,
    result: ActionResult,
}

impl Resolution {
    pub fn new(
        handle: ActionHandle,
        result: ActionResult,
    ) -> Self {
        Self { handle, result }
    }

    pub fn handle(&self) -> &ActionHandle {
        &self.handle
    }

    pub fn completed(&self) -> bool {
        self.result.completed
    }

    /// Raw result fields, possibly empty
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.result.fields
    }

    pub fn outcome(&self) -> ActionOutcome {
        if let Some(message) = &self.result.failure {
            return ActionOutcome::Failed(message.clone());
        }
        if self.result.completed && !self.result.fields.is_empty() {
            return ActionOutcome::Succeeded(self.result.fields.clone());
        }
        ActionOutcome::Unknown
    }

    /// Reads `key` as a YAML boolean. A missing or unparsable field is false.
    pub fn flag(
        &self,
        key: &str,
    ) -> bool {
        self.result.fields.get(key).is_some_and(|value| parse_flag(value))
    }
}

/// YAML boolean, accepting the YAML 1.1 spellings (`yes`, `on`) that the
/// reporting side may still emit.
pub(crate) fn parse_flag(value: &str) -> bool {
    if let Ok(flag) = serde_yaml::from_str::<bool>(value) {
        return flag;
    }
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "on" | "true"
    )
}
