use std::collections::BTreeMap;

use super::Expectation;
use super::FleetExpectation;
use super::MessageForm;
use super::RoleDiff;
use super::StatusDiff;
use crate::StatusMessage;
use crate::UnitName;

/// Observed fleet status: role -> unit -> message
pub type FleetStatus = BTreeMap<String, BTreeMap<UnitName, StatusMessage>>;

/// Whether the observed fleet satisfies every role expectation.
///
/// A role listed in `expected` but with no observed units does not match:
/// an absent report never counts as convergence.
pub fn matches(
    observed: &FleetStatus,
    expected: &FleetExpectation,
) -> bool {
    expected.roles().all(|(role, expectation)| {
        let messages = role_messages(observed, role);
        role_matches(&messages, expectation)
    })
}

/// Evaluates one role. Never fails, never mutates.
pub fn role_matches(
    messages: &[&str],
    expectation: &Expectation,
) -> bool {
    if messages.is_empty() {
        return false;
    }
    match expectation {
        Expectation::Exact(expected) => messages.iter().all(|m| *m == expected.as_str()),
        Expectation::Pattern(re) => messages.iter().all(|m| re.is_match(m)),
        Expectation::OneOf(forms) => messages.iter().all(|m| forms.iter().any(|f| f.accepts(m))),
        Expectation::AnyOf(forms) => {
            messages.len() == forms.len()
                && assign(messages, forms).iter().all(Option::is_some)
        }
    }
}

/// Builds the expected-vs-observed report for every expected role.
pub fn diff(
    observed: &FleetStatus,
    expected: &FleetExpectation,
) -> StatusDiff {
    let roles = expected
        .roles()
        .map(|(role, expectation)| {
            let units = observed.get(role).cloned().unwrap_or_default();
            let messages: Vec<&str> = units.values().map(String::as_str).collect();
            let satisfied = role_matches(&messages, expectation);
            let unmatched = unmatched_units(&units, expectation);
            RoleDiff {
                role: role.to_string(),
                expected: expectation.to_string(),
                expected_units: match expectation {
                    Expectation::AnyOf(forms) => Some(forms.len()),
                    _ => None,
                },
                observed: units,
                unmatched,
                satisfied,
            }
        })
        .collect();
    StatusDiff { roles }
}

fn role_messages<'a>(
    observed: &'a FleetStatus,
    role: &str,
) -> Vec<&'a str> {
    observed
        .get(role)
        .map(|units| units.values().map(String::as_str).collect())
        .unwrap_or_default()
}

fn unmatched_units(
    units: &BTreeMap<UnitName, StatusMessage>,
    expectation: &Expectation,
) -> Vec<UnitName> {
    let names: Vec<&UnitName> = units.keys().collect();
    let messages: Vec<&str> = units.values().map(String::as_str).collect();
    let accepted: Vec<bool> = match expectation {
        Expectation::AnyOf(forms) => assign(&messages, forms).iter().map(Option::is_some).collect(),
        other => messages.iter().map(|m| role_matches(&[*m], other)).collect(),
    };
    names
        .into_iter()
        .zip(accepted)
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Maximum one-to-one assignment of messages to forms (augmenting paths).
/// Entry `i` holds the form index assigned to message `i`, if any.
fn assign(
    messages: &[&str],
    forms: &[MessageForm],
) -> Vec<Option<usize>> {
    let mut owner: Vec<Option<usize>> = vec![None; forms.len()];
    for message in 0..messages.len() {
        let mut visited = vec![false; forms.len()];
        augment(message, messages, forms, &mut visited, &mut owner);
    }

    let mut assignment = vec![None; messages.len()];
    for (form, holder) in owner.iter().enumerate() {
        if let Some(message) = holder {
            assignment[*message] = Some(form);
        }
    }
    assignment
}

fn augment(
    message: usize,
    messages: &[&str],
    forms: &[MessageForm],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for form in 0..forms.len() {
        if visited[form] || !forms[form].accepts(messages[message]) {
            continue;
        }
        visited[form] = true;
        let free = match owner[form] {
            None => true,
            Some(other) => augment(other, messages, forms, visited, owner),
        };
        if free {
            owner[form] = Some(message);
            return true;
        }
    }
    false
}
