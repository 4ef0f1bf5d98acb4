use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// One acceptable shape of a status message
#[derive(Debug, Clone)]
pub enum MessageForm {
    Literal(String),
    /// Unanchored unless the expression anchors itself
    Pattern(Regex),
}

impl MessageForm {
    pub fn accepts(
        &self,
        message: &str,
    ) -> bool {
        match self {
            MessageForm::Literal(expected) => expected == message,
            MessageForm::Pattern(re) => re.is_match(message),
        }
    }
}

impl From<&str> for MessageForm {
    fn from(s: &str) -> Self {
        MessageForm::Literal(s.to_string())
    }
}

impl From<String> for MessageForm {
    fn from(s: String) -> Self {
        MessageForm::Literal(s)
    }
}

impl From<Regex> for MessageForm {
    fn from(re: Regex) -> Self {
        MessageForm::Pattern(re)
    }
}

impl fmt::Display for MessageForm {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MessageForm::Literal(s) => write!(f, "{s:?}"),
            MessageForm::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Predicate over the status messages of every unit of one role
#[derive(Debug, Clone)]
pub enum Expectation {
    /// Every unit reports exactly this message
    Exact(String),
    /// One entry per unit, order-insensitive: each unit must satisfy a
    /// distinct entry and the entry count must equal the unit count. This is
    /// how heterogeneous per-unit states (one lagging unit, one active and one
    /// standby) are expressed.
    AnyOf(Vec<MessageForm>),
    /// Every unit's message matches the expression
    Pattern(Regex),
    /// Every unit matches at least one entry; entries may be reused
    OneOf(Vec<MessageForm>),
}

impl Expectation {
    pub fn exact(message: impl Into<String>) -> Self {
        Expectation::Exact(message.into())
    }

    pub fn any_of<I, F>(forms: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<MessageForm>,
    {
        Expectation::AnyOf(forms.into_iter().map(Into::into).collect())
    }

    pub fn one_of<I, F>(forms: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<MessageForm>,
    {
        Expectation::OneOf(forms.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Expectation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let join = |forms: &[MessageForm]| {
            forms.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        match self {
            Expectation::Exact(s) => write!(f, "every unit {s:?}"),
            Expectation::Pattern(re) => write!(f, "every unit /{}/", re.as_str()),
            Expectation::AnyOf(forms) => {
                write!(f, "one unit each of [{}]", join(forms))
            }
            Expectation::OneOf(forms) => write!(f, "every unit one of {{{}}}", join(forms)),
        }
    }
}

/// Role name to expectation. Roles not listed are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct FleetExpectation {
    roles: BTreeMap<String, Expectation>,
}

impl FleetExpectation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(
        mut self,
        role: &str,
        expectation: Expectation,
    ) -> Self {
        self.roles.insert(role.to_string(), expectation);
        self
    }

    /// Merges `other` into `self`; roles in `other` win.
    pub fn merge(
        mut self,
        other: FleetExpectation,
    ) -> Self {
        self.roles.extend(other.roles);
        self
    }

    pub fn get(
        &self,
        role: &str,
    ) -> Option<&Expectation> {
        self.roles.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, &Expectation)> {
        self.roles.iter().map(|(r, e)| (r.as_str(), e))
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
