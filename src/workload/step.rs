/// A shell command run on a unit under an OS identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadStep {
    /// Label reported on failure
    pub name: String,
    pub identity: String,
    pub script: String,
}

impl WorkloadStep {
    pub fn new(
        name: &str,
        identity: &str,
        script: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            identity: identity.to_string(),
            script: script.into(),
        }
    }

    /// The script wrapped for execution as `identity`.
    ///
    /// Scripts never contain single quotes; configuration validation rejects
    /// values that would introduce one.
    pub fn command(&self) -> String {
        format!("su {} -c '{}'", self.identity, self.script)
    }
}
