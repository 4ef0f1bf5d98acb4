use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Identities, jars and artifact used by [`crate::WorkloadVerifier`]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkloadConfig {
    /// Unprivileged user owning the workload directory
    #[serde(default = "default_user")]
    pub user: String,

    /// HDFS superuser used for administrative commands
    #[serde(default = "default_superuser")]
    pub superuser: String,

    #[serde(default = "default_examples_jar")]
    pub examples_jar: String,

    /// Jar providing `org.apache.hadoop.io.TestSequenceFile`
    #[serde(default = "default_tests_jar")]
    pub tests_jar: String,

    /// Rows generated by teragen
    #[serde(default = "default_teragen_rows")]
    pub teragen_rows: u64,

    /// Content written before and read back after every disruptive step
    #[serde(default = "default_artifact_contents")]
    pub artifact_contents: String,

    #[serde(default = "default_artifact_local_path")]
    pub artifact_local_path: String,

    /// Name of the artifact inside the user's HDFS home
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            superuser: default_superuser(),
            examples_jar: default_examples_jar(),
            tests_jar: default_tests_jar(),
            teragen_rows: default_teragen_rows(),
            artifact_contents: default_artifact_contents(),
            artifact_local_path: default_artifact_local_path(),
            artifact_name: default_artifact_name(),
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("user", &self.user),
            ("superuser", &self.superuser),
            ("examples_jar", &self.examples_jar),
            ("tests_jar", &self.tests_jar),
            ("artifact_contents", &self.artifact_contents),
            ("artifact_local_path", &self.artifact_local_path),
            ("artifact_name", &self.artifact_name),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("workload.{name} cannot be empty")));
            }
            // Commands are wrapped in single quotes for `su -c`
            if value.contains('\'') {
                return Err(invalid(format!("workload.{name} cannot contain single quotes")));
            }
        }
        if self.artifact_contents.chars().any(char::is_whitespace) {
            return Err(invalid("workload.artifact_contents must be a single word"));
        }
        if self.teragen_rows == 0 {
            return Err(invalid("workload.teragen_rows must be > 0"));
        }
        Ok(())
    }

    pub fn home_dir(&self) -> String {
        format!("/user/{}", self.user)
    }
}

fn default_user() -> String {
    "ubuntu".to_string()
}
fn default_superuser() -> String {
    "hdfs".to_string()
}
fn default_examples_jar() -> String {
    "/usr/lib/hadoop/share/hadoop/mapreduce/hadoop-mapreduce-examples-*.jar".to_string()
}
fn default_tests_jar() -> String {
    "/usr/lib/hadoop/share/hadoop/common/hadoop-common-*-tests.jar".to_string()
}
fn default_teragen_rows() -> u64 {
    10_000
}
fn default_artifact_contents() -> String {
    "test-file-contents".to_string()
}
fn default_artifact_local_path() -> String {
    "/tmp/testfile".to_string()
}
fn default_artifact_name() -> String {
    "testfile".to_string()
}
