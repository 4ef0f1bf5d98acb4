//! Workload Verifier
//!
//! End-to-end probes run on the client unit: HDFS directory setup, the
//! MapReduce round trip and the read-after-write artifact used around every
//! disruptive step. Steps are dependency-chained; the first non-zero exit
//! aborts with the captured output.

mod step;
pub use step::*;

#[cfg(test)]
mod workload_test;

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::ClusterController;
use crate::CommandError;
use crate::CommandOutput;
use crate::Result;
use crate::VerificationError;
use crate::WorkloadConfig;

pub struct WorkloadVerifier<C: ClusterController> {
    controller: Arc<C>,
    config: WorkloadConfig,
}

impl<C: ClusterController> WorkloadVerifier<C> {
    pub fn new(
        controller: Arc<C>,
        config: WorkloadConfig,
    ) -> Self {
        Self { controller, config }
    }

    /// Home directory creation, ownership and permissions, as the superuser.
    pub fn hdfs_directory_steps(&self) -> Vec<WorkloadStep> {
        let c = &self.config;
        let home = c.home_dir();
        vec![
            WorkloadStep::new(
                "Created a user directory on hdfs",
                &c.superuser,
                format!("hdfs dfs -mkdir -p {home}"),
            ),
            WorkloadStep::new(
                "Assigning an owner to hdfs directory",
                &c.superuser,
                format!("hdfs dfs -chown {user}:{user} {home}", user = c.user),
            ),
            WorkloadStep::new(
                "Setting directory permission on hdfs",
                &c.superuser,
                format!("hdfs dfs -chmod -R 755 {home}"),
            ),
        ]
    }

    /// teragen, terasort, codec check and cleanup, each output listed before
    /// the next step consumes it.
    pub fn mapreduce_steps(&self) -> Vec<WorkloadStep> {
        let c = &self.config;
        let home = c.home_dir();
        let teragen_out = format!("{home}/teragenout");
        let terasort_out = format!("{home}/terasortout");
        vec![
            WorkloadStep::new(
                "teragen",
                &c.user,
                format!(
                    "hadoop jar {} teragen {} {teragen_out}",
                    c.examples_jar, c.teragen_rows
                ),
            ),
            WorkloadStep::new(
                "mapreduce #1",
                &c.superuser,
                format!("hdfs dfs -ls {teragen_out}/_SUCCESS"),
            ),
            WorkloadStep::new(
                "terasort",
                &c.user,
                format!(
                    "hadoop jar {} terasort {teragen_out} {terasort_out}",
                    c.examples_jar
                ),
            ),
            WorkloadStep::new(
                "mapreduce #2",
                &c.superuser,
                format!("hdfs dfs -ls {terasort_out}/_SUCCESS"),
            ),
            WorkloadStep::new(
                "test lzo",
                &c.user,
                format!(
                    "hadoop jar {} org.apache.hadoop.io.TestSequenceFile -seed 0 -count 1000 \
                     -compressType RECORD xxx -codec org.apache.hadoop.io.compress.LzoCodec -check",
                    c.tests_jar
                ),
            ),
            WorkloadStep::new(
                "cleanup #1",
                &c.superuser,
                format!("hdfs dfs -rm -r {teragen_out}"),
            ),
            WorkloadStep::new(
                "cleanup #2",
                &c.superuser,
                format!("hdfs dfs -rm -r {terasort_out}"),
            ),
        ]
    }

    pub fn write_artifact_steps(&self) -> Vec<WorkloadStep> {
        let c = &self.config;
        vec![
            WorkloadStep::new(
                "create_file",
                &c.user,
                format!("echo {} > {}", c.artifact_contents, c.artifact_local_path),
            ),
            WorkloadStep::new(
                "write_file",
                &c.user,
                format!("hdfs dfs -put {}", c.artifact_local_path),
            ),
        ]
    }

    pub fn read_artifact_step(&self) -> WorkloadStep {
        WorkloadStep::new(
            "HDFS READ FILE",
            &self.config.user,
            format!("hdfs dfs -cat {}", self.config.artifact_name),
        )
    }

    #[instrument(skip(self))]
    pub async fn prepare_hdfs_directories(
        &self,
        unit: &str,
    ) -> Result<()> {
        self.run_all(unit, &self.hdfs_directory_steps()).await
    }

    #[instrument(skip(self))]
    pub async fn run_mapreduce(
        &self,
        unit: &str,
    ) -> Result<()> {
        self.run_all(unit, &self.mapreduce_steps()).await
    }

    #[instrument(skip(self))]
    pub async fn write_artifact(
        &self,
        unit: &str,
    ) -> Result<()> {
        self.run_all(unit, &self.write_artifact_steps()).await
    }

    /// Reads the artifact back; the output must contain what was written.
    #[instrument(skip(self))]
    pub async fn read_artifact(
        &self,
        unit: &str,
    ) -> Result<()> {
        let out = self.run_step(unit, &self.read_artifact_step()).await?;
        if !out.output.contains(&self.config.artifact_contents) {
            error!(output = %out.output, "artifact contents not found");
            return Err(VerificationError::ArtifactMismatch {
                unit: unit.to_string(),
                expected: self.config.artifact_contents.clone(),
                output: out.output,
            }
            .into());
        }
        info!("artifact readable");
        Ok(())
    }

    /// Runs `steps` in order, stopping at the first failure.
    pub async fn run_all(
        &self,
        unit: &str,
        steps: &[WorkloadStep],
    ) -> Result<()> {
        for step in steps {
            self.run_step(unit, step).await?;
        }
        Ok(())
    }

    /// Runs one step; a non-zero exit becomes [`CommandError::Failed`].
    pub async fn run_step(
        &self,
        unit: &str,
        step: &WorkloadStep,
    ) -> Result<CommandOutput> {
        let command = step.command();
        debug!(step = %step.name, %command, "running workload step");

        let out = self.controller.exec(unit, &command).await?;
        if !out.success() {
            error!(step = %step.name, exit_code = out.exit_code, "workload step failed");
            return Err(CommandError::Failed {
                step: step.name.clone(),
                unit: unit.to_string(),
                exit_code: out.exit_code,
                output: out.output,
            }
            .into());
        }
        info!(step = %step.name, "ok");
        Ok(out)
    }
}
