use std::sync::Arc;
use std::sync::Mutex;

use super::*;
use crate::Error;
use crate::MockClusterController;

fn recording_controller(
    fail_on: Option<&'static str>,
    log: Arc<Mutex<Vec<String>>>,
) -> MockClusterController {
    let mut controller = MockClusterController::new();
    controller.expect_exec().returning(move |unit, command| {
        assert_eq!(unit, "client/0");
        log.lock().unwrap().push(command.to_string());
        match fail_on {
            Some(fragment) if command.contains(fragment) => {
                Ok(CommandOutput::new("Exception in thread \"main\" java.io.IOException", 255))
            }
            _ => Ok(CommandOutput::new("", 0)),
        }
    });
    controller
}

#[test]
fn test_step_command_wraps_identity() {
    let step = WorkloadStep::new("write_file", "ubuntu", "hdfs dfs -put /tmp/testfile");

    assert_eq!(step.command(), "su ubuntu -c 'hdfs dfs -put /tmp/testfile'");
}

#[test]
fn test_directory_steps_run_as_superuser() {
    let verifier = WorkloadVerifier::new(Arc::new(MockClusterController::new()), WorkloadConfig::default());

    let commands: Vec<_> = verifier
        .hdfs_directory_steps()
        .iter()
        .map(WorkloadStep::command)
        .collect();

    assert_eq!(
        commands,
        vec![
            "su hdfs -c 'hdfs dfs -mkdir -p /user/ubuntu'",
            "su hdfs -c 'hdfs dfs -chown ubuntu:ubuntu /user/ubuntu'",
            "su hdfs -c 'hdfs dfs -chmod -R 755 /user/ubuntu'",
        ]
    );
}

#[test]
fn test_mapreduce_steps_chain_outputs() {
    let verifier = WorkloadVerifier::new(Arc::new(MockClusterController::new()), WorkloadConfig::default());

    let steps = verifier.mapreduce_steps();
    let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "teragen",
            "mapreduce #1",
            "terasort",
            "mapreduce #2",
            "test lzo",
            "cleanup #1",
            "cleanup #2"
        ]
    );
    assert!(steps[0].script.ends_with("teragen 10000 /user/ubuntu/teragenout"));
    assert_eq!(steps[1].script, "hdfs dfs -ls /user/ubuntu/teragenout/_SUCCESS");
    assert!(steps[2].script.ends_with("terasort /user/ubuntu/teragenout /user/ubuntu/terasortout"));
    assert!(steps[4]
        .script
        .contains("-compressType RECORD xxx -codec org.apache.hadoop.io.compress.LzoCodec -check"));
    assert_eq!(steps[0].identity, "ubuntu");
    assert_eq!(steps[5].identity, "hdfs");
}

#[tokio::test]
async fn test_first_failure_stops_the_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let controller = recording_controller(Some("terasort /user"), log.clone());
    let verifier = WorkloadVerifier::new(Arc::new(controller), WorkloadConfig::default());

    let err = verifier.run_mapreduce("client/0").await.unwrap_err();

    match err {
        Error::Command(CommandError::Failed {
            step, exit_code, output, ..
        }) => {
            assert_eq!(step, "terasort");
            assert_eq!(exit_code, 255);
            assert!(output.contains("IOException"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // teragen, listing, terasort; nothing after
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_write_artifact_commands() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let controller = recording_controller(None, log.clone());
    let verifier = WorkloadVerifier::new(Arc::new(controller), WorkloadConfig::default());

    verifier.write_artifact("client/0").await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "su ubuntu -c 'echo test-file-contents > /tmp/testfile'".to_string(),
            "su ubuntu -c 'hdfs dfs -put /tmp/testfile'".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_read_artifact_checks_contents() {
    let mut controller = MockClusterController::new();
    controller
        .expect_exec()
        .withf(|_, command| command == "su ubuntu -c 'hdfs dfs -cat testfile'")
        .times(2)
        .returning({
            let mut reads = 0;
            move |_, _| {
                reads += 1;
                Ok(CommandOutput::new(
                    if reads == 1 { "test-file-contents\n" } else { "" },
                    0,
                ))
            }
        });
    let verifier = WorkloadVerifier::new(Arc::new(controller), WorkloadConfig::default());

    assert!(verifier.read_artifact("client/0").await.is_ok());

    let err = verifier.read_artifact("client/0").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Verification(VerificationError::ArtifactMismatch { ref expected, .. })
            if expected == "test-file-contents"
    ));
}
