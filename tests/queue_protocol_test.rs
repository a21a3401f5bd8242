//! Wire format of the job-queue command and status beans.

use gda_events::error::QueueProtocolError;
use gda_events::queue::{
    JobBean, JobStatus, QueueCommand, QueueCommandBean, QueueStatus, QueueStatusBean,
};
use serde_json::{json, Value};

#[test]
fn command_bean_uses_camel_case_and_screaming_commands() {
    let mut job = JobBean::new("xas scan");
    job.submit();
    let bean = QueueCommandBean::new(QueueCommand::PauseJob)
        .for_queue_id("scanning-queue")
        .with_job(job.clone());

    let encoded: Value = serde_json::from_str(&bean.to_json().unwrap()).unwrap();
    assert_eq!(encoded["jobQueueId"], "scanning-queue");
    assert_eq!(encoded["command"], "PAUSE_JOB");
    assert_eq!(encoded["jobBean"]["uniqueId"], job.unique_id.as_str());
    assert_eq!(encoded["jobBean"]["status"], "SUBMITTED");
    // Absent optionals are left off the wire.
    assert!(encoded.get("queueName").is_none());
    assert!(encoded.get("errorMessage").is_none());
}

#[test]
fn command_bean_decodes_from_foreign_json() {
    let wire = json!({
        "queueName": "org.eclipse.scanning.submission.queue",
        "command": "GET_QUEUE",
    })
    .to_string();

    let bean = QueueCommandBean::from_json(&wire).unwrap();
    assert_eq!(bean.command, QueueCommand::GetQueue);
    assert!(bean.validate().is_ok());
    assert!(bean.is_for_queue("other-id", "org.eclipse.scanning.submission.queue"));
    assert!(!bean.is_for_queue("other-id", "another.queue"));
}

#[test]
fn unknown_command_is_a_decode_error() {
    let err = QueueCommandBean::from_json(r#"{"queueName":"q","command":"EXPLODE"}"#)
        .unwrap_err();
    assert!(matches!(err, QueueProtocolError::Json(_)));
}

#[test]
fn validate_rejects_unaddressed_and_jobless_commands() {
    let unaddressed = QueueCommandBean::new(QueueCommand::PauseQueue);
    assert!(matches!(
        unaddressed.validate(),
        Err(QueueProtocolError::Unaddressed(QueueCommand::PauseQueue))
    ));

    let jobless = QueueCommandBean::new(QueueCommand::TerminateJob).for_queue_name("q");
    assert!(matches!(
        jobless.validate(),
        Err(QueueProtocolError::MissingJob(QueueCommand::TerminateJob))
    ));

    let queue_level = QueueCommandBean::new(QueueCommand::ClearQueue).for_queue_name("q");
    assert!(queue_level.validate().is_ok());
}

#[test]
fn acknowledgement_carries_error_or_result() {
    let mut bean = QueueCommandBean::new(QueueCommand::MoveForward).for_queue_name("q");
    bean.mark_failed("job not in queue");
    let message = bean.error_message.clone().unwrap();
    assert!(message.starts_with("Could not process MOVE_FORWARD command for queue q: "));
    assert!(message.contains("q"));
    assert!(message.ends_with("job not in queue"));

    bean.acknowledge(Some(json!([])));
    assert!(bean.error_message.is_none());
    assert_eq!(bean.result, Some(json!([])));
}

#[test]
fn job_command_requests_matching_status() {
    for (command, status) in [
        (QueueCommand::PauseJob, JobStatus::RequestPause),
        (QueueCommand::ResumeJob, JobStatus::RequestResume),
        (QueueCommand::TerminateJob, JobStatus::RequestTerminate),
    ] {
        assert!(command.is_job_command());
        assert_eq!(command.requested_status(), Some(status));
        assert!(status.is_request());
        assert!(!status.is_final());
    }
}

#[test]
fn status_bean_reflects_consumer_state() {
    let mut bean = QueueStatusBean::new(
        "scanning-queue",
        "Scanning Queue",
        "org.eclipse.scanning.submission.queue",
        QueueStatus::derive(true, true, false),
    );
    assert_eq!(bean.queue_status, QueueStatus::Running);
    assert!(bean.publish_time.is_none());

    bean.touch(QueueStatus::derive(true, true, true));
    assert_eq!(bean.queue_status, QueueStatus::Paused);
    assert!(bean.publish_time.is_some());

    let encoded: Value = serde_json::from_str(&bean.to_json().unwrap()).unwrap();
    assert_eq!(encoded["queueStatus"], "PAUSED");
    assert_eq!(encoded["jobQueueName"], "Scanning Queue");

    let decoded = QueueStatusBean::from_json(&bean.to_json().unwrap()).unwrap();
    assert_eq!(decoded, bean);
}
