//! Workflow-level tests driven directly against the mock provider.

use caption_service::config::PollConfig;
use caption_service::services::providers::mock::MockCaptionProvider;
use caption_service::services::providers::{CaptionProvider, FileState};
use caption_service::services::workflow::{CaptionWorkflow, UploadedFile, WorkflowError};
use std::sync::Arc;

const POLL: PollConfig = PollConfig {
    interval_secs: 0,
    max_attempts: 2,
};

async fn test_upload() -> UploadedFile {
    UploadedFile::spool(b"not really a video", "video/mp4".into(), "clip.mp4".into())
        .await
        .expect("Failed to spool test upload")
}

#[tokio::test]
async fn ready_file_generates_without_waiting() {
    let provider = Arc::new(MockCaptionProvider::ready("a caption"));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let text = workflow
        .generate(&test_upload().await, "describe this clip")
        .await
        .expect("Workflow failed");

    assert_eq!(text, "a caption");
    assert_eq!(provider.status_count(), 1);
    assert_eq!(provider.generate_count(), 1);
}

#[tokio::test]
async fn polling_stops_at_first_non_processing_state() {
    let provider = Arc::new(MockCaptionProvider::with_states(
        vec![FileState::Processing, FileState::Active],
        "eventually ready",
    ));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let text = workflow
        .generate(&test_upload().await, "describe this clip")
        .await
        .expect("Workflow failed");

    assert_eq!(text, "eventually ready");
    assert_eq!(provider.status_count(), 2);
    assert_eq!(provider.generate_count(), 1);
}

#[tokio::test]
async fn unknown_state_counts_as_ready() {
    let provider = Arc::new(MockCaptionProvider::with_states(
        vec![FileState::Unknown],
        "unfamiliar but ready",
    ));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let text = workflow
        .generate(&test_upload().await, "describe this clip")
        .await
        .expect("Workflow failed");

    assert_eq!(text, "unfamiliar but ready");
    assert_eq!(provider.status_count(), 1);
}

#[tokio::test]
async fn failed_state_aborts_before_generation() {
    let provider = Arc::new(MockCaptionProvider::with_states(
        vec![FileState::Processing, FileState::Failed],
        "unused",
    ));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let result = workflow
        .generate(&test_upload().await, "describe this clip")
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::RemoteProcessing { .. })
    ));
    assert_eq!(provider.generate_count(), 0);
}

#[tokio::test]
async fn poll_loop_is_bounded() {
    // Script never leaves PROCESSING; the workflow must give up after
    // max_attempts interval waits instead of spinning forever.
    let provider = Arc::new(MockCaptionProvider::with_states(
        vec![FileState::Processing; 10],
        "unused",
    ));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let result = workflow
        .generate(&test_upload().await, "describe this clip")
        .await;

    match result {
        Err(WorkflowError::PollTimeout { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("Expected PollTimeout, got {:?}", other.map(|_| ())),
    }

    // Initial check plus one per wait.
    assert_eq!(provider.status_count(), 3);
    assert_eq!(provider.generate_count(), 0);
}

#[tokio::test]
async fn empty_generated_text_is_a_generation_error() {
    // The provider call itself succeeds but yields nothing; the workflow
    // must refuse to hand back an empty result.
    let provider = Arc::new(MockCaptionProvider::ready(""));
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let result = workflow
        .generate(&test_upload().await, "describe this clip")
        .await;

    assert!(matches!(result, Err(WorkflowError::Generation(_))));
    assert_eq!(provider.generate_count(), 1);
}

#[tokio::test]
async fn upload_failure_prevents_any_status_check() {
    let provider = Arc::new(MockCaptionProvider::failing_upload());
    let workflow = CaptionWorkflow::new(provider.clone() as Arc<dyn CaptionProvider>, &POLL);

    let result = workflow
        .generate(&test_upload().await, "describe this clip")
        .await;

    assert!(matches!(result, Err(WorkflowError::Upload(_))));
    assert_eq!(provider.status_count(), 0);
    assert_eq!(provider.generate_count(), 0);
}

#[tokio::test]
async fn temp_file_is_removed_when_upload_drops() {
    let upload = test_upload().await;
    let path = upload.path().to_path_buf();
    assert!(path.exists());

    drop(upload);
    assert!(!path.exists());
}
