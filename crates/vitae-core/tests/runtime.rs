//! Runtime behaviour against a scripted remote.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use vitae_core::{EditorRuntime, Intent, NetworkError, SaveOutcome, StatusLevel};
use vitae_form::ValidationIssue;
use vitae_test_utils::{controller, locale, resume_en, resume_pt, ScriptedRemote};

#[tokio::test]
async fn stale_response_is_discarded_after_locale_switch() {
    let remote = Arc::new(ScriptedRemote::new().with_document(&locale("pt"), resume_pt()));
    remote.hold(&locale("pt"));

    let editor = controller();
    editor.store().put(&locale("en"), &resume_en()).unwrap();
    let mut runtime = EditorRuntime::new(editor, remote.clone());

    runtime.dispatch(Intent::SwitchLocale(locale("pt"))).unwrap();
    runtime.dispatch(Intent::SwitchLocale(locale("en"))).unwrap();
    assert_eq!(runtime.in_flight(), 1);

    remote.release(&locale("pt"));
    runtime.settle().await;

    let controller = runtime.controller();
    assert_eq!(controller.locale(), Some(&locale("en")));
    assert_eq!(controller.session().unwrap().document(), &resume_en());
    assert_eq!(controller.store().get(&locale("pt")).unwrap(), None);
    assert_eq!(remote.calls(), vec!["fetch:pt"]);
}

#[tokio::test]
async fn sync_uploads_missing_remote_copy() {
    let remote = Arc::new(ScriptedRemote::new());
    let editor = controller();
    editor.store().put(&locale("en"), &resume_en()).unwrap();
    let mut runtime = EditorRuntime::new(editor, remote.clone());

    runtime.dispatch(Intent::SwitchLocale(locale("en"))).unwrap();
    runtime.dispatch(Intent::Sync).unwrap();
    runtime.settle().await;

    assert_eq!(remote.calls(), vec!["fetch:en", "save:en"]);
    assert_eq!(remote.document(&locale("en")).unwrap()["name"], json!("Ana Lima"));
    let status = runtime.controller_mut().drain_status();
    assert_eq!(status.last().unwrap().level, StatusLevel::Success);
}

#[tokio::test]
async fn rejection_and_failure_are_surfaced() {
    let remote = Arc::new(ScriptedRemote::new());
    remote.script_save(Ok(SaveOutcome::Rejected(vec![ValidationIssue::new(
        "/name",
        "must not be blank",
    )])));
    let editor = controller();
    editor.store().put(&locale("en"), &resume_en()).unwrap();
    let mut runtime = EditorRuntime::new(editor, remote.clone());

    runtime.dispatch(Intent::SwitchLocale(locale("en"))).unwrap();
    runtime.dispatch(Intent::Sync).unwrap();
    runtime.settle().await;

    let session = runtime.controller().session().unwrap();
    assert_eq!(
        session.field(&"name".parse().unwrap()).unwrap().issue(),
        Some("must not be blank")
    );
    assert_eq!(remote.document(&locale("en")), None);

    remote.fail_next_fetch(NetworkError::Timeout { secs: 30 });
    runtime.dispatch(Intent::Sync).unwrap();
    runtime.settle().await;
    let status = runtime.controller_mut().drain_status();
    assert_eq!(status.last().unwrap().level, StatusLevel::Danger);
    assert!(!runtime.controller().is_read_only());
}

#[tokio::test]
async fn run_processes_intents_in_order() {
    let remote = Arc::new(ScriptedRemote::new().with_document(&locale("pt"), resume_pt()));
    let mut runtime = EditorRuntime::new(controller(), remote.clone());

    let (tx, rx) = mpsc::channel(16);
    tx.send(Intent::SwitchLocale(locale("pt"))).await.unwrap();
    drop(tx);
    runtime.run(rx).await;

    assert_eq!(runtime.in_flight(), 0);
    let session = runtime.controller().session().unwrap();
    assert_eq!(session.document(), &resume_pt());
    assert!(runtime.controller().store().get(&locale("pt")).unwrap().is_some());

    let schema = runtime.fetch_schema().await.unwrap();
    assert!(schema.is_some());
}
