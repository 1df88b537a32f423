//! Subcommands run in-process against temporary directories.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use vitae_cli::{build_cli, execute};
use vitae_store::{FileBackend, LocalStore, Locale};

async fn run(args: &[&str]) -> (bool, String) {
    let matches = build_cli()
        .try_get_matches_from(std::iter::once("vitae").chain(args.iter().copied()))
        .unwrap();
    let mut out = Vec::new();
    let ok = execute(&matches, &mut out).await.unwrap();
    (ok, String::from_utf8(out).unwrap())
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn file_store(dir: &Path) -> LocalStore {
    LocalStore::new(Arc::new(FileBackend::open(dir).unwrap()))
}

#[tokio::test]
async fn inspect_prints_sections_fields_and_lists() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_json(
        dir.path(),
        "cv.json",
        &json!({"name": "Ana", "email": "a@b.com", "sections": {"experience": {"title": "Exp", "jobs": []}}}),
    );

    let (ok, out) = run(&["--dir", dir.path().to_str().unwrap(), "inspect", &doc]).await;
    assert!(ok);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Personal Information [personal]",
            "  name (Name) text *",
            "  email (Email) email *",
            "Exp [experience]",
            "  sections.experience.jobs (Jobs) [0 item(s)] {company*, title*, period, description}",
        ]
    );
}

#[tokio::test]
async fn inspect_json_is_a_descriptor_tree() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_json(dir.path(), "cv.json", &json!({"name": "Ana", "skills": ["rust"]}));

    let (_, out) = run(&["--dir", dir.path().to_str().unwrap(), "inspect", &doc, "--json"]).await;
    let tree: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(tree["sections"].as_array().unwrap().len(), 1);
    assert_eq!(tree["sections"][0]["lists"][0]["shape"], json!("scalar"));
}

#[tokio::test]
async fn export_then_import_into_another_cache() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let store = file_store(source.path());
    store
        .put(&"pt".parse::<Locale>().unwrap(), &json!({"name": "Ana", "languageName": "Português"}))
        .unwrap();
    store.put(&"en".parse::<Locale>().unwrap(), &json!({"name": "Ann"})).unwrap();

    let bundle = work.path().join("bundle.json");
    let bundle = bundle.to_str().unwrap();
    let (ok, out) = run(&["--dir", source.path().to_str().unwrap(), "export", bundle]).await;
    assert!(ok);
    assert!(out.starts_with("exported 2 locale(s)"));

    let (_, out) = run(&["--dir", target.path().to_str().unwrap(), "import", bundle]).await;
    assert_eq!(out.trim(), "imported 2 locale(s): pt, en");

    let (_, out) = run(&["--dir", target.path().to_str().unwrap(), "locales"]).await;
    assert_eq!(out, "pt\tPortuguês\nen\tEN\n");
}

#[tokio::test]
async fn diff_reports_divergent_paths() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_json(dir.path(), "a.json", &json!({"name": "Ana", "tags": ["x", "y"]}));
    let b = write_json(dir.path(), "b.json", &json!({"tags": ["x", "y"], "name": "Ana"}));
    let c = write_json(dir.path(), "c.json", &json!({"name": "Ana", "tags": ["x", "z"]}));
    let cache = dir.path().join("cache");
    let cache = cache.to_str().unwrap();

    let (ok, out) = run(&["--dir", cache, "diff", &a, &b]).await;
    assert!(ok);
    assert_eq!(out, "in sync\n");

    let (ok, out) = run(&["--dir", cache, "diff", &a, &c, "--locale", "pt"]).await;
    assert!(!ok);
    assert!(out.starts_with("local and remote copies of 'pt' differ"));
    assert!(out.ends_with("  tags[1]\n"));
}

#[tokio::test]
async fn config_file_sets_cache_directory() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("from-config");
    let config = dir.path().join("vitae.toml");
    std::fs::write(
        &config,
        format!("[storage]\ndirectory = {:?}\n", cache.to_str().unwrap()),
    )
    .unwrap();

    let (_, out) = run(&["--config", config.to_str().unwrap(), "locales"]).await;
    assert_eq!(out, "no cached locales\n");
    assert!(cache.is_dir());
}
