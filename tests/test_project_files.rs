use log_focus::config::{ConfigError, EngineConfig, load_config, load_config_from_path, load_project_file};
use log_focus::document::{DocumentStore, DocumentSnapshot};
use log_focus::filter::FilterError;
use log_focus::project::Workspace;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write temp file");
    path
}

#[test]
fn test_load_json_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "filters.json",
        r##"{
            "selected": "svc",
            "projects": [
                { "name": "other", "groups": [] },
                { "name": "svc", "groups": [
                    { "name": "errors", "filters": [
                        { "pattern": "ERROR", "color": "#c0392b" },
                        { "pattern": "DEBUG", "exclude": true, "highlighted": false }
                    ] }
                ] }
            ]
        }"##,
    );

    let file = load_project_file(&path).unwrap();
    let workspace = Workspace::from_file(&file, &EngineConfig::default()).unwrap();
    let project = workspace.selected().unwrap();

    assert_eq!(project.name(), "svc");
    let filters: Vec<_> = project.filters().collect();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0].pattern(), "ERROR");
    assert!(filters[0].flags().shown);
    assert!(filters[1].flags().exclude);
    assert!(!filters[1].flags().highlighted);
}

#[test]
fn test_load_json5_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "filters.json5",
        r#"{
            // noise we never want to read
            projects: [
                { name: 'svc', groups: [
                    { name: 'noise', filters: [ { pattern: 'healthcheck', exclude: true } ] },
                ] },
            ],
        }"#,
    );

    let file = load_project_file(&path).unwrap();
    assert_eq!(file.projects[0].groups[0].filters[0].pattern, "healthcheck");
    assert!(file.projects[0].groups[0].filters[0].exclude);
}

#[test]
fn test_load_toml_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "filters.toml",
        r#"
selected = "svc"

[[projects]]
name = "svc"

[[projects.groups]]
name = "errors"

[[projects.groups.filters]]
pattern = "ERROR|FATAL"
"#,
    );

    let file = load_project_file(&path).unwrap();
    let workspace = Workspace::from_file(&file, &EngineConfig::default()).unwrap();
    let project = workspace.selected().unwrap();
    assert_eq!(project.groups()[0].name, "errors");
    assert_eq!(project.filters().next().unwrap().pattern(), "ERROR|FATAL");
}

#[test]
fn test_invalid_pattern_rejects_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "filters.json",
        r#"{ "projects": [ { "name": "svc", "groups": [
            { "name": "g", "filters": [ { "pattern": "(unclosed" } ] }
        ] } ] }"#,
    );

    let file = load_project_file(&path).unwrap();
    let err = Workspace::from_file(&file, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, FilterError::InvalidPattern { .. }));
}

#[test]
fn test_saved_workspace_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "filters.json",
        r#"{ "projects": [ { "name": "svc", "groups": [
            { "name": "g", "filters": [ { "pattern": "a" }, { "pattern": "b", "shown": false } ] }
        ] } ] }"#,
    );
    let workspace =
        Workspace::from_file(&load_project_file(&path).unwrap(), &EngineConfig::default())
            .unwrap();

    let saved = write(
        &dir,
        "saved.json",
        &serde_json::to_string_pretty(&workspace.to_file()).unwrap(),
    );
    let reloaded =
        Workspace::from_file(&load_project_file(&saved).unwrap(), &EngineConfig::default())
            .unwrap();

    assert_eq!(reloaded.to_file(), workspace.to_file());
}

#[test]
fn test_malformed_toml_project_file_is_reported_as_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "filters.toml", "[[projects]\nname = \"svc\"\n");

    let err = load_project_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
    let message = err.to_string();
    assert!(message.contains("project file"), "message: {message}");
    assert!(!message.contains("config file"), "message: {message}");
}

#[test]
fn test_malformed_engine_config_is_reported_as_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "engine.toml", "[cache\n");

    let err = load_config_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config file"));
}

#[test]
fn test_missing_project_file_reports_path() {
    let err = load_project_file(std::path::Path::new("/nonexistent/filters.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/filters.json"));
}

#[test]
fn test_engine_config_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "engine.toml",
        "[cache]\nmax_entries = 4\nttl_secs = 10\n\n[large_file]\nthreshold_bytes = 2048\n",
    );

    let cfg = load_config_from_path(&path).unwrap();
    assert_eq!(cfg.cache.max_entries, 4);
    assert_eq!(cfg.cache.ttl_secs, 10);
    assert_eq!(cfg.large_file.threshold_bytes, 2048);
    assert_eq!(cfg.large_file.max_decoration_ranges, 5_000);

    assert_eq!(load_config(None).unwrap(), EngineConfig::default());
}

#[test]
fn test_closing_a_document_drops_its_cache_entries() {
    let mut store = DocumentStore::new();
    let file = log_focus::project::ProjectFile {
        selected: None,
        projects: vec![log_focus::project::ProjectDef {
            name: "svc".to_string(),
            groups: vec![log_focus::project::GroupDef {
                name: "g".to_string(),
                filters: vec![log_focus::project::FilterDef::new("ERROR")],
            }],
        }],
    };
    let mut workspace = Workspace::from_file(&file, &EngineConfig::default()).unwrap();
    let doc = store.open("a.log", "ERROR").clone();

    let project = workspace.selected_mut().unwrap();
    log_focus::compositor::evaluate_project(project, &doc);
    assert_eq!(project.filters().next().unwrap().cache().len(), 1);

    store.close(doc.id());
    workspace.document_closed(doc.id());
    let project = workspace.selected().unwrap();
    assert!(project.filters().next().unwrap().cache().is_empty());
}
