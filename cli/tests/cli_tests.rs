use clap::Parser;
use docstore_cli::{execute, Cli, Command};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Argument parsing ────────────────────────────────────────────

#[test]
fn download_defaults() {
    let cli = Cli::try_parse_from(["docstore", "download"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("docstore.toml"));
    assert!(!cli.verbose);
    assert_eq!(
        cli.command,
        Command::Download {
            output_dir: PathBuf::from("./output")
        }
    );
}

#[test]
fn compare_flags() {
    let cli = Cli::try_parse_from([
        "docstore",
        "--verbose",
        "compare",
        "--against",
        "changes",
        "--skip-download",
        "--report",
        "out.md",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(
        cli.command,
        Command::Compare {
            output_dir: PathBuf::from("./output"),
            against: PathBuf::from("changes"),
            skip_download: true,
            report: PathBuf::from("out.md"),
        }
    );
}

#[test]
fn apply_is_dry_run_by_default() {
    let cli = Cli::try_parse_from(["docstore", "-c", "x.toml", "apply"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("x.toml"));
    assert_eq!(
        cli.command,
        Command::Apply {
            changes_dir: PathBuf::from("./local_changes"),
            execute: false
        }
    );
}

#[test]
fn report_requires_two_environments() {
    assert!(Cli::try_parse_from(["docstore", "report", "dev"]).is_err());
    let cli = Cli::try_parse_from(["docstore", "report", "dev", "prod", "--out", "r.md"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Report {
            source_env: "dev".into(),
            target_env: "prod".into(),
            out: PathBuf::from("r.md"),
        }
    );
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["docstore"]).is_err());
}

// ── Execution ───────────────────────────────────────────────────

fn write_config(dir: &Path, endpoint: &str) -> PathBuf {
    let path = dir.join("docstore.toml");
    std::fs::write(
        &path,
        format!(
            "project_id = \"proj\"\n\n[store]\nendpoint = \"{endpoint}\"\n\n\
             [[kinds]]\nname = \"Journey\"\nnamespace = \"\"\n"
        ),
    )
    .unwrap();
    path
}

async fn mock_store() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:runQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [{"entity": {
                    "key": {"partitionId": {"projectId": "proj"},
                            "path": [{"kind": "Journey", "id": "1"}]},
                    "properties": {"title": {"stringValue": "remote"}}
                }}],
                "moreResults": "NO_MORE_RESULTS"
            }
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn download_and_compare_end_to_end() {
    let server = mock_store().await;
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let output = dir.path().join("output");
    let changes = dir.path().join("changes");
    std::fs::create_dir_all(changes.join("_default")).unwrap();
    std::fs::write(
        changes.join("_default/Journey.json"),
        r#"[{"id": "1", "data": {"title": "local"}}]"#,
    )
    .unwrap();
    let report = dir.path().join("compare.md");

    let cli = Cli {
        config,
        verbose: false,
        command: Command::Compare {
            output_dir: output.clone(),
            against: changes,
            skip_download: false,
            report: report.clone(),
        },
    };
    execute(cli).await.unwrap();

    assert!(output.join("_default/Journey.json").is_file());
    let markdown = std::fs::read_to_string(report).unwrap();
    assert!(markdown.contains("## Journey"));
    assert!(markdown.contains("### Update Values"));
    assert!(markdown.contains("- **Store Errors**: `0`"));
}

#[tokio::test]
async fn dry_run_apply_never_commits() {
    let server = mock_store().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let changes = dir.path().join("changes");
    std::fs::create_dir_all(changes.join("_default")).unwrap();
    std::fs::write(
        changes.join("_default/Journey.json"),
        r#"[{"id": "1", "data": {"title": "local"}}]"#,
    )
    .unwrap();

    let cli = Cli {
        config,
        verbose: false,
        command: Command::Apply {
            changes_dir: changes.clone(),
            execute: false,
        },
    };
    execute(cli).await.unwrap();
    assert!(changes.join("dry_run/_default/Journey_dry_run.json").is_file());
}

#[tokio::test]
async fn missing_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let cli = Cli {
        config: dir.path().join("missing.toml"),
        verbose: false,
        command: Command::Download {
            output_dir: dir.path().join("out"),
        },
    };
    assert!(execute(cli).await.is_err());
}
