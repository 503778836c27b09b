use crate::domain::model::{parse_tags, ListFilter, ParamRow, RecordField};
use crate::domain::url_parser::{parse, validate};
use crate::domain::url_rebuilder::rebuild;
use crate::infrastructure::config::{load_config, Config};
use crate::infrastructure::event_ndjson::spawn_ndjson_printer;
use crate::infrastructure::file_store::FileKeyValueStore;
use crate::infrastructure::id_generator::UuidIdGenerator;
use crate::infrastructure::serde_json_adapter::{
    read_import_file, read_json_file, write_history_file,
};
use crate::usecase::editor::EditorSession;
use crate::usecase::event::HistoryEvent;
use crate::usecase::history::{HistoryStore, ImportMode};
use crate::usecase::validate::validate_history;
use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "url-editor", author, version, about)]
struct Cli {
    /// Directory holding the URL history (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Optional path to a config file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write history events to stdout as NDJSON
    #[arg(long, global = true)]
    emit_events: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a URL into domain, path and query parameters (JSON on stdout)
    Parse { url: String },

    /// Assemble a URL from a domain, a path and `key=value` parameters
    Rebuild {
        #[arg(long)]
        domain: String,
        #[arg(long, default_value = "")]
        path: String,
        /// Repeatable; later occurrences of a key win
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<ParamRow>,
    },

    /// Manage the saved URL history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Parse, normalize and save a URL
    Add { url: String },

    /// Put a saved URL back into the editor and print its fields as JSON
    Load { id: String },

    /// List saved URLs
    List {
        #[arg(long)]
        tag: Option<String>,
        /// Case-insensitive search across id, url, label and tags
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Set the label of a saved URL
    Label { id: String, label: String },

    /// Replace the tags of a saved URL (comma separated)
    Tag { id: String, tags: String },

    /// Delete a saved URL
    Delete { id: String },

    /// Print every tag in use
    Tags,

    /// Write the whole history to a JSON file
    Export {
        #[arg(long = "out", alias = "output")]
        output: Option<String>,
        /// Required to overwrite an existing file; the old file is copied aside first
        #[arg(long)]
        backup: bool,
    },

    /// Load a JSON file, replacing the history unless --merge is given
    Import {
        #[arg(long = "in", alias = "input")]
        input: String,
        #[arg(long)]
        merge: bool,
    },

    /// Check an exported history file
    Validate {
        #[arg(long = "in", alias = "input")]
        input: String,
    },
}

fn parse_param(raw: &str) -> Result<ParamRow, String> {
    match raw.split_once('=') {
        Some((key, value)) => Ok(ParamRow::new(key, value)),
        None => Ok(ParamRow::new(raw, "")),
    }
}

pub async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    run_with_args(&args).await
}

pub async fn run_with_args(args: &[String]) -> Result<()> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Command::Parse { url } => {
            let handle = validate(&url)?;
            let parsed = parse(&handle);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }

        Command::Rebuild {
            domain,
            path,
            params,
        } => {
            let rebuilt = rebuild(&domain, &path, &params)?;
            if rebuilt.has_duplicates() {
                eprintln!(
                    "warning: duplicate parameter keys, last value kept: {}",
                    rebuilt.duplicate_keys.join(", ")
                );
            }
            println!("{}", rebuilt.url);
            Ok(())
        }

        Command::History(cmd) => {
            let config = load_config(cli.config.as_deref())?;
            let data_dir = match cli.data_dir {
                Some(dir) => dir,
                None => config.resolve_data_dir()?,
            };

            let (tx, printer) = if cli.emit_events {
                let (tx, rx) = mpsc::unbounded_channel::<HistoryEvent>();
                (Some(tx), Some(spawn_ndjson_printer(rx)))
            } else {
                (None, None)
            };

            let mut store = HistoryStore::load_with(
                FileKeyValueStore::new(&data_dir),
                Box::new(UuidIdGenerator),
                &config.storage_key,
                tx,
            );

            let result = run_history(cmd, &mut store, &config).await;

            // Dropping the store closes the event channel so the printer can finish.
            drop(store);
            if let Some(handle) = printer {
                handle.await.ok();
            }
            result
        }
    }
}

async fn run_history(
    cmd: HistoryCommand,
    store: &mut HistoryStore<FileKeyValueStore>,
    config: &Config,
) -> Result<()> {
    match cmd {
        HistoryCommand::Add { url } => {
            let mut session = EditorSession::new();
            session
                .on_parse(&url)
                .with_context(|| format!("parsing url: {url}"))?;
            if let Some(keys) = session.duplicate_warning() {
                eprintln!("warning: duplicate parameter keys, last value kept: {keys}");
            }

            let Some(rebuilt) = session.rebuilt_url().map(str::to_string) else {
                return Err(anyhow!("no URL could be rebuilt from {url}; nothing saved"));
            };

            match session.on_save(store)? {
                Some(record) => {
                    println!("{}", record.id);
                    eprintln!("added: {}", record.url);
                }
                None => eprintln!("already in history: {rebuilt}"),
            }
            Ok(())
        }

        HistoryCommand::Load { id } => {
            let record = store
                .get(&id)
                .ok_or_else(|| anyhow!("no record with id {id}"))?;
            let mut session = EditorSession::new();
            session
                .load_url(&record.url)
                .with_context(|| format!("stored url does not parse: {}", record.url))?;

            let params: Vec<serde_json::Value> = session
                .rows()
                .iter()
                .map(|r| json!({"key": r.key, "value": r.value}))
                .collect();
            let fields = json!({
                "id": record.id,
                "domain": session.domain(),
                "path": session.path(),
                "params": params,
                "url": session.rebuilt_url(),
            });
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }

        HistoryCommand::List { tag, search, json } => {
            let filter = ListFilter {
                tag,
                search_term: search,
            };
            let records = store.list(&filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for r in records.iter() {
                    println!("{}\t{}\t{}\t{}", r.id, r.url, r.label, r.tags.join(", "));
                }
            }

            let stats = store.stats();
            eprintln!(
                "summary: records={} shown={} labeled={} tagged={} distinct_tags={}",
                stats.records,
                records.len(),
                stats.labeled,
                stats.tagged,
                stats.distinct_tags
            );
            Ok(())
        }

        HistoryCommand::Label { id, label } => {
            update(store, &id, RecordField::Label(label))
        }

        HistoryCommand::Tag { id, tags } => {
            update(store, &id, RecordField::Tags(parse_tags(&tags)))
        }

        HistoryCommand::Delete { id } => {
            if store.delete(&id)? {
                eprintln!("deleted: {id}");
            } else {
                eprintln!("no record with id {id}");
            }
            Ok(())
        }

        HistoryCommand::Tags => {
            for tag in store.tags() {
                println!("{tag}");
            }
            Ok(())
        }

        HistoryCommand::Export { output, backup } => {
            let output = output.unwrap_or_else(|| config.export_file_name.clone());
            if Path::new(&output).exists() {
                if !backup {
                    return Err(anyhow!(
                        "refusing to overwrite existing file without --backup: {output}"
                    ));
                }
                create_timestamped_backup(Path::new(&output))
                    .with_context(|| format!("creating backup for: {output}"))?;
            }

            let doc = store.export_all();
            write_history_file(&output, &doc)
                .await
                .with_context(|| format!("writing export file: {output}"))?;
            eprintln!("exported {} records to {output}", doc.urls.len());
            Ok(())
        }

        HistoryCommand::Import { input, merge } => {
            let mode = if merge {
                ImportMode::Merge
            } else {
                ImportMode::Replace
            };
            let raw = read_import_file(&input)
                .await
                .with_context(|| format!("reading import file: {input}"))?;
            let summary = store
                .import_str(&raw, mode)
                .with_context(|| format!("importing: {input}"))?;
            if summary.skipped > 0 {
                eprintln!(
                    "warning: skipped {} entries that are not URL records",
                    summary.skipped
                );
            }
            eprintln!(
                "imported {} records (total {})",
                summary.imported,
                store.len()
            );
            Ok(())
        }

        HistoryCommand::Validate { input } => {
            let value = read_json_file(&input)
                .await
                .with_context(|| format!("reading history JSON: {input}"))?;
            let report =
                validate_history(&value).with_context(|| format!("validating history: {input}"))?;

            eprintln!("schema validation passed");
            for url in &report.repeated_urls {
                eprintln!("note: url stored more than once: {url}");
            }
            for url in &report.unparsable_urls {
                eprintln!("note: url does not parse: {url}");
            }
            eprintln!("ok: {} records validated", report.records);
            Ok(())
        }
    }
}

fn update(
    store: &mut HistoryStore<FileKeyValueStore>,
    id: &str,
    field: RecordField,
) -> Result<()> {
    let name = field.name();
    if !store.update_field(id, field)? {
        return Err(anyhow!("no record with id {id}"));
    }
    eprintln!("updated {name}: {id}");
    Ok(())
}

fn create_timestamped_backup(input: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("file name is not valid UTF-8"))?;

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let backup_name = format!("{file_name}.bak.{ts}");
    let backup_path = input.with_file_name(backup_name);
    std::fs::copy(input, &backup_path).with_context(|| format!("copying {file_name} to backup"))?;
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::HistoryDocument;
    use tempfile::tempdir;

    fn args(parts: &[&str]) -> Vec<String> {
        std::iter::once("bin")
            .chain(parts.iter().copied())
            .map(String::from)
            .collect()
    }

    fn history_args(dir: &Path, parts: &[&str]) -> Vec<String> {
        let mut v = args(&["--data-dir", dir.to_str().unwrap(), "history"]);
        v.extend(parts.iter().map(|s| s.to_string()));
        v
    }

    fn stored(dir: &Path) -> HistoryDocument {
        let raw = std::fs::read_to_string(dir.join("urlHistory.json")).expect("read store");
        serde_json::from_str(&raw).expect("decode store")
    }

    #[test]
    fn parse_rejects_unknown_arg() {
        let err = Cli::try_parse_from(args(&["history", "list", "--wat"]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("--wat"));
        assert!(err.contains("Usage"));
    }

    #[test]
    fn parse_requires_import_input() {
        let err = Cli::try_parse_from(args(&["history", "import"]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("--in"));
    }

    #[test]
    fn parse_collects_repeated_params() {
        let cli = Cli::try_parse_from(args(&[
            "rebuild", "--domain", "example.com", "--param", "a=1", "--param", "b", "--param", "a=x=y",
        ]))
        .expect("parse");

        match cli.command {
            Command::Rebuild {
                domain,
                path,
                params,
            } => {
                assert_eq!(domain, "example.com");
                assert_eq!(path, "");
                assert_eq!(
                    params,
                    vec![
                        ParamRow::new("a", "1"),
                        ParamRow::new("b", ""),
                        ParamRow::new("a", "x=y"),
                    ]
                );
            }
            other => panic!("expected rebuild, got {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(args(&["history", "tags", "--emit-events", "--data-dir", "/tmp/x"]))
            .expect("parse");
        assert!(cli.emit_events);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Command::History(HistoryCommand::Tags)));
    }

    #[tokio::test]
    async fn help_is_not_an_error() {
        run_with_args(&args(&["--help"])).await.expect("help");
    }

    #[tokio::test]
    async fn parse_command_rejects_relative_url() {
        let err = run_with_args(&args(&["parse", "example.com"])).await.unwrap_err();
        assert!(err.to_string().contains("not an absolute URL"));
    }

    #[tokio::test]
    async fn rebuild_command_rejects_invalid_base() {
        assert!(run_with_args(&args(&["rebuild", "--domain", " "])).await.is_err());
        run_with_args(&args(&["rebuild", "--domain", "example.com", "--path", "/"]))
            .await
            .expect("rebuild");
    }

    #[tokio::test]
    async fn history_add_label_tag_delete_round() {
        let dir = tempdir().expect("tempdir");

        run_with_args(&history_args(dir.path(), &["add", " https://test.dev/?b=2&a=1 "]))
            .await
            .expect("add");
        run_with_args(&history_args(dir.path(), &["add", "https://test.dev/?b=2&a=1"]))
            .await
            .expect("add again");

        let doc = stored(dir.path());
        assert_eq!(doc.urls.len(), 1);
        assert_eq!(doc.urls[0].url, "https://test.dev/?b=2&a=1");
        let id = doc.urls[0].id.clone();

        run_with_args(&history_args(dir.path(), &["label", &id, "Test"]))
            .await
            .expect("label");
        run_with_args(&history_args(dir.path(), &["tag", &id, "ai, tool"]))
            .await
            .expect("tag");

        let doc = stored(dir.path());
        assert_eq!(doc.urls[0].label, "Test");
        assert_eq!(doc.urls[0].tags, vec!["ai", "tool"]);

        let err = run_with_args(&history_args(dir.path(), &["label", "missing", "x"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no record with id"));

        run_with_args(&history_args(dir.path(), &["delete", &id]))
            .await
            .expect("delete");
        assert!(stored(dir.path()).urls.is_empty());
    }

    #[tokio::test]
    async fn add_reports_when_nothing_can_be_rebuilt() {
        let dir = tempdir().expect("tempdir");
        let err = run_with_args(&history_args(dir.path(), &["add", "file:///"]))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("nothing saved"), "unexpected error: {err}");
        assert!(!dir.path().join("urlHistory.json").exists());
    }

    #[tokio::test]
    async fn load_puts_a_saved_url_back_into_the_editor() {
        let dir = tempdir().expect("tempdir");
        run_with_args(&history_args(dir.path(), &["add", "http://localhost:8080/api?x=1"]))
            .await
            .expect("add");
        let id = stored(dir.path()).urls[0].id.clone();

        run_with_args(&history_args(dir.path(), &["load", &id]))
            .await
            .expect("load");

        let err = run_with_args(&history_args(dir.path(), &["load", "missing"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no record with id"));
    }

    #[tokio::test]
    async fn import_skips_entries_that_are_not_records() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("in.json");
        std::fs::write(&file, r#"{"urls": [42, "https://a.com", {"url": "https://b.com", "tags": "ai"}]}"#)
            .expect("write");

        run_with_args(&history_args(dir.path(), &["import", "--in", file.to_str().unwrap()]))
            .await
            .expect("import");

        let doc = stored(dir.path());
        assert_eq!(doc.urls.len(), 1);
        assert_eq!(doc.urls[0].url, "https://a.com");
    }

    #[tokio::test]
    async fn export_refuses_overwrite_without_backup() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("url-editor-data.json");
        std::fs::write(&out, "{}").expect("seed");
        let out = out.to_str().unwrap();

        let err = run_with_args(&history_args(dir.path(), &["export", "--out", out]))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("--backup"));

        run_with_args(&history_args(dir.path(), &["export", "--out", out, "--backup"]))
            .await
            .expect("export");

        let mut found_backup = false;
        for entry in std::fs::read_dir(dir.path()).expect("read_dir") {
            let entry = entry.expect("entry");
            let name = entry.file_name();
            if name.to_string_lossy().starts_with("url-editor-data.json.bak.") {
                found_backup = true;
            }
        }
        assert!(found_backup);

        let exported: HistoryDocument =
            serde_json::from_str(&std::fs::read_to_string(out).expect("read")).expect("decode");
        assert!(exported.urls.is_empty());
    }

    #[tokio::test]
    async fn import_bad_shape_leaves_history_untouched() {
        let dir = tempdir().expect("tempdir");
        run_with_args(&history_args(dir.path(), &["add", "https://keep.me"]))
            .await
            .expect("add");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"foo": []}"#).expect("write");
        let err = run_with_args(&history_args(dir.path(), &["import", "--in", bad.to_str().unwrap()]))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("wrong shape"));

        let doc = stored(dir.path());
        assert_eq!(doc.urls.len(), 1);
        assert_eq!(doc.urls[0].url, "https://keep.me");
    }

    #[tokio::test]
    async fn validate_command_checks_exported_file() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("export.json");
        std::fs::write(
            &file,
            r#"{"urls":[{"id":"1","url":"https://a.com","label":"","tags":[]}]}"#,
        )
        .expect("write");

        run_with_args(&history_args(dir.path(), &["validate", "--in", file.to_str().unwrap()]))
            .await
            .expect("validate");

        std::fs::write(&file, r#"["https://a.com"]"#).expect("write");
        assert!(
            run_with_args(&history_args(dir.path(), &["validate", "--in", file.to_str().unwrap()]))
                .await
                .is_err()
        );
    }
}
