use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pickfield_core::{
    AppConfig, Catalog, CatalogSearch, MatchMode, ReplayReport, ReplayScript, SearchTransport,
    SelectionChange,
};
use pickfield_tui::app::App;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pickfield",
    about = "Search-driven selection fields, headless or in the terminal",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting PICKFIELD_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded interaction script and print the resulting form data.
    Replay { file: PathBuf },

    /// Search the catalog the fields query.
    Search {
        query: String,
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Fuzzy matching instead of substring matching.
        #[arg(long)]
        fuzzy: bool,
        /// Id of an assigned entry to include anyway.
        #[arg(long)]
        allow: Option<String>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the effective config as TOML.
    Show,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("PICKFIELD_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;
    init_logging(&config, cli.command.is_none())?;
    debug!(path = %AppConfig::config_path().display(), "config loaded");

    match cli.command {
        None => {
            let mut app = App::from_config(config)?;
            pickfield_tui::run_tui(&mut app)?;
        }

        Some(Commands::Replay { file }) => {
            let report = run_replay(&file, &config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": report,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Form data:");
                if report.form.is_empty() {
                    println!("  (no named inputs)");
                }
                for (name, values) in report.form.iter() {
                    println!("  {name} = {values:?}");
                }
                println!("Events:");
                for event in &report.events {
                    let detail = match &event.change {
                        SelectionChange::Committed { item } => {
                            format!("committed {} ({})", item.display_name, item.id)
                        }
                        SelectionChange::Cleared => "cleared".to_string(),
                        SelectionChange::Added { item } => {
                            format!("added {} ({})", item.display_name, item.id)
                        }
                        SelectionChange::Removed { id } => format!("removed {id}"),
                    };
                    println!("  {}: {detail}", event.key);
                }
                println!("Active fields: {}", report.controllers);
                if !report.skipped.is_empty() {
                    println!("Skipped steps: {:?}", report.skipped);
                }
            }
        }

        Some(Commands::Search { query, limit, fuzzy, allow }) => {
            let catalog = Catalog::from_config(&config.search)?;
            let mut search = CatalogSearch::new(catalog, &config.search, &config.field)
                .with_max_results(limit);
            if fuzzy {
                search = search.with_mode(MatchMode::Fuzzy);
            }
            if let Some(id) = allow {
                search = search.allowing(id);
            }
            let results = search.search(&query);
            let dur = start.elapsed().as_millis();
            info!(
                query = %query,
                hits = results.len(),
                duration_ms = dur as u64,
                "search finished"
            );

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": results, "total": results.len(), "query": query },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if results.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {} results:", results.len());
                for item in &results {
                    println!(
                        "  {:>4}  {:<24}  {}",
                        item.id, item.display_name, item.secondary_label
                    );
                }
            }
        }

        Some(Commands::Config { action }) => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Path => {
                    let path = AppConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": path, "exists": path.exists() },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": config,
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&config)?);
                    }
                }
            }
        }

        Some(Commands::Version) => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "version": version },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("pickfield v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `RUST_LOG` wins over `[logging].level`. The TUI owns the terminal, so it
/// logs to a file; everything else logs to stderr.
fn init_logging(config: &AppConfig, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if tui {
        let path = config.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn run_replay(file: &Path, config: &AppConfig) -> Result<ReplayReport> {
    let script = ReplayScript::load(file)
        .with_context(|| format!("failed to load replay script {}", file.display()))?;
    let report = script.run(config)?;
    info!(
        file = %file.display(),
        events = report.events.len(),
        skipped = report.skipped.len(),
        "replay finished"
    );
    Ok(report)
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_launches_tui() {
        let cli = Cli::try_parse_from(["pickfield"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::try_parse_from([
            "pickfield", "search", "ana", "--limit", "5", "--fuzzy", "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Search { query, limit, fuzzy, allow }) => {
                assert_eq!(query, "ana");
                assert_eq!(limit, 5);
                assert!(fuzzy);
                assert!(allow.is_none());
            }
            _ => panic!("expected search"),
        }
        assert!(cli.json);
    }

    #[test]
    fn test_replay_takes_a_path() {
        let cli = Cli::try_parse_from(["pickfield", "replay", "demos/new-caravan.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Replay { file }) if file == PathBuf::from("demos/new-caravan.json")
        ));
    }

    #[test]
    fn test_run_replay_on_bundled_demo() {
        let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/new-caravan.json");
        let report = run_replay(&file, &AppConfig::default()).unwrap();
        assert_eq!(report.form.get("coordenador"), &["2".to_string()]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_run_replay_reports_missing_file() {
        let err = run_replay(Path::new("no/such/script.json"), &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("failed to load replay script"));
    }

    #[test]
    fn test_config_requires_action() {
        assert!(Cli::try_parse_from(["pickfield", "config"]).is_err());
        assert!(Cli::try_parse_from(["pickfield", "config", "show"]).is_ok());
    }
}
