//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_storage::FileStorage;
use crate::adapters::memory_storage::MemoryStorage;
use crate::domain::action::list_actions;
use crate::domain::condition::{list_conditions, LOGICAL_OPERATORS};
use crate::domain::config::{StorageBackend, StoreConfig};
use crate::domain::error::KumoError;
use crate::domain::metrics::{BacktestMetrics, BacktestResult};
use crate::domain::store::StrategyStore;
use crate::domain::strategy::Strategy;
use crate::domain::stored_strategy::{StoredStrategy, StrategyPatch, StrategyStatus};
use crate::ports::storage_port::StoragePort;

pub type DynStore = StrategyStore<Box<dyn StoragePort>>;

#[derive(Parser, Debug)]
#[command(name = "kumo", about = "Trading strategy store")]
pub struct Cli {
    /// INI file with [storage] and [logging] sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stored strategies
    List {
        #[arg(long)]
        status: Option<StrategyStatus>,
    },
    /// Print one strategy as JSON
    Show { id: u64 },
    /// Import a strategy document from a JSON file
    Import { file: PathBuf },
    /// Export one strategy as pretty JSON
    Export {
        id: u64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Copy a strategy under a new id
    Duplicate { id: u64 },
    /// Change the lifecycle status of a strategy
    Status { id: u64, status: StrategyStatus },
    /// Merge a JSON patch into a strategy
    Update { id: u64, patch: PathBuf },
    /// Attach backtest metrics (or a full backtest result) from a JSON file
    AttachMetrics { id: u64, file: PathBuf },
    /// Delete a strategy
    Delete { id: u64 },
    /// Validate a strategy document without storing it
    Validate { file: PathBuf },
    /// Print the resolved values of every risk module
    Resolve { id: u64 },
    /// List rule conditions and logical operators
    Conditions,
    /// List actions and their parameters
    Actions,
    /// Remove every stored strategy
    Clear,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_store_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    init_logging(&config.log_level);

    let result = match cli.command {
        Command::Conditions => {
            print_conditions();
            Ok(())
        }
        Command::Actions => {
            print_actions();
            Ok(())
        }
        Command::Validate { file } => run_validate(&file),
        command => open_store(&config).and_then(|store| dispatch(&store, command)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Read the store configuration, falling back to defaults when no file is given.
pub fn load_store_config(path: Option<&Path>) -> Result<StoreConfig, KumoError> {
    match path {
        Some(p) => {
            let adapter = FileConfigAdapter::from_file(p)?;
            StoreConfig::from_config(&adapter)
        }
        None => Ok(StoreConfig::default()),
    }
}

pub fn open_storage(config: &StoreConfig) -> Result<Box<dyn StoragePort>, KumoError> {
    debug!(backend = ?config.backend, path = %config.path.display(), "opening storage");
    match config.backend {
        StorageBackend::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageBackend::File => Ok(Box::new(FileStorage::new(&config.path))),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            use crate::adapters::sqlite_storage::SqliteStorage;
            Ok(Box::new(SqliteStorage::open(&config.path, config.pool_size)?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => Err(KumoError::ConfigInvalid {
            section: "storage".to_string(),
            key: "backend".to_string(),
            reason: "sqlite backend requires the 'sqlite' feature".to_string(),
        }),
    }
}

pub fn open_store(config: &StoreConfig) -> Result<DynStore, KumoError> {
    Ok(StrategyStore::new(open_storage(config)?))
}

// RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch(store: &DynStore, command: Command) -> Result<(), KumoError> {
    match command {
        Command::List { status } => {
            let strategies = match status {
                Some(s) => store.find_by_status(s),
                None => store.load()?,
            };
            print_list(&strategies);
            Ok(())
        }
        Command::Show { id } => {
            println!("{}", store.export_to_text(id)?);
            Ok(())
        }
        Command::Import { file } => {
            let text = fs::read_to_string(&file)?;
            let record = store.import_from_text(&text)?;
            eprintln!("Imported '{}' as {}", record.name(), record.id);
            println!("{}", record.id);
            Ok(())
        }
        Command::Export { id, output } => {
            let text = store.export_to_text(id)?;
            match output {
                Some(path) => {
                    fs::write(&path, text)?;
                    eprintln!("Exported {} to {}", id, path.display());
                }
                None => println!("{text}"),
            }
            Ok(())
        }
        Command::Duplicate { id } => {
            let copy = store.duplicate(id)?;
            eprintln!("Duplicated {} as '{}'", id, copy.name());
            println!("{}", copy.id);
            Ok(())
        }
        Command::Status { id, status } => {
            let record = store.set_status(id, status)?;
            eprintln!("{} is now {}", record.id, record.status);
            Ok(())
        }
        Command::Update { id, patch: path } => {
            let text = fs::read_to_string(&path)?;
            let patch: StrategyPatch = serde_json::from_str(&text).map_err(|e| KumoError::Import {
                reason: format!("{}: {e}", path.display()),
            })?;
            let record = store.update(id, patch)?;
            eprintln!("Updated {} at {}", record.id, record.updated_at);
            Ok(())
        }
        Command::AttachMetrics { id, file } => {
            let text = fs::read_to_string(&file)?;
            let record = match parse_metrics_payload(&text)? {
                MetricsPayload::Result(result) => store.attach_result(id, &result)?,
                MetricsPayload::Metrics(metrics) => store.attach_metrics(id, metrics)?,
            };
            eprintln!("Attached metrics to {}", record.id);
            Ok(())
        }
        Command::Delete { id } => {
            if !store.remove(id)? {
                return Err(KumoError::NotFound { id });
            }
            eprintln!("Deleted {id}");
            Ok(())
        }
        Command::Resolve { id } => {
            let record = store.get_by_id(id).ok_or(KumoError::NotFound { id })?;
            print_resolved(&record)
        }
        Command::Clear => store.clear(),
        Command::Conditions | Command::Actions | Command::Validate { .. } => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MetricsPayload {
    Result(Box<BacktestResult>),
    Metrics(BacktestMetrics),
}

/// Accepts either a full backtest result or a bare metrics object.
pub fn parse_metrics_payload(text: &str) -> Result<MetricsPayload, KumoError> {
    serde_json::from_str(text).map_err(|e| KumoError::Import {
        reason: format!("not a backtest result or metrics object: {e}"),
    })
}

fn run_validate(path: &Path) -> Result<(), KumoError> {
    eprintln!("Validating strategy: {}", path.display());
    let text = fs::read_to_string(path)?;
    let strategy: Strategy = serde_json::from_str(&text).map_err(|e| KumoError::Import {
        reason: e.to_string(),
    })?;

    let errors = strategy.validate();
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let refs = strategy.variable_references();
    eprintln!("  Name:      {}", strategy.name);
    eprintln!("  Timeframe: {}", strategy.timeframe);
    eprintln!(
        "  Blocks:    {} entry, {} exit",
        strategy.entry_blocks.len(),
        strategy.exit_blocks.len()
    );
    if !refs.is_empty() {
        let names: Vec<&str> = refs.iter().map(String::as_str).collect();
        eprintln!("  Variables: {}", names.join(", "));
    }
    eprintln!("\nStrategy is valid.");
    Ok(())
}

fn print_list(strategies: &[StoredStrategy]) {
    if strategies.is_empty() {
        eprintln!("No strategies stored");
        return;
    }
    println!("{:<15} {:<10} {:<6} {:>8}  {}", "ID", "STATUS", "TF", "WIN %", "NAME");
    for s in strategies {
        let win_rate = s
            .backtest_metrics
            .as_ref()
            .map(|m| format!("{:.1}", m.win_rate))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<15} {:<10} {:<6} {:>8}  {}",
            s.id,
            s.status,
            s.strategy.timeframe,
            win_rate,
            s.name()
        );
    }
}

fn print_resolved(record: &StoredStrategy) -> Result<(), KumoError> {
    let strategy = &record.strategy;
    let modules = strategy.risk_modules();
    if modules.is_empty() {
        eprintln!("No risk modules configured");
        return Ok(());
    }
    for module in modules {
        match module.resolve(&strategy.variables)? {
            None => println!("{}: disabled", module.key()),
            Some(fields) => {
                let unit = module.unit().map(|u| format!(" {u}")).unwrap_or_default();
                for f in fields {
                    println!("{}.{} = {}{}", module.key(), f.field, f.value, unit);
                }
            }
        }
    }
    Ok(())
}

fn print_conditions() {
    for c in list_conditions() {
        println!("{:<18} {}  {}", c.value, c.symbol, c.label);
    }
    println!();
    for op in LOGICAL_OPERATORS {
        println!("{:<18} {}", op.label, op.symbol);
    }
}

fn print_actions() {
    for action in list_actions() {
        println!("{:<16} {}", action.value, action.label);
        for p in action.parameters {
            let required = if p.required { " (required)" } else { "" };
            println!("    {:<12} {}{}", p.key, p.label, required);
        }
    }
}
