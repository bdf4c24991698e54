//! CLI command implementations
//!
//! `start` boot sequence (strict order):
//! 1. Configuration load
//! 2. Logger configuration
//! 3. Ledger open (file backends replay the batch log)
//! 4. Serving loop over stdin
//!
//! The serving loop never touches the ledger directly; every line goes
//! through the `App` entry points a consensus engine would use.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::app::{App, QueryResponse, TxResponse};
use crate::config::{BackendKind, Config};
use crate::ledger::Ledger;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::storage::{FileBackend, KvBackend, MemoryBackend};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{encode_base64, parse_request, read_lines, write_error, write_response, DriverRequest};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
        Command::Inspect { config } => inspect(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("chain_id", &config.chain_id), ("data_dir", &config.data_dir)],
    );
    Ok(config)
}

/// Creates the data directory and an empty ledger log.
///
/// Writes no batches: the first block starts from the genesis hash.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if config.backend == BackendKind::Memory {
        return Err(CliError::config_error(
            "init requires the file backend; the memory backend has nothing to initialize",
        ));
    }

    let data_dir = config.data_path();
    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    FileBackend::open(data_dir).map_err(|e| CliError::boot_failed(e.to_string()))?;

    write_response(&mut io::stdout(), json!({"initialized": true}))
}

/// Opens the ledger and serves JSON lines from stdin until EOF.
pub fn start(config_path: &Path) -> CliResult<()> {
    log_event(Event::BootStart);
    let config = load_config(config_path)?;
    let mut app = open_app(&config)?;
    log_event_with_fields(
        Event::BootComplete,
        &[("height", &app.last_checkpoint().height.to_string())],
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    serve(&mut app, stdin.lock(), &mut stdout)
}

/// Prints the last committed checkpoint.
pub fn inspect(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let app = open_app(&config)?;
    let checkpoint = app.last_checkpoint();
    write_response(
        &mut io::stdout(),
        json!({
            "chain_id": app.chain_id(),
            "height": checkpoint.height,
            "state_hash": checkpoint.state_hash_hex(),
        }),
    )
}

pub fn open_app(config: &Config) -> CliResult<App> {
    let backend: Box<dyn KvBackend> = match config.backend {
        BackendKind::File => {
            if !is_initialized(config.data_path()) {
                return Err(CliError::not_initialized());
            }
            Box::new(FileBackend::open(config.data_path()).map_err(boot_failed)?)
        }
        BackendKind::Memory => Box::new(MemoryBackend::new()),
    };

    let ledger = Ledger::open(backend).map_err(boot_failed)?;
    let checkpoint = ledger.last_checkpoint();
    log_event_with_fields(
        Event::LedgerOpened,
        &[
            ("height", &checkpoint.height.to_string()),
            ("state_hash", &checkpoint.state_hash_hex()),
        ],
    );
    Ok(App::new(ledger, config.chain_id.clone()))
}

fn boot_failed(e: crate::storage::StorageError) -> CliError {
    if e.is_fatal() {
        log_event_with_fields(Event::DataCorruption, &[("message", &e.to_string())]);
    }
    CliError::boot_failed(e.to_string())
}

/// Serving loop. Malformed lines get an error response and the loop goes
/// on; an I/O error on either side ends it.
pub fn serve<R: BufRead, W: Write>(app: &mut App, input: R, out: &mut W) -> CliResult<()> {
    for line in read_lines(input) {
        let line = line?;
        match handle_line(app, &line) {
            Ok(data) => write_response(out, data)?,
            Err(e) => write_error(out, e.code_str(), e.message())?,
        }
    }
    Ok(())
}

fn handle_line(app: &mut App, line: &str) -> CliResult<Value> {
    match parse_request(line)? {
        DriverRequest::Check { tx } => {
            let tx = tx.into_transaction()?;
            Ok(render_tx(&app.check(&tx)))
        }
        DriverRequest::Deliver { tx } => {
            let tx = tx.into_transaction()?;
            Ok(render_tx(&app.deliver(&tx)))
        }
        DriverRequest::Commit => {
            let checkpoint = app
                .commit()
                .map_err(|e| CliError::io_error(format!("commit failed: {}", e)))?;
            Ok(json!({
                "height": checkpoint.height,
                "state_hash": checkpoint.state_hash_hex(),
            }))
        }
        DriverRequest::Query { name, params } => {
            let params = serde_json::to_vec(&params)?;
            Ok(render_query(&app.query(&name, &params)))
        }
        DriverRequest::Metrics => Ok(serde_json::to_value(app.metrics().snapshot())?),
    }
}

fn render_tx(resp: &TxResponse) -> Value {
    let mut value = json!({
        "code": resp.code.as_u32(),
        "name": resp.code.name(),
        "message": resp.message,
    });
    if let Some(data) = &resp.data {
        value["data"] = Value::String(encode_base64(data));
    }
    value
}

fn render_query(resp: &QueryResponse) -> Value {
    json!({
        "code": resp.code.as_u32(),
        "name": resp.code.name(),
        "message": resp.message,
        "value": resp.json().unwrap_or(Value::Null),
    })
}

/// A file-backed data directory exists once its ledger log does.
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("state").join("ledger.dat").exists()
}
