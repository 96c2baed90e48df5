//! Structured JSONL logging for a tagging session.
//!
//! Every record carries a timestamp, run id and sequence number so a game's
//! tagging history can be replayed and audited after the fact. Records are
//! routed by level and domain into one run directory:
//!
//! - `events.jsonl`  INFO and above
//! - `trace.jsonl`   TRACE and DEBUG
//! - `metrics.jsonl` anything in the metrics domain
//!
//! Environment: `LOG_LEVEL`, `LOG_DOMAINS`, `LOG_DIR`, `RUN_ID`, `LOG_STDOUT`.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::events::Event;
use crate::metrics::MetricsTable;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Playbook, // Play additions and rejections
    Tag,      // Tagged possessions
    Metrics,  // Derived tables
    Session,  // Context changes, resets
    System,   // Startup, shutdown
    Profile,  // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Playbook => "playbook",
            Domain::Tag => "tag",
            Domain::Metrics => "metrics",
            Domain::Session => "session",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

type Sink = Option<Mutex<BufWriter<File>>>;

#[derive(Debug)]
struct RunContext {
    run_id: String,
    dir: PathBuf,
    echo: bool,
    events: Sink,
    trace: Sink,
    metrics: Sink,
}

fn open_sink(path: PathBuf) -> Sink {
    match File::create(&path) {
        Ok(file) => Some(Mutex::new(BufWriter::new(file))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn open_run_context(base: PathBuf) -> RunContext {
    let run_id = std::env::var("RUN_ID")
        .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
    let echo = matches!(std::env::var("LOG_STDOUT").as_deref(), Ok("1") | Ok("true"));
    let mut run_dir = base;
    run_dir.push(&run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
    }

    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );

    RunContext {
        events: open_sink(run_dir.join("events.jsonl")),
        trace: open_sink(run_dir.join("trace.jsonl")),
        metrics: open_sink(run_dir.join("metrics.jsonl")),
        dir: run_dir,
        run_id,
        echo,
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        open_run_context(PathBuf::from(base))
    })
}

/// Route this process's log files under `base` instead of `LOG_DIR`.
///
/// Only the first call before any record is emitted takes effect; returns
/// whether it did.
pub fn init_log_dir(base: &Path) -> bool {
    let mut installed = false;
    RUN_CONTEXT.get_or_init(|| {
        installed = true;
        open_run_context(base.to_path_buf())
    });
    installed
}

/// Directory holding this run's log files.
pub fn run_dir() -> &'static Path {
    &ensure_run_context().dir
}

fn write_line(sink: &Sink, line: &str) {
    if let Some(Ok(mut w)) = sink.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["play", "opponent", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Local::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain, event, fields);
}

fn build_record(
    run_id: &str,
    seq: u64,
    level: Level,
    domain: Domain,
    event: &str,
    fields: Map<String, Value>,
) -> Value {
    let (mut top, data) = split_fields(fields);
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(seq));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, next_seq(), level, domain, event, fields).to_string();

    if domain == Domain::Metrics {
        write_line(&ctx.metrics, &line);
    }
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    if ctx.echo {
        println!("{}", line);
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_play_added(play: &str, playbook_size: usize) {
    log(
        Level::Info,
        Domain::Playbook,
        "play_added",
        obj(&[("play", v_str(play)), ("playbook_size", json!(playbook_size))]),
    );
}

pub fn log_play_rejected(raw: &str, reason: &str) {
    log(
        Level::Warn,
        Domain::Playbook,
        "play_rejected",
        obj(&[
            ("msg", v_str("play not added")),
            ("play", v_str(raw)),
            ("reason", v_str(reason)),
        ]),
    );
}

pub fn log_tag(event: &Event, log_len: usize, state_hash: &str) {
    log(
        Level::Info,
        Domain::Tag,
        "tag",
        obj(&[
            ("play", v_str(&event.play)),
            ("opponent", v_str(&event.opponent)),
            ("game_date", v_str(&event.game_date.to_string())),
            ("quarter", v_str(event.quarter.as_str())),
            ("result", v_str(event.result.as_str())),
            ("points", json!(event.points)),
            ("log_len", json!(log_len)),
            ("state_hash", v_str(state_hash)),
        ]),
    );
}

pub fn log_unknown_play(play: &str) {
    log(
        Level::Warn,
        Domain::Tag,
        "unknown_play",
        obj(&[
            ("msg", v_str("tagged play is not in the playbook")),
            ("play", v_str(play)),
        ]),
    );
}

pub fn log_reset(cleared: usize, playbook_size: usize) {
    log(
        Level::Info,
        Domain::Session,
        "reset",
        obj(&[
            ("cleared_events", json!(cleared)),
            ("playbook_size", json!(playbook_size)),
        ]),
    );
}

pub fn log_metrics(table: &MetricsTable) {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|r| {
            json!({
                "play": r.play,
                "attempts": r.attempts,
                "ppp": r.ppp,
                "frequency": r.frequency,
            })
        })
        .collect();

    log(
        Level::Debug,
        Domain::Metrics,
        "metrics.table",
        obj(&[
            ("plays", json!(table.len())),
            ("total_attempts", json!(table.total_attempts())),
            ("rows", Value::Array(rows)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits a timing record on drop.
pub struct ProfileScope {
    label: &'static str,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        log(
            Level::Trace,
            Domain::Profile,
            "profile",
            obj(&[("label", v_str(self.label)), ("elapsed_ms", v_num(elapsed_ms))]),
        );
    }
}

// =============================================================================
// Tests
// =============================================================================

/// Sends this test binary's logs to a temporary directory.
#[cfg(test)]
pub(crate) fn use_temp_log_dir() -> &'static Path {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    let dir = DIR.get_or_init(|| tempfile::tempdir().expect("temp log dir"));
    init_log_dir(dir.path());
    dir.path()
}
