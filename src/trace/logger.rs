use std::{fs::OpenOptions, io::Write, sync::Mutex};

use serde::Serialize;

use crate::graph::assembler::Compilation;
use crate::trace::trace::{CompileSummary, TraceRecord};

/// Appends compile passes to a JSONL trace file.
///
/// Each pass is one `compile` record followed by one `event` record per
/// tolerated anomaly, so a trace shared by several runs can be split back
/// into passes. A pass's lines are written under one lock. Failures to open
/// or write are reported as warnings and never fail the compile.
pub struct EventLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl EventLogger {
    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                tracing::warn!("could not open event log '{}': {}", path, e);
                Self { file: None }
            }
        }
    }

    /// A logger that drops everything.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Record one compile pass of `descriptor`.
    pub fn log_compilation(&self, descriptor: &str, compilation: &Compilation) {
        let Some(file_mutex) = &self.file else {
            return;
        };

        let summary = CompileSummary::of(descriptor, compilation);
        let mut lines = Vec::with_capacity(compilation.events.len() + 1);
        lines.extend(encode(&TraceRecord::Compile(&summary)));
        for event in &compilation.events {
            lines.extend(encode(&TraceRecord::Event(event)));
        }

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("event logger lock poisoned: {}", e);
                return;
            }
        };
        for line in lines {
            if let Err(e) = writeln!(file, "{}", line) {
                tracing::warn!("failed to write trace record: {}", e);
                return;
            }
        }
    }
}

fn encode<T: Serialize>(record: &T) -> Option<String> {
    serde_json::to_string(record)
        .map_err(|e| tracing::warn!("failed to serialize trace record: {}", e))
        .ok()
}
