// Named log sources. Each component logs through its own `Tracing`, which
// masks secrets, tags the line with the component name and forwards it to
// the `tracing` subscriber installed by `main`.

use crate::secret_masker::SecretMasker;
use chrono::{DateTime, Utc};
use gigscout_sdk::TraceWriter;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceEventType {
    Verbose,
    Information,
    Warning,
    Error,
}

impl fmt::Display for TraceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            TraceEventType::Verbose => "VERB",
            TraceEventType::Information => "INFO",
            TraceEventType::Warning => "WARN",
            TraceEventType::Error => "ERR ",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone)]
pub struct TraceSetting {
    /// Events below this level are dropped before they reach the subscriber.
    pub level: TraceEventType,
    /// Mirror every line to stdout (`GIGSCOUT_PRINT_LOG_TO_STDOUT`).
    pub print_to_stdout: bool,
}

impl Default for TraceSetting {
    fn default() -> Self {
        Self {
            level: TraceEventType::Verbose,
            print_to_stdout: false,
        }
    }
}

/// One component's log source.
#[derive(Clone)]
pub struct Tracing {
    name: Arc<str>,
    secret_masker: Arc<SecretMasker>,
    setting: TraceSetting,
}

impl Tracing {
    pub fn new(name: &str, secret_masker: Arc<SecretMasker>, setting: TraceSetting) -> Self {
        Self {
            name: Arc::from(name),
            secret_masker,
            setting,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Log `err` at error level, including every `context` layer of the chain.
    pub fn error_chain(&self, context: &str, err: &anyhow::Error) {
        self.error(&format!("{}: {:#}", context, err));
    }

    fn emit(&self, level: TraceEventType, message: &str) {
        if level < self.setting.level {
            return;
        }

        let message = self.secret_masker.mask_secrets(message);
        let component = &*self.name;
        match level {
            TraceEventType::Verbose => tracing::debug!(component, "{}", message),
            TraceEventType::Information => tracing::info!(component, "{}", message),
            TraceEventType::Warning => tracing::warn!(component, "{}", message),
            TraceEventType::Error => tracing::error!(component, "{}", message),
        }

        if self.setting.print_to_stdout {
            println!("{}", stdout_line(Utc::now(), component, level, &message));
        }
    }
}

fn stdout_line(at: DateTime<Utc>, component: &str, level: TraceEventType, message: &str) -> String {
    format!(
        "[{}][{}] {}: {}",
        at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        component,
        level,
        message
    )
}

impl TraceWriter for Tracing {
    fn info(&self, message: &str) {
        self.emit(TraceEventType::Information, message);
    }

    fn verbose(&self, message: &str) {
        self.emit(TraceEventType::Verbose, message);
    }

    fn warning(&self, message: &str) {
        self.emit(TraceEventType::Warning, message);
    }

    fn error(&self, message: &str) {
        self.emit(TraceEventType::Error, message);
    }
}

/// Creates `Tracing` sources that share one masker and one setting.
pub struct TraceManager {
    secret_masker: Arc<SecretMasker>,
    setting: TraceSetting,
}

impl TraceManager {
    pub fn with_setting(secret_masker: Arc<SecretMasker>, setting: TraceSetting) -> Self {
        Self {
            secret_masker,
            setting,
        }
    }

    pub fn get(&self, name: &str) -> Tracing {
        Tracing::new(name, self.secret_masker.clone(), self.setting.clone())
    }

    pub fn secret_masker(&self) -> &Arc<SecretMasker> {
        &self.secret_masker
    }
}
