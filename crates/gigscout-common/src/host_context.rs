// The application context shared by every long-running component: settings,
// data file resolution, trace creation, and shutdown coordination.

use crate::constants::{self, ShutdownReason, WellKnownDataFile};
use crate::secret_masker::SecretMasker;
use crate::settings::Settings;
use crate::tracing::{TraceManager, TraceSetting, Tracing};

use gigscout_sdk::{StringUtil, TraceWriter};
use parking_lot::Mutex;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct HostContext {
    settings: Settings,

    /// Cancelled once when the process is asked to stop.
    shutdown_token: CancellationToken,

    /// The reason the process is shutting down (set once `shutdown` is called).
    shutdown_reason: Mutex<Option<ShutdownReason>>,

    /// Secret masker shared across every trace source.
    pub secret_masker: Arc<SecretMasker>,

    trace_manager: TraceManager,
}

impl HostContext {
    pub fn new(settings: Settings) -> Arc<Self> {
        let secret_masker = Arc::new(SecretMasker::new());

        if let Some(ref token) = settings.telegram_token {
            secret_masker.add_value(token);
        }

        let print_to_stdout = env::var(constants::env::PRINT_LOG_TO_STDOUT)
            .ok()
            .and_then(|v| StringUtil::convert_to_bool(&v))
            .unwrap_or(false);

        let trace_setting = TraceSetting {
            print_to_stdout,
            ..TraceSetting::default()
        };
        let trace_manager = TraceManager::with_setting(secret_masker.clone(), trace_setting);

        Arc::new(Self {
            settings,
            shutdown_token: CancellationToken::new(),
            shutdown_reason: Mutex::new(None),
            secret_masker,
            trace_manager,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve the path of a well-known data file.
    pub fn data_file(&self, file: WellKnownDataFile) -> PathBuf {
        self.settings.data_file(file)
    }

    /// Get a trace source for the given component name.
    pub fn get_trace(&self, name: &str) -> Tracing {
        self.trace_manager.get(name)
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// The token cancelled on shutdown. Loops select on it between passes.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        *self.shutdown_reason.lock()
    }

    /// Initiate shutdown with the given reason.
    pub fn shutdown(&self, reason: ShutdownReason) {
        let trace = self.get_trace("HostContext");
        trace.info(&format!("gigscout will be shut down for {}", reason));
        *self.shutdown_reason.lock() = Some(reason);
        self.shutdown_token.cancel();
    }

    /// Sleep for `duration` unless shutdown starts first.
    ///
    /// Returns `true` if the full delay elapsed, `false` if cancelled.
    pub async fn delay(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.shutdown_token.cancelled() => false,
        }
    }
}
