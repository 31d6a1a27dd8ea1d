use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Running LLM counters. Only a fully parsed response moves them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub total_api_calls: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub model_used: Option<String>,
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        }
    }
}

impl RateTable {
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / TOKENS_PER_MILLION) * self.input_per_mtok
            + (output_tokens as f64 / TOKENS_PER_MILLION) * self.output_per_mtok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub api_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: Option<String>,
    pub estimated_cost_usd: f64,
}

/// Shared usage counters. Clones observe and update the same totals.
#[derive(Clone)]
pub struct UsageTracker {
    shared: Arc<UsageShared>,
    rates: RateTable,
}

struct UsageShared {
    inner: Mutex<UsageRecord>,
    persistence: UsagePersistence,
}

impl UsageTracker {
    /// Counters that also append a JSON line to `path` on every change.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::with_path(Some(path.into()))
    }

    pub fn ephemeral() -> Self {
        Self::with_path(None)
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            shared: Arc::new(UsageShared {
                inner: Mutex::new(UsageRecord::default()),
                persistence: UsagePersistence { path },
            }),
            rates: RateTable::default(),
        }
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    pub fn rates(&self) -> RateTable {
        self.rates
    }

    pub fn record(&self, input_tokens: u64, output_tokens: u64, model: &str) {
        let mut guard = self.shared.inner.lock();
        guard.total_api_calls = guard.total_api_calls.saturating_add(1);
        guard.total_input_tokens = guard.total_input_tokens.saturating_add(input_tokens);
        guard.total_output_tokens = guard.total_output_tokens.saturating_add(output_tokens);
        if !model.is_empty() {
            guard.model_used = Some(model.to_string());
        }
        // Written under the lock so ledger lines keep the order of updates.
        self.shared.persistence.write_snapshot(LedgerEvent::Record, &guard);
    }

    /// Zeroes every counter. Nothing else ever does.
    pub fn reset(&self) {
        let mut guard = self.shared.inner.lock();
        *guard = UsageRecord::default();
        self.shared.persistence.write_snapshot(LedgerEvent::Reset, &guard);
    }

    pub fn snapshot(&self) -> UsageRecord {
        self.shared.inner.lock().clone()
    }

    pub fn estimated_cost(&self) -> f64 {
        let guard = self.shared.inner.lock();
        self.rates
            .cost(guard.total_input_tokens, guard.total_output_tokens)
    }

    pub fn stats(&self) -> UsageStats {
        let record = self.snapshot();
        UsageStats {
            api_calls: record.total_api_calls,
            input_tokens: record.total_input_tokens,
            output_tokens: record.total_output_tokens,
            estimated_cost_usd: self
                .rates
                .cost(record.total_input_tokens, record.total_output_tokens),
            model: record.model_used,
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::ephemeral()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum LedgerEvent {
    Record,
    Reset,
}

#[derive(Serialize)]
struct LedgerLine<'a> {
    captured_at: u64,
    event: LedgerEvent,
    #[serde(flatten)]
    record: &'a UsageRecord,
}

struct UsagePersistence {
    path: Option<PathBuf>,
}

impl UsagePersistence {
    fn write_snapshot(&self, event: LedgerEvent, record: &UsageRecord) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(error = %err, "failed to create usage ledger directory");
                return;
            }
        }
        let line = LedgerLine {
            captured_at: now_ts(),
            event,
            record,
        };
        let mut bytes = match serde_json::to_vec(&line) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to serialize usage snapshot");
                return;
            }
        };
        bytes.push(b'\n');
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(mut file) => {
                if let Err(err) = file.write_all(&bytes) {
                    warn!(error = %err, path = %path.display(), "failed to write usage snapshot");
                }
            }
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to open usage ledger")
            }
        }
    }
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
