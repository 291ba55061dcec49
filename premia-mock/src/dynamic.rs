//! Scriptable candle source driven by a controller handle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use premia_core::{CandleSource, Instrument, PremiaError, RawCandle};

/// Instruction for how `fetch_batch` should behave for one instrument.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return these payloads.
    Return(Vec<RawCandle>),
    /// Fail the whole fetch with this error.
    Fail(PremiaError),
    /// Never complete (simulate a stalled collaborator).
    Hang,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<Instrument, MockBehavior>,
    requests: Vec<Vec<Instrument>>,
}

/// Controller handle used by tests to drive a [`DynamicMockSource`].
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for one instrument.
    pub async fn set_behavior(&self, instrument: Instrument, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(instrument, behavior);
    }

    /// Shorthand for `set_behavior(instrument, MockBehavior::Return(batch))`.
    pub async fn set_batch(&self, instrument: Instrument, batch: Vec<RawCandle>) {
        self.set_behavior(instrument, MockBehavior::Return(batch)).await;
    }

    /// Instrument lists of every `fetch_batch` call so far.
    pub async fn requests(&self) -> Vec<Vec<Instrument>> {
        self.state.lock().await.requests.clone()
    }

    /// Clear all configured behaviors and the request log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.requests.clear();
    }
}

/// Scriptable source. Instruments without a rule yield no records.
pub struct DynamicMockSource {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockSource {
    /// Create a source named `name` plus the controller that scripts it.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Self, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        (
            Self {
                name,
                state: Arc::clone(&state),
            },
            DynamicMockController { state },
        )
    }
}

#[async_trait]
impl CandleSource for DynamicMockSource {
    fn venue_name(&self) -> &str {
        self.name
    }

    async fn fetch_batch(&self, instruments: &[Instrument]) -> Result<Vec<RawCandle>, PremiaError> {
        // Resolve behaviors without holding the lock across the hang.
        let behaviors: Vec<MockBehavior> = {
            let mut guard = self.state.lock().await;
            guard.requests.push(instruments.to_vec());
            let mut keys: Vec<&Instrument> = if instruments.is_empty() {
                guard.rules.keys().collect()
            } else {
                instruments.iter().collect()
            };
            keys.sort();
            keys.iter()
                .filter_map(|i| guard.rules.get(*i).cloned())
                .collect()
        };

        let mut out = Vec::new();
        for b in behaviors {
            match b {
                MockBehavior::Return(batch) => out.extend(batch),
                MockBehavior::Fail(e) => return Err(e),
                MockBehavior::Hang => std::future::pending::<()>().await,
            }
        }
        Ok(out)
    }
}
