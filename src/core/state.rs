//! State Management
//!
//! Anti-CSRF state generation and the single-use state ledger.

use parking_lot::Mutex;
use rand::RngCore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Number of random bytes behind every state value (256 bits).
pub const STATE_BYTES: usize = 32;

/// How long an issued state stays redeemable.
pub const DEFAULT_STATE_MAX_AGE: Duration = Duration::from_secs(600);

/// Generate an unpredictable, URL-safe state value.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// State ledger interface (for dependency injection).
pub trait StateManager: Send + Sync {
    /// Issue a new state value and record it as outstanding.
    fn issue(&self) -> String;

    /// Redeem a state value. Returns `true` exactly once per issued value,
    /// and only while it is younger than the ledger's max age.
    fn consume(&self, state: &str) -> bool;

    /// Drop an outstanding state without redeeming it.
    fn revoke(&self, state: &str);
}

/// In-memory state ledger.
pub struct InMemoryStateManager {
    states: Mutex<HashMap<String, Instant>>,
    max_age: Duration,
}

impl InMemoryStateManager {
    /// Create new state manager with default TTL (10 minutes).
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_STATE_MAX_AGE)
    }

    /// Create state manager with custom TTL.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    fn is_expired(&self, issued_at: Instant) -> bool {
        issued_at.elapsed() > self.max_age
    }
}

impl Default for InMemoryStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager for InMemoryStateManager {
    fn issue(&self) -> String {
        let state = generate_state();
        let mut states = self.states.lock();
        states.retain(|_, issued_at| !self.is_expired(*issued_at));
        states.insert(state.clone(), Instant::now());
        state
    }

    fn consume(&self, state: &str) -> bool {
        match self.states.lock().remove(state) {
            Some(issued_at) => !self.is_expired(issued_at),
            None => false,
        }
    }

    fn revoke(&self, state: &str) {
        self.states.lock().remove(state);
    }
}

/// Mock state manager for testing.
#[derive(Default)]
pub struct MockStateManager {
    states: Mutex<Vec<String>>,
    consume_history: Mutex<Vec<String>>,
    next_state: Mutex<Option<String>>,
}

impl MockStateManager {
    /// Create new mock state manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the next state to issue.
    pub fn set_next_state(&self, state: impl Into<String>) -> &Self {
        *self.next_state.lock() = Some(state.into());
        self
    }

    /// Get consume history.
    pub fn get_consume_history(&self) -> Vec<String> {
        self.consume_history.lock().clone()
    }
}

impl StateManager for MockStateManager {
    fn issue(&self) -> String {
        let state = self
            .next_state
            .lock()
            .take()
            .unwrap_or_else(generate_state);
        self.states.lock().push(state.clone());
        state
    }

    fn consume(&self, state: &str) -> bool {
        self.consume_history.lock().push(state.to_string());
        let mut states = self.states.lock();
        match states.iter().position(|s| s == state) {
            Some(index) => {
                states.remove(index);
                true
            }
            None => false,
        }
    }

    fn revoke(&self, state: &str) {
        self.states.lock().retain(|s| s != state);
    }
}
