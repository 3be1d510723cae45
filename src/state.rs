use std::sync::{Arc, Mutex};

use crate::transcript::Transcript;

/// Everything the chat view shows, as one injectable value.
#[derive(Debug, Default)]
pub struct UiState {
    pub transcript: Transcript,
    /// Current contents of the question input.
    pub input: String,
    /// `/ask` requests issued and not yet settled. A history clear does not
    /// touch it.
    pub in_flight: usize,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// UI state shared between the controller and the tasks it spawns.
pub type SharedState = Arc<Mutex<UiState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(UiState::new()))
}

/// Run `f` with exclusive access to the state.
///
/// A poisoned lock is recovered: the transcript stays usable after a panic
/// elsewhere.
pub fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut UiState) -> R) -> R {
    let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}
