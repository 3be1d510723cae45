//! Top-level chat controller.
//!
//! Owns the shared [`UiState`](crate::state::UiState) and wires the
//! coordinator, the clipboard and the history endpoint to it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::coordinator::{Coordinator, CoordinatorSettings, SubmitOutcome};
use crate::message::Role;
use crate::state::{new_shared_state, with_state, SharedState};
use crate::stats::StatsView;
use crate::transcript::CopyLabel;

/// What a clear-history request did.
#[derive(Debug)]
pub enum ClearOutcome {
    /// The user declined; nothing changed.
    Cancelled,
    /// Transcript emptied. The handle tracks the fire-and-forget server call.
    Cleared(JoinHandle<()>),
}

pub struct ChatApp {
    state: SharedState,
    client: ApiClient,
    coordinator: Coordinator,
    clipboard: Arc<dyn Clipboard>,
    copy_ack: Duration,
}

impl ChatApp {
    pub fn new(config: &Config, clipboard: Arc<dyn Clipboard>) -> Self {
        Self::with_state(config, clipboard, new_shared_state())
    }

    /// Build around an existing state, e.g. one prepared by a test.
    pub fn with_state(config: &Config, clipboard: Arc<dyn Clipboard>, state: SharedState) -> Self {
        let client = ApiClient::new(config);
        let coordinator = Coordinator::new(
            Arc::clone(&state),
            client.clone(),
            CoordinatorSettings::from(config),
        );
        Self {
            state,
            client,
            coordinator,
            clipboard,
            copy_ack: Duration::from_secs(config.copy_ack_secs),
        }
    }

    /// Override the copy acknowledgment duration.
    pub fn copy_ack(mut self, duration: Duration) -> Self {
        self.copy_ack = duration;
        self
    }

    /// Override the coordinator's settings.
    pub fn coordinator_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.coordinator = Coordinator::new(Arc::clone(&self.state), self.client.clone(), settings);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_busy(&self) -> bool {
        self.coordinator.is_busy()
    }

    pub fn submit(&self, question: &str) -> SubmitOutcome {
        self.coordinator.submit(question)
    }

    /// Submit whatever is in the input field.
    pub fn submit_input(&self) -> SubmitOutcome {
        let input = with_state(&self.state, |s| s.input.clone());
        self.coordinator.submit(&input)
    }

    /// Wipe the transcript after `confirm` agrees, then tell the server.
    ///
    /// The server call is fire-and-forget: a failure is logged and the local
    /// clear stands.
    pub fn clear_history(&self, confirm: impl FnOnce() -> bool) -> ClearOutcome {
        if !confirm() {
            debug!("history clear declined");
            return ClearOutcome::Cancelled;
        }
        with_state(&self.state, |s| s.transcript.clear());
        info!("history cleared");

        let client = self.client.clone();
        ClearOutcome::Cleared(tokio::spawn(async move {
            if let Err(err) = client.clear_history().await {
                warn!(error = %err, "server-side history clear failed");
            }
        }))
    }

    /// Copy the text of the `n`th message, counting messages only.
    ///
    /// Returns the label now shown on its button, or `None` when that message
    /// is not an assistant answer. The label reverts to idle after the
    /// acknowledgment period; a later copy of the same message restarts it.
    pub fn copy(&self, n: usize) -> Option<CopyLabel> {
        let (id, text) = with_state(&self.state, |s| match s.transcript.message_at(n) {
            Some(m) if m.message.role == Role::Assistant => Some((m.id, m.text())),
            _ => None,
        })?;

        let label = match self.clipboard.write_text(&text) {
            Ok(()) => CopyLabel::Copied,
            Err(err) => {
                warn!(error = %err, "copy to clipboard failed");
                CopyLabel::Failed
            }
        };
        let generation = with_state(&self.state, |s| s.transcript.set_copy_label(id, label))?;

        let state = Arc::clone(&self.state);
        let ack = self.copy_ack;
        tokio::spawn(async move {
            tokio::time::sleep(ack).await;
            with_state(&state, |s| s.transcript.reset_copy_label(id, generation));
        });
        Some(label)
    }

    /// Load the statistics view with a single fetch.
    pub async fn load_stats(&self) -> StatsView {
        StatsView::load(&self.client).await
    }
}
