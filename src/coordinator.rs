//! Request coordinator: one question, one round trip, one terminal entry.
//!
//! ## Lifecycle
//! 1. `submit` trims the question; blank input is dropped without touching
//!    the state or the network.
//! 2. The user entry and a pending placeholder are appended and the input is
//!    cleared, synchronously.
//! 3. A task issues `POST /ask`. An independent timer swaps the placeholder
//!    text for a slow-request hint if the request is still outstanding after
//!    `slow_hint_after`. The timer never cancels or extends the request.
//! 4. On settle the placeholder is removed first, then exactly one assistant
//!    entry (answer or apology) is appended.
//!
//! Single-flight counts requests on the wire (`UiState::in_flight`), not
//! placeholders: clearing the transcript does not free the slot until the
//! cleared request settles.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, AskReply};
use crate::config::Config;
use crate::error::{failure_message, ClientError};
use crate::message::{provenance_label, ContentFormat, Message};
use crate::state::{with_state, SharedState, UiState};
use crate::transcript::EntryId;

pub const PENDING_TEXT: &str = "Thinking...";
pub const SLOW_HINT_TEXT: &str = "This may take a while. Searching for the best answer...";

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub slow_hint_after: Duration,
    /// Reject new submissions while one is outstanding.
    pub single_flight: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            slow_hint_after: Duration::from_secs(5),
            single_flight: true,
        }
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            slow_hint_after: Duration::from_secs(config.slow_hint_secs),
            single_flight: config.single_flight,
        }
    }
}

/// What `submit` did with the input.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only; nothing happened.
    Ignored,
    /// A request is already outstanding and single-flight is on.
    Busy,
    /// The request is running; the handle resolves after reconciliation.
    Accepted(JoinHandle<()>),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }

    pub fn into_handle(self) -> Option<JoinHandle<()>> {
        match self {
            SubmitOutcome::Accepted(handle) => Some(handle),
            _ => None,
        }
    }
}

pub struct Coordinator {
    state: SharedState,
    client: ApiClient,
    settings: CoordinatorSettings,
}

impl Coordinator {
    pub fn new(state: SharedState, client: ApiClient, settings: CoordinatorSettings) -> Self {
        Self { state, client, settings }
    }

    /// Whether any request is still on the wire, even one whose placeholder
    /// was cleared away.
    pub fn is_busy(&self) -> bool {
        with_state(&self.state, |s| s.in_flight > 0)
    }

    /// Submit a question. Must be called from within a Tokio runtime.
    pub fn submit(&self, question: &str) -> SubmitOutcome {
        let question = question.trim().to_string();
        if question.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let single_flight = self.settings.single_flight;
        let pending = with_state(&self.state, |s| {
            if single_flight && s.in_flight > 0 {
                return None;
            }
            s.in_flight += 1;
            s.transcript.append(Message::user(question.clone()));
            s.input.clear();
            Some(s.transcript.push_pending(PENDING_TEXT))
        });
        let Some(pending) = pending else {
            debug!("submission rejected, request outstanding");
            return SubmitOutcome::Busy;
        };
        info!(query_len = question.len(), "question submitted");

        let state = Arc::clone(&self.state);
        let client = self.client.clone();
        let hint_after = self.settings.slow_hint_after;

        let handle = tokio::spawn(async move {
            let hint = spawn_slow_hint(Arc::clone(&state), pending, hint_after);
            let result = client.ask(&question).await;
            hint.abort();
            with_state(&state, |s| {
                s.in_flight = s.in_flight.saturating_sub(1);
                reconcile(s, pending, result);
            });
        });
        SubmitOutcome::Accepted(handle)
    }
}

fn spawn_slow_hint(state: SharedState, pending: EntryId, after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let replaced = with_state(&state, |s| s.transcript.set_pending_text(pending, SLOW_HINT_TEXT));
        if replaced {
            debug!(after_ms = after.as_millis() as u64, "slow-request hint shown");
        }
    })
}

/// Settle a request: drop its placeholder, then append the terminal entry.
///
/// A request whose placeholder was wiped by a history clear is dropped.
pub fn reconcile(state: &mut UiState, pending: EntryId, result: Result<AskReply, ClientError>) {
    if !state.transcript.remove_pending(pending) {
        debug!("placeholder gone, discarding settled request");
        return;
    }
    let message = match result {
        Ok(reply) => {
            let format = reply
                .format
                .unwrap_or_else(|| ContentFormat::detect(&reply.response));
            let label = provenance_label(&reply.source, reply.confidence);
            info!(source = %reply.source, format = ?format, "answer received");
            Message::assistant(reply.response, format, Some(label))
        }
        Err(err) => {
            warn!(error = %err, network = err.is_network(), timeout = err.is_timeout(), "question failed");
            Message::failure(failure_message(&err))
        }
    };
    state.transcript.append(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{APOLOGY, NETWORK_CLAUSE};
    use crate::message::Role;
    use crate::state::new_shared_state;
    use crate::transcript::Entry;
    use proptest::prelude::*;

    fn reply(response: &str, source: &str, confidence: Option<f64>) -> AskReply {
        AskReply {
            response: response.into(),
            source: source.into(),
            confidence,
            format: None,
        }
    }

    #[test]
    fn test_reconcile_success_replaces_placeholder() {
        let mut s = UiState::new();
        s.transcript.append(Message::user("q"));
        let id = s.transcript.push_pending(PENDING_TEXT);
        reconcile(&mut s, id, Ok(reply("<p>X</p>", "database", Some(0.9))));

        assert_eq!(s.transcript.pending_count(), 0);
        let last = s.transcript.messages().last().unwrap();
        assert_eq!(last.message.role, Role::Assistant);
        assert_eq!(last.message.format, ContentFormat::Rich);
        assert_eq!(last.message.source.as_deref(), Some("Knowledge Base (confidence: 0.90)"));
    }

    #[test]
    fn test_reconcile_failure_appends_single_apology() {
        let mut s = UiState::new();
        s.transcript.append(Message::user("q"));
        let id = s.transcript.push_pending(PENDING_TEXT);
        let err = ClientError::Connect {
            url: "http://127.0.0.1:9/ask".into(),
            detail: "connection refused".into(),
        };
        reconcile(&mut s, id, Err(err));

        assert_eq!(s.transcript.len(), 2);
        let last = s.transcript.messages().last().unwrap();
        assert_eq!(last.message.content, format!("{APOLOGY}{NETWORK_CLAUSE}"));
        assert!(last.message.source.is_none());
    }

    #[test]
    fn test_reconcile_keeps_other_placeholders() {
        let mut s = UiState::new();
        let first = s.transcript.push_pending(PENDING_TEXT);
        let second = s.transcript.push_pending(PENDING_TEXT);
        reconcile(&mut s, second, Ok(reply("a", "web", None)));
        assert_eq!(s.transcript.pending_count(), 1);
        assert_eq!(s.transcript.pending().next().unwrap().id, first);
        assert!(matches!(s.transcript.entries().last(), Some(Entry::Message(_))));
    }

    #[test]
    fn test_explicit_plain_flag_beats_tag_sniffing() {
        let mut s = UiState::new();
        let id = s.transcript.push_pending(PENDING_TEXT);
        let mut r = reply("<p>literal</p>", "web", None);
        r.format = Some(ContentFormat::Plain);
        reconcile(&mut s, id, Ok(r));
        let last = s.transcript.messages().last().unwrap();
        assert!(last.body_html.contains("&lt;p&gt;literal"));
    }

    #[test]
    fn test_settings_from_config() {
        let cfg = Config {
            slow_hint_secs: 9,
            single_flight: false,
            ..Config::default()
        };
        let settings = CoordinatorSettings::from(&cfg);
        assert_eq!(settings.slow_hint_after, Duration::from_secs(9));
        assert!(!settings.single_flight);
    }

    #[tokio::test]
    async fn test_whitespace_submission_is_ignored() {
        let state = new_shared_state();
        let client = ApiClient::new(&Config::default());
        let coord = Coordinator::new(Arc::clone(&state), client, CoordinatorSettings::default());
        with_state(&state, |s| s.input = "   ".into());
        assert!(matches!(coord.submit("   \t\n"), SubmitOutcome::Ignored));
        assert!(matches!(coord.submit(""), SubmitOutcome::Ignored));
        let (len, input) = with_state(&state, |s| (s.transcript.len(), s.input.clone()));
        assert_eq!(len, 0);
        assert_eq!(input, "   ");
        assert!(!coord.is_busy());
    }

    #[test]
    fn test_reconcile_after_clear_is_discarded() {
        let mut s = UiState::new();
        s.transcript.append(Message::user("q"));
        let id = s.transcript.push_pending(PENDING_TEXT);
        s.transcript.clear();
        reconcile(&mut s, id, Ok(reply("late", "web", None)));
        assert!(s.transcript.is_empty());
    }

    #[test]
    fn test_request_on_the_wire_blocks_even_without_placeholder() {
        let state = new_shared_state();
        let coord = Coordinator::new(
            Arc::clone(&state),
            ApiClient::new(&Config::default()),
            CoordinatorSettings::default(),
        );
        // A cleared transcript whose request has not settled yet.
        with_state(&state, |s| s.in_flight = 1);
        assert!(coord.is_busy());
        assert!(matches!(coord.submit("second"), SubmitOutcome::Busy));
        assert!(with_state(&state, |s| s.transcript.is_empty()));
    }

    fn failure() -> ClientError {
        ClientError::Connect {
            url: "http://127.0.0.1:9/ask".into(),
            detail: "connection refused".into(),
        }
    }

    proptest! {
        #[test]
        fn test_blank_input_changes_nothing(blank in "[ \t\n\r]{0,16}") {
            let state = new_shared_state();
            let coord = Coordinator::new(
                Arc::clone(&state),
                ApiClient::new(&Config::default()),
                CoordinatorSettings::default(),
            );
            with_state(&state, |s| s.input = blank.clone());
            prop_assert!(matches!(coord.submit(&blank), SubmitOutcome::Ignored));
            let (len, input, in_flight) =
                with_state(&state, |s| (s.transcript.len(), s.input.clone(), s.in_flight));
            prop_assert_eq!(len, 0);
            prop_assert_eq!(input, blank);
            prop_assert_eq!(in_flight, 0);
        }

        #[test]
        fn test_question_settles_into_one_user_and_one_assistant_entry(
            question in ".{1,64}".prop_filter("non-blank", |q| !q.trim().is_empty()),
            succeed in any::<bool>(),
        ) {
            let mut s = UiState::new();
            s.transcript.append(Message::user(question.trim()));
            let id = s.transcript.push_pending(PENDING_TEXT);
            let result = if succeed { Ok(reply("answer", "web", None)) } else { Err(failure()) };
            reconcile(&mut s, id, result);

            let roles: Vec<Role> = s.transcript.messages().map(|m| m.message.role).collect();
            prop_assert_eq!(roles, vec![Role::User, Role::Assistant]);
            prop_assert_eq!(s.transcript.pending_count(), 0);
            prop_assert_eq!(s.transcript.len(), 2);
            let first = s.transcript.message_at(0).map(|m| m.message.content.clone());
            prop_assert_eq!(first.as_deref(), Some(question.trim()));
        }
    }
}
