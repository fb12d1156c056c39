//! Interaction controller — the state machine driven by the surrounding UI.
//!
//! The controller owns the single [`SessionContext`] (credential + history)
//! and talks to the outside world through the [`Surface`] trait. One user
//! action runs `Idle -> AwaitingResponse -> Idle` and is routed to the answer
//! or the suggestions path by whether a short answer was given. Guards are
//! checked before leaving `Idle`, so a validation failure never disables the
//! trigger.

use std::sync::Arc;

use tracing::{info, warn};

use crate::clipboard::Clipboard;
use crate::error::Error;
use crate::history::{HistoryItem, HistoryLog, SUGGESTIONS_MARKER, SUGGESTION_SEPARATOR};
use crate::llm::GenerationBackend;
use crate::service::AnswerService;
use crate::store::{PersistentStore, API_KEY};
use crate::Result;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    AwaitingResponse,
}

/// Outcome of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Answer(String),
    Suggestions(Vec<String>),
}

/// Rendering surface the controller reads inputs from and writes results to.
pub trait Surface {
    /// Raw text of the client-message input.
    fn client_message(&self) -> String;

    /// Raw text of the short-answer input.
    fn short_answer(&self) -> String;

    /// Replace the client-message input (used by paste).
    fn set_client_message(&mut self, text: &str);

    /// Replace the short-answer input (used when picking a suggestion).
    fn set_short_answer(&mut self, text: &str);

    /// Enable or disable the trigger control.
    fn set_busy(&mut self, busy: bool);

    fn show_answer(&mut self, answer: &str);

    fn show_suggestions(&mut self, suggestions: &[String]);

    fn clear_inputs(&mut self);

    /// Single user-visible failure notification.
    fn notify_error(&mut self, error: &Error);

    /// Informational message (copied, key saved, ...).
    fn notify(&mut self, message: &str);
}

/// Process-wide state, owned by one controller.
pub struct SessionContext {
    credential: String,
    history: HistoryLog,
    store: Arc<dyn PersistentStore>,
}

impl SessionContext {
    /// Load credential and history from the store. `fallback` is used when
    /// no credential has been saved.
    pub fn load(store: Arc<dyn PersistentStore>, fallback: Option<&str>) -> Self {
        let stored = match store.get(API_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read stored API key: {}", e);
                None
            }
        };

        let credential = stored
            .filter(|k| !k.trim().is_empty())
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_default();
        let history = HistoryLog::new(store.clone());

        Self {
            credential,
            history,
            store,
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }
}

/// Top-level orchestration invoked by the UI.
pub struct InteractionController<B: GenerationBackend, S: Surface> {
    service: AnswerService<B>,
    context: SessionContext,
    surface: S,
    state: State,
}

impl<B: GenerationBackend, S: Surface> InteractionController<B, S> {
    pub fn new(service: AnswerService<B>, context: SessionContext, surface: S) -> Self {
        Self {
            service,
            context,
            surface,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn history(&self) -> &[HistoryItem] {
        self.context.history.items()
    }

    /// The single user trigger.
    ///
    /// Guards on the client message and the credential, then routes on the
    /// short answer: empty asks for suggestions, anything else is rewritten
    /// into a full reply. Returns `Ok(None)` when a request is already in
    /// flight.
    pub async fn generate(&mut self) -> Result<Option<Generated>> {
        if self.state == State::AwaitingResponse {
            return Ok(None);
        }

        let client_message = self.surface.client_message().trim().to_string();
        let short_answer = self.surface.short_answer().trim().to_string();

        if let Err(e) = self.check_inputs(&client_message) {
            self.surface.notify_error(&e);
            return Err(e);
        }

        self.begin();
        let result = if short_answer.is_empty() {
            self.service
                .generate_suggestions(&client_message, &self.context.credential)
                .await
                .map(Generated::Suggestions)
        } else {
            self.service
                .generate_answer(&short_answer, &client_message, &self.context.credential)
                .await
                .map(Generated::Answer)
        };
        self.end();

        match result {
            Ok(Generated::Answer(answer)) => {
                self.surface.show_answer(&answer);
                self.context.history.record(&client_message, &short_answer, &answer);
                self.surface.clear_inputs();
                Ok(Some(Generated::Answer(answer)))
            }
            Ok(Generated::Suggestions(suggestions)) => {
                self.surface.show_suggestions(&suggestions);
                self.context.history.record(
                    &client_message,
                    SUGGESTIONS_MARKER,
                    &suggestions.join(SUGGESTION_SEPARATOR),
                );
                Ok(Some(Generated::Suggestions(suggestions)))
            }
            Err(e) => {
                self.surface.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Make a suggestion the short answer, ready for the next trigger.
    pub fn use_suggestion(&mut self, suggestion: &str) {
        self.surface.set_short_answer(suggestion.trim());
    }

    /// Replace the credential. An empty key removes the stored one.
    pub fn set_credential(&mut self, key: &str) {
        let key = key.trim();
        let saved = if key.is_empty() {
            self.context.store.remove(API_KEY)
        } else {
            self.context.store.set(API_KEY, key)
        };
        self.context.credential = key.to_string();
        info!("API key {}", if key.is_empty() { "cleared" } else { "updated" });

        match saved {
            Ok(()) if key.is_empty() => self.surface.notify("API key cleared."),
            Ok(()) => self.surface.notify("API key saved."),
            Err(e) => {
                warn!("Failed to persist API key: {}", e);
                self.surface
                    .notify("API key set for this session, but it could not be saved.");
            }
        }
    }

    /// Check `candidate`, or the current credential when `None`.
    pub async fn test_credential(&mut self, candidate: Option<&str>) -> Result<()> {
        let key = candidate
            .unwrap_or(self.context.credential.as_str())
            .trim().to_string();

        self.begin();
        let result = self.service.test_credential(&key).await;
        self.end();

        match result {
            Ok(()) => {
                self.surface.notify("API key works.");
                Ok(())
            }
            Err(e) => {
                self.surface.notify_error(&e);
                Err(e)
            }
        }
    }

    pub fn clear_history(&mut self) {
        self.context.history.clear();
        self.surface.notify("History cleared.");
    }

    /// Fill the client-message input from the clipboard.
    pub fn paste_client_message(&mut self, clipboard: &mut dyn Clipboard) -> Result<()> {
        match clipboard.read_text() {
            Ok(text) => {
                self.surface.set_client_message(&text);
                Ok(())
            }
            Err(e) => {
                self.surface.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Copy `text` to the clipboard.
    pub fn copy_text(&mut self, clipboard: &mut dyn Clipboard, text: &str) -> Result<()> {
        match clipboard.write_text(text) {
            Ok(()) => {
                self.surface.notify("Copied to clipboard.");
                Ok(())
            }
            Err(e) => {
                self.surface.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Copy the generated text of history entry `index` (0 = newest).
    pub fn copy_from_history(&mut self, clipboard: &mut dyn Clipboard, index: usize) -> Result<()> {
        let Some(text) = self.history().get(index).map(|i| i.generated_text.clone()) else {
            let e = Error::Validation(format!("No history entry #{}", index + 1));
            self.surface.notify_error(&e);
            return Err(e);
        };
        self.copy_text(clipboard, &text)
    }

    fn check_inputs(&self, client_message: &str) -> Result<()> {
        if client_message.is_empty() {
            return Err(Error::Validation("Please paste the client's message.".to_string()));
        }
        if !self.context.has_credential() {
            return Err(Error::MissingCredential);
        }
        Ok(())
    }

    fn begin(&mut self) {
        self.state = State::AwaitingResponse;
        self.surface.set_busy(true);
    }

    fn end(&mut self) {
        self.state = State::Idle;
        self.surface.set_busy(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::llm::{FakeBackend, HttpReply};
    use crate::store::{InMemoryStore, HISTORY_KEY};

    #[derive(Default)]
    struct RecordingSurface {
        client: String,
        short: String,
        busy_changes: Vec<bool>,
        answers: Vec<String>,
        suggestions: Vec<Vec<String>>,
        errors: Vec<String>,
        notices: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn client_message(&self) -> String {
            self.client.clone()
        }
        fn short_answer(&self) -> String {
            self.short.clone()
        }
        fn set_client_message(&mut self, text: &str) {
            self.client = text.to_string();
        }
        fn set_short_answer(&mut self, text: &str) {
            self.short = text.to_string();
        }
        fn set_busy(&mut self, busy: bool) {
            self.busy_changes.push(busy);
        }
        fn show_answer(&mut self, answer: &str) {
            self.answers.push(answer.to_string());
        }
        fn show_suggestions(&mut self, suggestions: &[String]) {
            self.suggestions.push(suggestions.to_vec());
        }
        fn clear_inputs(&mut self) {
            self.client.clear();
            self.short.clear();
        }
        fn notify_error(&mut self, error: &Error) {
            self.errors.push(error.to_string());
        }
        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    struct ReadOnlyStore;

    impl PersistentStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("read-only".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::Storage("read-only".into()))
        }
    }

    fn controller(
        replies: Vec<HttpReply>,
        key: Option<&str>,
    ) -> (Arc<InMemoryStore>, InteractionController<FakeBackend, RecordingSurface>) {
        let store = Arc::new(InMemoryStore::new());
        if let Some(key) = key {
            store.set(API_KEY, key).unwrap();
        }
        let context = SessionContext::load(store.clone(), None);
        let service = AnswerService::new(FakeBackend::new(replies));
        let surface = RecordingSurface {
            client: "Can you start Monday?".to_string(),
            short: "yes".to_string(),
            ..Default::default()
        };
        (store, InteractionController::new(service, context, surface))
    }

    #[tokio::test]
    async fn test_answer_path_records_and_clears_inputs() {
        let (store, mut ctl) = controller(vec![FakeBackend::text("Monday works great.")], Some("k"));

        let generated = ctl.generate().await.unwrap();
        assert_eq!(generated, Some(Generated::Answer("Monday works great.".to_string())));

        let surface = ctl.surface();
        assert_eq!(surface.answers, vec!["Monday works great."]);
        assert!(surface.suggestions.is_empty());
        assert_eq!(surface.busy_changes, vec![true, false]);
        assert!(surface.client.is_empty());
        assert!(surface.short.is_empty());
        assert_eq!(ctl.state(), State::Idle);

        assert_eq!(ctl.history().len(), 1);
        assert_eq!(ctl.history()[0].client_message, "Can you start Monday?");
        assert_eq!(ctl.history()[0].short_answer_or_marker, "yes");
        assert!(store.get(HISTORY_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_short_answer_takes_suggestions_path() {
        let (_store, mut ctl) = controller(
            vec![FakeBackend::text("1. Sure.\n2. Maybe Tuesday?\n3. Let me check.")],
            Some("k"),
        );
        ctl.surface_mut().short = "   ".to_string();

        let generated = ctl.generate().await.unwrap();
        let Some(Generated::Suggestions(suggestions)) = generated else {
            panic!("expected suggestions");
        };
        assert_eq!(suggestions.len(), 3);

        let surface = ctl.surface();
        assert_eq!(surface.suggestions.len(), 1);
        assert!(surface.answers.is_empty());
        assert!(surface.errors.is_empty());
        assert_eq!(surface.client, "Can you start Monday?");

        let item = &ctl.history()[0];
        assert!(item.is_suggestions());
        assert_eq!(item.generated_text, "Sure.\n\nMaybe Tuesday?\n\nLet me check.");
    }

    #[tokio::test]
    async fn test_used_suggestion_becomes_short_answer() {
        let (_store, mut ctl) = controller(
            vec![
                FakeBackend::text("1. Sure, Monday works.\n2. Tuesday instead?"),
                FakeBackend::text("Monday works for me, I'll be ready at 9."),
            ],
            Some("k"),
        );
        ctl.surface_mut().short.clear();

        let Some(Generated::Suggestions(suggestions)) = ctl.generate().await.unwrap() else {
            panic!("expected suggestions");
        };
        ctl.use_suggestion(&suggestions[0]);
        assert_eq!(ctl.surface().short, "Sure, Monday works.");

        let generated = ctl.generate().await.unwrap();
        assert!(matches!(generated, Some(Generated::Answer(_))));
        assert_eq!(ctl.history().len(), 2);
        assert_eq!(ctl.history()[0].short_answer_or_marker, "Sure, Monday works.");
        assert!(ctl.history()[1].is_suggestions());
    }

    #[tokio::test]
    async fn test_empty_client_message_never_awaits() {
        let (_store, mut ctl) = controller(vec![], Some("k"));
        ctl.surface_mut().client = "   ".to_string();

        let err = ctl.generate().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(ctl.surface().busy_changes.is_empty());
        assert_eq!(ctl.surface().errors.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_routed_to_surface() {
        let (_store, mut ctl) = controller(vec![], None);

        let err = ctl.generate().await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert!(ctl.surface().busy_changes.is_empty());
        assert!(ctl.history().is_empty());
    }

    #[tokio::test]
    async fn test_failure_returns_to_idle_without_history() {
        let (_store, mut ctl) = controller(
            vec![HttpReply::new(429, r#"{"error":{"message":"quota exceeded"}}"#)],
            Some("k"),
        );

        let err = ctl.generate().await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
        assert_eq!(ctl.state(), State::Idle);
        assert_eq!(ctl.surface().busy_changes, vec![true, false]);
        assert!(ctl.surface().errors[0].contains("quota exceeded"));
        assert!(ctl.history().is_empty());
        // Inputs survive a failure so the user can retry
        assert_eq!(ctl.surface().short, "yes");
    }

    #[tokio::test]
    async fn test_trigger_while_awaiting_is_noop() {
        let (_store, mut ctl) = controller(vec![], Some("k"));
        ctl.state = State::AwaitingResponse;

        assert_eq!(ctl.generate().await.unwrap(), None);
        assert!(ctl.surface().errors.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_test_credential() {
        let (store, mut ctl) = controller(vec![FakeBackend::text("OK")], None);

        ctl.set_credential("  new-key ");
        assert_eq!(ctl.context().credential(), "new-key");
        assert_eq!(store.get(API_KEY).unwrap().as_deref(), Some("new-key"));
        assert_eq!(ctl.surface().notices.last().map(String::as_str), Some("API key saved."));

        ctl.test_credential(None).await.unwrap();
        assert!(ctl.surface().notices.contains(&"API key works.".to_string()));

        ctl.set_credential("");
        assert!(!ctl.context().has_credential());
        assert_eq!(store.get(API_KEY).unwrap(), None);
    }

    #[test]
    fn test_unsaved_credential_is_not_reported_as_saved() {
        let context = SessionContext::load(Arc::new(ReadOnlyStore), None);
        let service = AnswerService::new(FakeBackend::new(vec![]));
        let mut ctl = InteractionController::new(service, context, RecordingSurface::default());

        ctl.set_credential("k");
        assert_eq!(ctl.context().credential(), "k");
        let notice = ctl.surface().notices.last().unwrap();
        assert!(notice.contains("could not be saved"));
    }

    #[test]
    fn test_fallback_credential_used_when_none_stored() {
        let store = Arc::new(InMemoryStore::new());
        let context = SessionContext::load(store.clone(), Some("from-env"));
        assert_eq!(context.credential(), "from-env");

        store.set(API_KEY, "stored").unwrap();
        let context = SessionContext::load(store, Some("from-env"));
        assert_eq!(context.credential(), "stored");
    }

    #[test]
    fn test_clipboard_round_trip() {
        let (_store, mut ctl) = controller(vec![], Some("k"));
        let mut clipboard = MemoryClipboard::default();

        assert!(ctl.paste_client_message(&mut clipboard).is_err());

        clipboard.contents = Some("Pasted client text".to_string());
        ctl.paste_client_message(&mut clipboard).unwrap();
        assert_eq!(ctl.surface().client, "Pasted client text");

        ctl.copy_text(&mut clipboard, "reply").unwrap();
        assert_eq!(clipboard.contents.as_deref(), Some("reply"));
    }

    #[test]
    fn test_copy_from_history() {
        let (_store, mut ctl) = controller(vec![], Some("k"));
        ctl.context_mut().history_mut().record("c1", "s1", "older reply");
        ctl.context_mut().history_mut().record("c2", "s2", "newer reply");
        let mut clipboard = MemoryClipboard::default();

        ctl.copy_from_history(&mut clipboard, 1).unwrap();
        assert_eq!(clipboard.contents.as_deref(), Some("older reply"));

        let err = ctl.copy_from_history(&mut clipboard, 5).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(clipboard.contents.as_deref(), Some("older reply"));
        assert_eq!(ctl.surface().errors.len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let (_store, mut ctl) = controller(vec![], Some("k"));
        ctl.context_mut().history_mut().record("c", "s", "g");

        ctl.clear_history();
        assert!(ctl.history().is_empty());
    }
}
