#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::local_day_bounds;
use super::prompts;
use super::KeyRotator;
use super::PreferencesStore;
use super::QuotaTracker;
use super::RateLimiter;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatError;
use crate::domain::models::CompletionRequest;
use crate::domain::models::ConversationSession;
use crate::domain::models::DeleteOutcome;
use crate::domain::models::Event;
use crate::domain::models::Identity;
use crate::domain::models::IdentityProvider;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::MessageRecord;
use crate::domain::models::MessageStoreBox;
use crate::domain::models::Persona;
use crate::domain::models::Preferences;
use crate::domain::models::SendOutcome;
use crate::domain::models::Toast;

pub type IdentityHandle = Arc<dyn IdentityProvider + Send + Sync>;

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub model: String,
    pub daily_limit: u32,
    /// Wall clock budget of a single upstream attempt.
    pub request_timeout: Duration,
    /// Prior messages sent along with a new one.
    pub history_window: usize,
    pub max_transient_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Pause after rotating keys on a 429.
    pub quota_retry_delay: Duration,
    pub max_rate_waits: u32,
    /// Consecutive failures after which the toast escalates.
    pub severe_failure_threshold: u32,
}

impl Default for ControllerOptions {
    fn default() -> ControllerOptions {
        return ControllerOptions {
            model: "deepseek/deepseek-r1:free".to_string(),
            daily_limit: 5,
            request_timeout: Duration::from_secs(15),
            history_window: 5,
            max_transient_retries: 2,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(5),
            quota_retry_delay: Duration::from_secs(1),
            max_rate_waits: 10,
            severe_failure_threshold: 3,
        };
    }
}

impl ControllerOptions {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        return self
            .backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap);
    }
}

struct ChatState {
    messages: Vec<Message>,
    session: ConversationSession,
    quota: QuotaTracker,
    consecutive_failures: u32,
    composing: bool,
}

impl ChatState {
    fn preferences(&self) -> Preferences {
        return Preferences {
            persona: self.session.persona,
            language: self.session.language,
            quota: self.quota.state().clone(),
        };
    }

    /// Persona is still open and the user hasn't said anything yet; only
    /// assistant prompts may be on screen.
    fn awaiting_persona(&self) -> bool {
        return self.session.persona.is_none()
            && self.messages.iter().all(|e| return e.is_from_assistant);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    return mutex
        .lock()
        .unwrap_or_else(|poisoned| return poisoned.into_inner());
}

pub struct ConversationController {
    backend: BackendBox,
    store: MessageStoreBox,
    identity: IdentityHandle,
    preferences: PreferencesStore,
    keys: KeyRotator,
    options: ControllerOptions,
    tx: mpsc::UnboundedSender<Event>,
    state: Mutex<ChatState>,
    rate_limiter: Mutex<RateLimiter>,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    generation: AtomicU64,
    flight_slot: tokio::sync::Mutex<()>,
    /// Serialises local appends with their inserts against deletes.
    writes: tokio::sync::Mutex<()>,
}

impl ConversationController {
    pub async fn new(
        options: ControllerOptions,
        backend: BackendBox,
        store: MessageStoreBox,
        identity: IdentityHandle,
        keys: KeyRotator,
        preferences: PreferencesStore,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ConversationController {
        let saved = preferences.load().await;
        let state = ChatState {
            messages: vec![],
            session: ConversationSession {
                persona: saved.persona,
                language: saved.language,
                initialized: false,
            },
            quota: QuotaTracker::new(options.daily_limit, saved.quota),
            consecutive_failures: 0,
            composing: false,
        };

        return ConversationController {
            backend,
            store,
            identity,
            preferences,
            keys,
            options,
            tx,
            state: Mutex::new(state),
            rate_limiter: Mutex::new(RateLimiter::default()),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            flight_slot: tokio::sync::Mutex::new(()),
            writes: tokio::sync::Mutex::new(()),
        };
    }

    pub fn messages(&self) -> Vec<Message> {
        return lock(&self.state).messages.clone();
    }

    pub fn session(&self) -> ConversationSession {
        return lock(&self.state).session.clone();
    }

    pub fn is_composing(&self) -> bool {
        return lock(&self.state).composing;
    }

    pub fn consecutive_failures(&self) -> u32 {
        return lock(&self.state).consecutive_failures;
    }

    pub fn check_daily_limit(&self) -> bool {
        return lock(&self.state).quota.check_daily_limit();
    }

    fn emit(&self, event: Event) -> Result<()> {
        self.tx.send(event)?;
        return Ok(());
    }

    fn toast_error(&self, text: &str) -> Result<()> {
        return self.emit(Event::Toast(Toast::error(text)));
    }

    fn require_identity(&self) -> Result<Option<Identity>> {
        let identity = self.identity.current();
        if identity.is_none() {
            self.emit(Event::AuthenticationRequired())?;
        }

        return Ok(identity);
    }

    async fn save_preferences(&self) {
        let preferences = lock(&self.state).preferences();
        if let Err(err) = self.preferences.save(&preferences).await {
            tracing::error!(error = ?err, "Failed to save preferences");
        }
    }

    fn reject_daily_limit(&self) -> Result<SendOutcome> {
        tracing::info!(limit = self.options.daily_limit, "Daily limit reached");
        self.toast_error(&prompts::daily_limit_reached(self.options.daily_limit))?;
        return Ok(SendOutcome::DailyLimitReached);
    }

    /// Appends locally first, then persists best effort. A failed insert is
    /// reported but the local message stays. A message visible locally has
    /// always finished its insert once `writes` is free.
    async fn add_message(&self, identity: &Identity, message: Message) -> Result<()> {
        let _writes = self.writes.lock().await;
        let persona = {
            let mut state = lock(&self.state);
            state.messages.push(message.clone());
            state.session.persona
        };
        self.emit(Event::MessageAdded(message.clone()))?;

        let record = MessageRecord::from_message(&identity.user_id, &message, persona);
        if let Err(err) = self.store.insert(identity, &record).await {
            tracing::error!(error = ?err, message_id = message.id, "Error saving message");
            self.toast_error("Failed to send message")?;
        }

        return Ok(());
    }

    /// Reconciles local state with the message store at session start.
    pub async fn initialize(&self) -> Result<bool> {
        let identity = match self.identity.current() {
            Some(identity) => identity,
            None => return Ok(false),
        };

        if self.session().persona.is_none() {
            match self.store.latest_persona(&identity).await {
                Ok(Some(persona)) => {
                    lock(&self.state).session.persona = Some(persona);
                    self.emit(Event::PersonaSelected(persona))?;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(error = ?err, "Error loading persona");
                }
            }
        }

        let records = match self.store.list(&identity).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = ?err, "Error loading messages");
                self.toast_error("Failed to load messages")?;
                return Ok(false);
            }
        };
        let messages = records
            .into_iter()
            .filter(|e| return !e.is_persona_marker())
            .map(|e| return e.into_message())
            .collect::<Vec<Message>>();

        let today = QuotaTracker::today();
        let (start, end) = local_day_bounds(today);
        match self.store.list_between(&identity, start, end).await {
            Ok(rows) => {
                let sent_today = rows
                    .iter()
                    .filter(|e| return !e.is_bot && !e.is_persona_marker())
                    .count() as u32;
                lock(&self.state).quota.seed_on(sent_today, today);
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to seed today's message count");
            }
        }

        let needs_welcome = {
            let mut state = lock(&self.state);
            state.messages = messages.clone();
            state.session.initialized = true;
            state.session.persona.is_none() && state.messages.is_empty()
        };
        self.emit(Event::HistoryLoaded(messages))?;
        self.save_preferences().await;

        if needs_welcome {
            let text = prompts::welcome(self.options.daily_limit);
            self.add_message(&identity, Message::assistant(&text)).await?;
        }

        return Ok(true);
    }

    pub async fn send_user_message(&self, text: &str) -> Result<SendOutcome> {
        let identity = match self.require_identity()? {
            Some(identity) => identity,
            None => return Ok(SendOutcome::AuthenticationRequired),
        };

        let allowed = lock(&self.state).quota.check_daily_limit();
        if !allowed {
            return self.reject_daily_limit();
        }

        let awaiting_persona = lock(&self.state).awaiting_persona();
        if awaiting_persona {
            let _slot = self.flight_slot.lock().await;
            return self.resolve_persona(&identity, text).await;
        }

        let (generation, token) = self.begin_flight();
        let _slot = self.flight_slot.lock().await;
        if token.is_cancelled() {
            self.end_flight(generation);
            return Ok(SendOutcome::Cancelled);
        }

        let res = self.run_pipeline(&identity, text, &token).await;

        lock(&self.state).composing = false;
        let composing_res = self.emit(Event::AssistantComposing(false));
        self.end_flight(generation);
        composing_res?;

        return res;
    }

    /// Treats the first reply as the persona choice. The utterance itself is
    /// never forwarded upstream.
    async fn resolve_persona(&self, identity: &Identity, text: &str) -> Result<SendOutcome> {
        match Persona::detect(text) {
            Some(persona) => {
                self.commit_persona(identity, persona).await?;
                return Ok(SendOutcome::PersonaSelected(persona));
            }
            None => {
                self.add_message(identity, Message::assistant(prompts::CLARIFICATION_PROMPT))
                    .await?;
                return Ok(SendOutcome::PersonaPrompted);
            }
        }
    }

    async fn commit_persona(&self, identity: &Identity, persona: Persona) -> Result<()> {
        lock(&self.state).session.persona = Some(persona);
        self.save_preferences().await;
        self.emit(Event::PersonaSelected(persona))?;

        let marker = MessageRecord::persona_marker(&identity.user_id, persona);
        if let Err(err) = self.store.insert(identity, &marker).await {
            tracing::error!(error = ?err, "Error saving user type");
            self.toast_error("Failed to set user type")?;
        }

        self.add_message(identity, Message::assistant(&prompts::greeting(persona)))
            .await?;

        return Ok(());
    }

    /// Explicit persona pick. A persona already committed for this history is
    /// kept as is.
    pub async fn select_persona(&self, persona: Persona) -> Result<SendOutcome> {
        let identity = match self.require_identity()? {
            Some(identity) => identity,
            None => return Ok(SendOutcome::AuthenticationRequired),
        };

        if let Some(existing) = self.session().persona {
            tracing::debug!(persona = %existing, "Persona already selected");
            return Ok(SendOutcome::PersonaSelected(existing));
        }

        self.commit_persona(&identity, persona).await?;
        return Ok(SendOutcome::PersonaSelected(persona));
    }

    pub async fn set_language(&self, language: Language) {
        lock(&self.state).session.language = language;
        self.save_preferences().await;
    }

    /// Registers a new send, cancelling whichever one was in flight.
    fn begin_flight(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = lock(&self.in_flight).replace((generation, token.clone()));
        if let Some((previous_generation, previous_token)) = previous {
            tracing::debug!(
                generation = previous_generation,
                "Cancelling in-flight send"
            );
            previous_token.cancel();
        }

        return (generation, token);
    }

    fn end_flight(&self, generation: u64) {
        let mut in_flight = lock(&self.in_flight);
        if let Some((current, _)) = in_flight.as_ref() {
            if *current == generation {
                *in_flight = None;
            }
        }
    }

    /// Cancels the in-flight send, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        if let Some((generation, token)) = lock(&self.in_flight).as_ref() {
            tracing::debug!(generation, "Cancel requested");
            token.cancel();
            return true;
        }

        return false;
    }

    async fn run_pipeline(
        &self,
        identity: &Identity,
        text: &str,
        token: &CancellationToken,
    ) -> Result<SendOutcome> {
        let user_message = Message::user(text);
        // Earlier sends may have used up the quota while this one queued.
        let reserved = {
            let mut state = lock(&self.state);
            if state.quota.try_record_user_message() {
                let start = state
                    .messages
                    .len()
                    .saturating_sub(self.options.history_window);
                Some((state.messages[start..].to_vec(), state.session.language))
            } else {
                None
            }
        };
        let (history, language) = match reserved {
            Some(reserved) => reserved,
            None => return self.reject_daily_limit(),
        };
        self.save_preferences().await;
        self.add_message(identity, user_message).await?;

        lock(&self.state).composing = true;
        self.emit(Event::AssistantComposing(true))?;

        let request = prompts::build_request(&self.options.model, language, &history, text);
        let res = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            res = self.request_with_retry(&request) => Some(res),
        };

        match res {
            None => {
                tracing::debug!("Send cancelled");
                return Ok(SendOutcome::Cancelled);
            }
            Some(Ok(reply)) => {
                lock(&self.state).consecutive_failures = 0;
                let message = Message::assistant(&reply);
                self.add_message(identity, message.clone()).await?;
                return Ok(SendOutcome::Replied(message));
            }
            Some(Err(err)) => {
                self.handle_terminal_failure(identity, &err).await?;
                return Ok(SendOutcome::Failed(err));
            }
        }
    }

    async fn handle_terminal_failure(&self, identity: &Identity, err: &ChatError) -> Result<()> {
        let failures = {
            let mut state = lock(&self.state);
            state.consecutive_failures += 1;
            state.consecutive_failures
        };
        tracing::error!(error = %err, failures, "Chat API error");

        if failures >= self.options.severe_failure_threshold {
            self.toast_error(prompts::SEVERE_FAILURE_TOAST)?;
        } else {
            self.toast_error(prompts::FAILURE_TOAST)?;
        }

        self.add_message(identity, Message::assistant(prompts::APOLOGY))
            .await?;

        return Ok(());
    }

    /// Blocks until the short window admits another request.
    async fn wait_for_rate_window(&self) -> Result<(), ChatError> {
        for _ in 0..self.options.max_rate_waits {
            let (allowed, cooldown) = {
                let mut limiter = lock(&self.rate_limiter);
                (limiter.check_short_window(), limiter.cooldown())
            };
            if allowed {
                return Ok(());
            }

            tracing::debug!(
                cooldown_ms = cooldown.as_millis() as u64,
                "Request window full, deferring"
            );
            time::sleep(cooldown).await;
        }

        return Err(ChatError::RateLimited);
    }

    async fn request_with_retry(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        let mut attempt: u32 = 0;
        loop {
            self.wait_for_rate_window().await?;

            let res = match time::timeout(
                self.options.request_timeout,
                self.request_rotating_keys(request),
            )
            .await
            {
                Ok(res) => res,
                Err(_) => Err(ChatError::Timeout),
            };

            match res {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_transient() && attempt < self.options.max_transient_retries => {
                    let delay = self.options.backoff(attempt);
                    tracing::warn!(
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying upstream request"
                    );
                    time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Retries the identical request on a fresh key for as long as upstream
    /// keeps answering 429. Bounded by the caller's timeout.
    async fn request_rotating_keys(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        loop {
            let key = self.keys.current_key().to_string();
            match self.backend.get_completion(&key, request).await {
                Err(ChatError::UpstreamQuotaExceeded) => {
                    let index = self.keys.rotate();
                    tracing::warn!(
                        key_index = index,
                        pool_size = self.keys.pool_size(),
                        "Upstream quota exceeded, rotating API key"
                    );
                    time::sleep(self.options.quota_retry_delay).await;
                }
                res => return res,
            }
        }
    }

    pub async fn clear_history(&self) -> Result<bool> {
        let identity = match self.require_identity()? {
            Some(identity) => identity,
            None => return Ok(false),
        };

        // The cancelled send may still be persisting its user message; let it
        // land before the rows are removed.
        self.cancel();
        let _slot = self.flight_slot.lock().await;
        let _writes = self.writes.lock().await;
        if let Err(err) = self.store.delete_all(&identity).await {
            tracing::error!(error = ?err, "Error clearing messages");
            self.toast_error("Failed to clear chat history")?;
            return Ok(false);
        }

        {
            let mut state = lock(&self.state);
            state.messages.clear();
            state.session.persona = None;
            state.session.initialized = false;
            state.quota.reset();
            state.consecutive_failures = 0;
        }
        self.save_preferences().await;

        self.emit(Event::HistoryCleared())?;
        self.emit(Event::Toast(Toast::success("Chat history cleared")))?;

        return Ok(true);
    }

    pub async fn delete_message(&self, id: &str) -> Result<DeleteOutcome> {
        let identity = match self.require_identity()? {
            Some(identity) => identity,
            None => return Ok(DeleteOutcome::AuthenticationRequired),
        };

        let _writes = self.writes.lock().await;
        let exists = lock(&self.state).messages.iter().any(|e| return e.id == id);
        if !exists {
            tracing::debug!(message_id = id, "Message not found");
            return Ok(DeleteOutcome::NotFound);
        }

        if let Err(err) = self.store.delete(&identity, id).await {
            tracing::error!(error = ?err, message_id = id, "Error deleting message");
            self.toast_error("Failed to delete message")?;
            return Ok(DeleteOutcome::Failed);
        }

        lock(&self.state).messages.retain(|e| return e.id != id);
        self.emit(Event::MessageDeleted(id.to_string()))?;
        self.emit(Event::Toast(Toast::success("Message deleted")))?;

        return Ok(DeleteOutcome::Deleted);
    }

    /// Reaction to the identity signing out. Local state and the preferences
    /// snapshot go back to their defaults.
    pub async fn sign_out(&self) -> Result<()> {
        self.cancel();
        {
            let mut state = lock(&self.state);
            state.messages.clear();
            state.session = ConversationSession::default();
            state.quota.reset();
            state.consecutive_failures = 0;
        }

        if let Err(err) = self.preferences.clear().await {
            tracing::error!(error = ?err, "Failed to clear preferences");
        }
        self.emit(Event::SignedOut())?;

        return Ok(());
    }
}
