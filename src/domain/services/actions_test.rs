use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tempdir::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ActionsService;
use crate::domain::models::Action;
use crate::domain::models::Backend;
use crate::domain::models::ChatError;
use crate::domain::models::CompletionRequest;
use crate::domain::models::Event;
use crate::domain::models::Identity;
use crate::domain::models::Language;
use crate::domain::models::Persona;
use crate::domain::models::ToastLevel;
use crate::domain::services::prompts;
use crate::domain::services::AuthSession;
use crate::domain::services::ControllerOptions;
use crate::domain::services::ConversationController;
use crate::domain::services::KeyRotator;
use crate::domain::services::PreferencesStore;
use crate::infrastructure::persistence::MemoryStore;

struct EchoBackend {}

#[async_trait]
impl Backend for EchoBackend {
    async fn get_completion(
        &self,
        _api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ChatError> {
        let last = request
            .messages
            .last()
            .map(|e| return e.content.to_string())
            .unwrap_or_default();

        return Ok(format!("You said: {last}"));
    }
}

struct Running {
    controller: Arc<ConversationController>,
    auth: Arc<AuthSession>,
    actions: mpsc::UnboundedSender<Action>,
    events: mpsc::UnboundedReceiver<Event>,
    worker: JoinHandle<Result<()>>,
    _dir: TempDir,
}

impl Running {
    async fn wait_for<F>(&mut self, predicate: F) -> Result<Event>
    where
        F: Fn(&Event) -> bool,
    {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv()).await?;
            match event {
                Some(event) if predicate(&event) => return Ok(event),
                Some(_) => continue,
                None => bail!("Event channel closed"),
            }
        }
    }
}

async fn start() -> Result<Running> {
    let dir = TempDir::new("sakha")?;
    let auth = Arc::new(AuthSession::new(Some(Identity {
        user_id: "user-1".to_string(),
        email: "seeker@example.com".to_string(),
        access_token: "jwt".to_string(),
    })));
    let (event_tx, events) = mpsc::unbounded_channel::<Event>();
    let (actions, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let controller = Arc::new(
        ConversationController::new(
            ControllerOptions::default(),
            Box::new(EchoBackend {}),
            Box::<MemoryStore>::default(),
            auth.clone(),
            KeyRotator::new(vec!["first-key".to_string()])?,
            PreferencesStore::new(dir.path().join("preferences.yaml")),
            event_tx.clone(),
        )
        .await,
    );

    let worker_controller = controller.clone();
    let worker_auth = auth.clone();
    let worker = tokio::spawn(async move {
        return ActionsService::start(
            worker_controller,
            worker_auth,
            None,
            event_tx,
            &mut action_rx,
        )
        .await;
    });

    return Ok(Running {
        controller,
        auth,
        actions,
        events,
        worker,
        _dir: dir,
    });
}

#[tokio::test]
async fn it_initializes_and_replies() -> Result<()> {
    let mut running = start().await?;

    running.actions.send(Action::Initialize())?;
    running
        .wait_for(|e| return matches!(e, Event::HistoryLoaded(_)))
        .await?;

    running.actions.send(Action::SelectPersona(Persona::Sister))?;
    running
        .wait_for(|e| return *e == Event::PersonaSelected(Persona::Sister))
        .await?;

    running.actions.send(Action::SendMessage("Namaste".to_string()))?;
    let reply = running
        .wait_for(|e| {
            return matches!(e, Event::MessageAdded(message) if message.is_from_assistant && message.content == "You said: Namaste");
        })
        .await?;
    assert!(matches!(reply, Event::MessageAdded(_)));

    drop(running.actions);
    running.worker.await??;

    return Ok(());
}

#[tokio::test]
async fn it_welcomes_again_after_clearing() -> Result<()> {
    let mut running = start().await?;

    running.actions.send(Action::Initialize())?;
    running.actions.send(Action::SelectPersona(Persona::Brother))?;
    running
        .wait_for(|e| return *e == Event::PersonaSelected(Persona::Brother))
        .await?;

    running.actions.send(Action::ClearHistory())?;
    running
        .wait_for(|e| return *e == Event::HistoryCleared())
        .await?;
    running
        .wait_for(|e| {
            return matches!(e, Event::MessageAdded(message) if message.content == prompts::welcome(5));
        })
        .await?;

    assert_eq!(running.controller.session().persona, None);

    return Ok(());
}

#[tokio::test]
async fn it_resets_when_the_session_ends() -> Result<()> {
    let mut running = start().await?;

    running.actions.send(Action::Initialize())?;
    running
        .wait_for(|e| return matches!(e, Event::HistoryLoaded(_)))
        .await?;

    running.actions.send(Action::SignOut())?;
    running.wait_for(|e| return *e == Event::SignedOut()).await?;

    assert!(running.controller.messages().is_empty());
    assert!(running.auth.subscribe().borrow().is_none());

    return Ok(());
}

#[tokio::test]
async fn it_reports_unconfigured_sign_in() -> Result<()> {
    let mut running = start().await?;

    running.actions.send(Action::SignIn(
        "seeker@example.com".to_string(),
        "secret".to_string(),
    ))?;
    let event = running
        .wait_for(|e| return matches!(e, Event::Toast(_)))
        .await?;

    match event {
        Event::Toast(toast) => assert_eq!(toast.level, ToastLevel::Error),
        _ => bail!("expected a toast"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_confirms_language_changes() -> Result<()> {
    let mut running = start().await?;

    running.actions.send(Action::SelectLanguage(Language::Marathi))?;
    running
        .wait_for(|e| return matches!(e, Event::Toast(toast) if toast.text == "Language set to marathi"))
        .await?;

    assert_eq!(running.controller.session().language, Language::Marathi);

    return Ok(());
}
