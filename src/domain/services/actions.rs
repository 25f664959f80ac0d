#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::AuthSession;
use super::ConversationController;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::IdentityProvider;
use crate::domain::models::Toast;
use crate::infrastructure::identity::SupabaseAuth;

async fn sign_in(
    client: Option<&SupabaseAuth>,
    auth: &AuthSession,
    tx: &mpsc::UnboundedSender<Event>,
    email: &str,
    password: &str,
) -> Result<()> {
    let client = match client {
        Some(client) => client,
        None => {
            tx.send(Event::Toast(Toast::error(
                "Sign in is not configured. Set `supabase-url` and `supabase-anon-key`.",
            )))?;
            return Ok(());
        }
    };

    match client.sign_in_with_password(email, password).await {
        Ok(identity) => {
            auth.sign_in(identity);
            tx.send(Event::Toast(Toast::success("Signed in successfully")))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "Sign in failed");
            tx.send(Event::Toast(Toast::error(&err.to_string())))?;
        }
    }

    return Ok(());
}

async fn sign_out(client: Option<&SupabaseAuth>, auth: &AuthSession) {
    if let (Some(client), Some(identity)) = (client, auth.current()) {
        if let Err(err) = client.sign_out(&identity).await {
            tracing::warn!(error = ?err, "Remote sign out failed, dropping local session anyway");
        }
    }

    auth.sign_out();
}

/// Routes front-end actions and identity changes into the controller.
pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        controller: Arc<ConversationController>,
        auth: Arc<AuthSession>,
        auth_client: Option<SupabaseAuth>,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let mut sessions = auth.subscribe();

        loop {
            let action = tokio::select! {
                changed = sessions.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }

                    let signed_in = sessions.borrow_and_update().is_some();
                    if signed_in {
                        controller.initialize().await?;
                    } else {
                        controller.sign_out().await?;
                    }
                    continue;
                }
                action = rx.recv() => action,
            };

            let action = match action {
                Some(action) => action,
                None => return Ok(()),
            };

            match action {
                Action::Cancel() => {
                    controller.cancel();
                }
                Action::ClearHistory() => {
                    if controller.clear_history().await? {
                        controller.initialize().await?;
                    }
                }
                Action::DeleteMessage(id) => {
                    controller.delete_message(&id).await?;
                }
                Action::Initialize() => {
                    controller.initialize().await?;
                }
                Action::SelectLanguage(language) => {
                    controller.set_language(language).await;
                    tx.send(Event::Toast(Toast::success(&format!(
                        "Language set to {language}"
                    ))))?;
                }
                Action::SelectPersona(persona) => {
                    controller.select_persona(persona).await?;
                }
                Action::SendMessage(text) => {
                    let worker = controller.clone();
                    tokio::spawn(async move {
                        if let Err(err) = worker.send_user_message(&text).await {
                            tracing::error!(error = ?err, "Send failed");
                        }
                    });
                }
                Action::SignIn(email, password) => {
                    sign_in(auth_client.as_ref(), &auth, &tx, &email, &password).await?;
                }
                Action::SignOut() => {
                    sign_out(auth_client.as_ref(), &auth).await;
                }
            }
        }
    }
}
