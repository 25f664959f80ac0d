#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::future;
use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use strum::VariantNames;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::time;
use tokio::time::Instant;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::Persona;
use crate::domain::models::SlashCommand;
use crate::domain::models::ToastLevel;

pub const CONFIRM_WINDOW: Duration = Duration::from_secs(3);
pub const DONATION_DELAY: Duration = Duration::from_secs(5);

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /persona (/p) [sakha,sakhi] - Tell Sakha how to address you. Only possible before your first message.
- /language (/lang, /l) [hinglish,english,marathi] - Sets the reply language.
- /history (/hi) - Lists the conversation with the number of each message.
- /delete (/d) [NUMBER,ID] - Deletes a single message. Run twice within 3 seconds to confirm.
- /clear (/c) - Deletes the entire conversation. Run twice within 3 seconds to confirm.
- /cancel (/x) - Stops waiting for the reply in progress.
- /signin (/login) [EMAIL] [PASSWORD] - Signs in to your account.
- /signout (/logout) - Signs out and forgets local preferences.
- /quit /exit (/q) - Exit Sakha.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destructive {
    Clear,
    Delete(String),
}

/// Destructive commands run only when repeated within `CONFIRM_WINDOW`.
#[derive(Default)]
pub struct ConfirmGate {
    armed: Option<(Destructive, Instant)>,
}

impl ConfirmGate {
    /// True when `intent` was already armed inside the window, otherwise arms
    /// it.
    pub fn confirm(&mut self, intent: Destructive, now: Instant) -> bool {
        if let Some((armed, at)) = self.armed.take() {
            if armed == intent && now.duration_since(at) <= CONFIRM_WINDOW {
                return true;
            }
        }

        self.armed = Some((intent, now));
        return false;
    }
}

/// Local copy of the conversation as announced by events.
#[derive(Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
}

impl Transcript {
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::HistoryLoaded(messages) => {
                self.messages = messages.clone();
            }
            Event::MessageAdded(message) => {
                self.messages.push(message.clone());
            }
            Event::MessageDeleted(id) => {
                self.messages.retain(|e| return &e.id != id);
            }
            Event::HistoryCleared() | Event::SignedOut() => {
                self.messages.clear();
            }
            _ => {}
        }
    }

    /// Accepts either a 1-based position from `/history` or a message id.
    pub fn resolve_id(&self, arg: &str) -> String {
        if let Ok(position) = arg.parse::<usize>() {
            if position >= 1 && position <= self.messages.len() {
                return self.messages[position - 1].id.to_string();
            }
        }

        return arg.to_string();
    }

    pub fn listing(&self) -> String {
        if self.messages.is_empty() {
            return "No messages yet.".to_string();
        }

        return self
            .messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                let author = if message.is_from_assistant {
                    "Sakha"
                } else {
                    "You"
                };
                let mut line = message.content.lines().next().unwrap_or_default().to_string();
                if line.chars().count() > 60 {
                    line = format!("{}...", line.chars().take(57).collect::<String>());
                }

                return format!("({}) [{}] {author}: {line}", idx + 1, message.id);
            })
            .collect::<Vec<String>>()
            .join("\n");
    }
}

pub fn donation_text() -> String {
    let text = r#"
Support Sakha
Help us maintain and improve this spiritual companion by making a small contribution.
UPI ID: supportsakha@ybl
QR code: https://res.cloudinary.com/dlpauwdui/image/upload/fl_preserve_transparency/v1743579658/my_qr_twnu7d.jpg?_s=public-apps
        "#;

    return text.trim().to_string();
}

/// Shows the donation notice once per run, `DONATION_DELAY` after a signed
/// in user first has a conversation on screen.
pub struct DonationPrompt {
    signed_in: bool,
    due: Option<Instant>,
    shown: bool,
}

impl DonationPrompt {
    pub fn new(signed_in: bool) -> DonationPrompt {
        return DonationPrompt {
            signed_in,
            due: None,
            shown: false,
        };
    }

    pub fn observe(&mut self, event: &Event, transcript: &Transcript, now: Instant) {
        match event {
            Event::HistoryLoaded(_) => {
                self.signed_in = true;
            }
            Event::SignedOut() | Event::AuthenticationRequired() => {
                self.signed_in = false;
            }
            _ => {}
        }

        if self.shown || !self.signed_in || transcript.messages.is_empty() {
            self.due = None;
            return;
        }

        if self.due.is_none() {
            self.due = Some(now + DONATION_DELAY);
        }
    }

    pub fn due(&self) -> Option<Instant> {
        return self.due;
    }

    /// True exactly once, the first time it is asked at or after the due time.
    pub fn take_due(&mut self, now: Instant) -> bool {
        let ready = match self.due {
            Some(due) => now >= due,
            None => false,
        };
        if self.shown || !ready {
            return false;
        }

        self.shown = true;
        self.due = None;
        return true;
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => {
            time::sleep_until(due).await;
        }
        None => {
            future::pending::<()>().await;
        }
    }
}

fn format_message(message: &Message) -> String {
    if message.is_from_assistant {
        let name = "Sakha ›";
        return format!(
            "\n{} {}\n",
            name.if_supports_color(Stream::Stdout, |e| return e.bright_yellow()),
            message.content
        );
    }

    let name = "You ›";
    return format!(
        "{} {}",
        name.if_supports_color(Stream::Stdout, |e| return e.cyan()),
        message.content
    );
}

fn notice(text: &str) -> String {
    return text
        .if_supports_color(Stream::Stdout, |e| return e.dimmed())
        .to_string();
}

/// What to print for an event, if anything. The user's own lines are already
/// on screen so they are not echoed.
pub fn render_event(event: &Event) -> Option<String> {
    return match event {
        Event::AuthenticationRequired() => Some(notice(
            "Please sign in first with /signin <email> <password>.",
        )),
        Event::AssistantComposing(true) => Some(notice("Sakha is composing...")),
        Event::AssistantComposing(false) => None,
        Event::HistoryCleared() => None,
        Event::HistoryLoaded(messages) => {
            if messages.is_empty() {
                return None;
            }

            Some(
                messages
                    .iter()
                    .map(format_message)
                    .collect::<Vec<String>>()
                    .join("\n"),
            )
        }
        Event::MessageAdded(message) => {
            if !message.is_from_assistant {
                return None;
            }

            Some(format_message(message))
        }
        Event::MessageDeleted(_) => None,
        Event::PersonaSelected(persona) => Some(notice(&format!(
            "Sakha will call you {}.",
            persona.english_name()
        ))),
        Event::SignedOut() => Some(notice("Signed out.")),
        Event::Toast(toast) => match toast.level {
            ToastLevel::Success => Some(
                toast
                    .text
                    .if_supports_color(Stream::Stdout, |e| return e.green())
                    .to_string(),
            ),
            ToastLevel::Error => Some(
                toast
                    .text
                    .if_supports_color(Stream::Stdout, |e| return e.red())
                    .to_string(),
            ),
        },
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn handle_input(
    line: &str,
    transcript: &Transcript,
    gate: &mut ConfirmGate,
    tx: &mpsc::UnboundedSender<Action>,
    now: Instant,
) -> Result<Flow> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(Flow::Continue);
    }

    let command = match SlashCommand::parse(text) {
        Some(command) => command,
        None => {
            if text.starts_with('/') {
                println!("{}", notice("Unknown command. Run /help for a list."));
                return Ok(Flow::Continue);
            }

            tx.send(Action::SendMessage(text.to_string()))?;
            return Ok(Flow::Continue);
        }
    };

    if command.is_quit() {
        return Ok(Flow::Quit);
    }

    if command.is_help() {
        println!("{}", help_text());
    } else if command.is_cancel() {
        tx.send(Action::Cancel())?;
    } else if command.is_history() {
        println!("{}", transcript.listing());
    } else if command.is_clear() {
        if gate.confirm(Destructive::Clear, now) {
            tx.send(Action::ClearHistory())?;
        } else {
            println!(
                "{}",
                notice("This deletes the whole conversation. Run /clear again within 3 seconds to confirm.")
            );
        }
    } else if command.is_delete() {
        let id = transcript.resolve_id(command.first_arg().unwrap_or_default());
        if gate.confirm(Destructive::Delete(id.to_string()), now) {
            tx.send(Action::DeleteMessage(id))?;
        } else {
            println!(
                "{}",
                notice("Run the same /delete again within 3 seconds to confirm.")
            );
        }
    } else if command.is_language() {
        match command.first_arg().and_then(Language::parse) {
            Some(language) => {
                tx.send(Action::SelectLanguage(language))?;
            }
            None => {
                println!(
                    "{}",
                    notice(&format!(
                        "Choose one of: {}",
                        Language::VARIANTS.join(", ").to_lowercase()
                    ))
                );
            }
        }
    } else if command.is_persona() {
        match command.first_arg().and_then(Persona::detect) {
            Some(persona) => {
                tx.send(Action::SelectPersona(persona))?;
            }
            None => {
                println!("{}", notice("Choose one of: sakha, sakhi"));
            }
        }
    } else if command.is_sign_in() {
        tx.send(Action::SignIn(
            command.args[0].to_string(),
            command.args[1].to_string(),
        ))?;
    } else if command.is_sign_out() {
        tx.send(Action::SignOut())?;
    }

    return Ok(Flow::Continue);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
    signed_in: bool,
) -> Result<()> {
    println!(
        "{}",
        "Sakha · your guide to the Bhagavad Gita"
            .if_supports_color(Stream::Stdout, |e| return e.bold())
    );
    println!("{}", notice("Type a message, or /help for commands."));
    if !signed_in {
        println!(
            "{}",
            notice("Sign in with /signin <email> <password> to begin.")
        );
    }

    let mut transcript = Transcript::default();
    let mut gate = ConfirmGate::default();
    let mut donation = DonationPrompt::new(signed_in);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tx.send(Action::Initialize())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => return Ok(()),
                };

                let flow = handle_input(&line, &transcript, &mut gate, &tx, Instant::now())?;
                if flow == Flow::Quit {
                    return Ok(());
                }
            }
            event = rx.recv() => {
                let event = match event {
                    Some(event) => event,
                    None => return Ok(()),
                };

                transcript.apply(&event);
                donation.observe(&event, &transcript, Instant::now());
                if let Some(text) = render_event(&event) {
                    println!("{text}");
                }
            }
            _ = sleep_until_due(donation.due()) => {
                if donation.take_due(Instant::now()) {
                    println!(
                        "\n{}\n",
                        donation_text().if_supports_color(Stream::Stdout, |e| return e.magenta())
                    );
                }
            }
        }
    }
}
