#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio::task;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Identity;
use crate::domain::models::IdentityProvider;
use crate::domain::models::MessageStoreBox;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::AuthSession;
use crate::domain::services::ControllerOptions;
use crate::domain::services::ConversationController;
use crate::domain::services::KeyRotator;
use crate::domain::services::PreferencesStore;
use crate::infrastructure::backends::OpenRouter;
use crate::infrastructure::identity::SupabaseAuth;
use crate::infrastructure::persistence::MemoryStore;
use crate::infrastructure::persistence::SupabaseStore;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! Sakha has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn controller_options() -> Result<ControllerOptions> {
    return Ok(ControllerOptions {
        model: Config::get(ConfigKey::Model),
        daily_limit: u32::try_from(Config::get_u64(ConfigKey::DailyLimit)?)?,
        request_timeout: Duration::from_millis(Config::get_u64(ConfigKey::RequestTimeout)?),
        ..ControllerOptions::default()
    });
}

/// Identity used when no Supabase project is configured.
fn offline_identity() -> Identity {
    return Identity {
        user_id: "local".to_string(),
        email: "offline@localhost".to_string(),
        access_token: "".to_string(),
    };
}

async fn sign_in_from_config(client: &SupabaseAuth, auth: &AuthSession) {
    let email = Config::get(ConfigKey::Email);
    let password = Config::get(ConfigKey::Password);
    if email.is_empty() || password.is_empty() {
        return;
    }

    match client.sign_in_with_password(&email, &password).await {
        Ok(identity) => auth.sign_in(identity),
        Err(err) => {
            tracing::warn!(error = ?err, "Startup sign in failed");
            eprintln!("{}", format!("{err}").yellow());
        }
    }
}

async fn run() -> Result<()> {
    let keys = KeyRotator::new(Config::get_list(ConfigKey::ApiKeys))?;
    let options = controller_options()?;
    let auth = Arc::new(AuthSession::default());

    let (store, auth_client): (MessageStoreBox, Option<SupabaseAuth>) =
        if Config::get(ConfigKey::SupabaseURL).is_empty() {
            tracing::info!("No Supabase URL configured, keeping history in memory");
            auth.sign_in(offline_identity());
            (Box::<MemoryStore>::default(), None)
        } else {
            let client = SupabaseAuth::default();
            sign_in_from_config(&client, &auth).await;
            (Box::<SupabaseStore>::default(), Some(client))
        };

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let controller = Arc::new(
        ConversationController::new(
            options,
            Box::<OpenRouter>::default(),
            store,
            auth.clone(),
            keys,
            PreferencesStore::default(),
            event_tx.clone(),
        )
        .await,
    );
    let signed_in = auth.current().is_some();

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::start(controller, auth, auth_client, event_tx, &mut action_rx)
            .await;
    });

    let ui_future = ui::start(action_tx, &mut event_rx, signed_in);

    return tokio::select!(
        res = background_futures.join_next() => match res {
            Some(res) => res?,
            None => Ok(()),
        },
        res = ui_future => res,
    );
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("SAKHA_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("sakha")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("sakha")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    if let Err(err) = run().await {
        handle_error(err);
    }

    process::exit(0);
}
