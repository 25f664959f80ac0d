use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Sakha")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Sakha with environment variable RUST_LOG=sakha")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn config_arg(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("sakha")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("SAKHA_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(config_arg(
            ConfigKey::ApiKeys,
            "SAKHA_API_KEYS",
            "Comma separated OpenRouter API keys. Keys are rotated whenever one runs out of quota.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::ApiURL,
            "SAKHA_API_URL",
            format!("Base URL of the OpenAI compatible chat completions API. [default: {}]", Config::default(ConfigKey::ApiURL)),
        ))
        .arg(config_arg(
            ConfigKey::Model,
            "SAKHA_MODEL",
            format!("Model identifier sent with every completion request. [default: {}]", Config::default(ConfigKey::Model)),
        ).short('m'))
        .arg(config_arg(
            ConfigKey::Referer,
            "SAKHA_REFERER",
            format!("Value of the HTTP-Referer header sent upstream. [default: {}]", Config::default(ConfigKey::Referer)),
        ))
        .arg(config_arg(
            ConfigKey::Title,
            "SAKHA_TITLE",
            format!("Value of the X-Title header sent upstream. [default: {}]", Config::default(ConfigKey::Title)),
        ))
        .arg(config_arg(
            ConfigKey::DailyLimit,
            "SAKHA_DAILY_LIMIT",
            format!("Messages a user may send per calendar day. [default: {}]", Config::default(ConfigKey::DailyLimit)),
        ))
        .arg(config_arg(
            ConfigKey::RequestTimeout,
            "SAKHA_REQUEST_TIMEOUT",
            format!("Time to wait in milliseconds for a single completion attempt. [default: {}]", Config::default(ConfigKey::RequestTimeout)),
        ))
        .arg(config_arg(
            ConfigKey::SupabaseURL,
            "SAKHA_SUPABASE_URL",
            "Supabase project URL storing accounts and messages. Leave empty to run offline with an in-memory history.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::SupabaseAnonKey,
            "SAKHA_SUPABASE_ANON_KEY",
            "Supabase anonymous API key.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::Email,
            "SAKHA_EMAIL",
            "Account email used to sign in on startup.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::Password,
            "SAKHA_PASSWORD",
            "Account password used to sign in on startup.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::PreferencesFile,
            "SAKHA_PREFERENCES_FILE",
            format!("Where persona, language and daily counters are kept. [default: {}]", Config::default(ConfigKey::PreferencesFile)),
        ));
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir()
                        .unwrap_or_else(std::env::temp_dir)
                        .join("sakha/debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
