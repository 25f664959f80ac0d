#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiKeys,
    ApiURL,
    ConfigFile,
    DailyLimit,
    Email,
    Model,
    Password,
    PreferencesFile,
    Referer,
    RequestTimeout,
    SupabaseAnonKey,
    SupabaseURL,
    Title,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Comma separated values, with blanks removed.
    pub fn get_list(key: ConfigKey) -> Vec<String> {
        return Config::get(key)
            .split(',')
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty())
            .collect();
    }

    pub fn get_u64(key: ConfigKey) -> Result<u64> {
        let val = Config::get(key);
        if let Ok(parsed) = val.parse::<u64>() {
            return Ok(parsed);
        }

        bail!(format!("Config key '{key}' must be a positive integer, got '{val}'"));
    }

    fn cache_dir() -> path::PathBuf {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("sakha");
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("sakha/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/sakha/config.toml");

        let preferences_path = Config::cache_dir().join("preferences.yaml");

        let res = match key {
            ConfigKey::ApiKeys => "",
            ConfigKey::ApiURL => "https://openrouter.ai/api/v1",
            ConfigKey::DailyLimit => "5",
            ConfigKey::Model => "deepseek/deepseek-r1:free",
            ConfigKey::Referer => "http://localhost",
            ConfigKey::RequestTimeout => "15000",
            ConfigKey::SupabaseAnonKey => "",
            ConfigKey::SupabaseURL => "",
            ConfigKey::Title => "Sakha Chatbot",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::Email => "",
            ConfigKey::Password => "",
            ConfigKey::PreferencesFile => return preferences_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        if !arg.get_possible_values().is_empty() {
                            possible_values = arg
                                .get_possible_values()
                                .iter()
                                .map(|e| return e.get_name().to_string())
                                .collect::<Vec<String>>();
                        }
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    } else if let Some(val_arr) = val.as_array() {
                        let joined = val_arr
                            .iter()
                            .filter_map(|e| return e.as_str())
                            .collect::<Vec<&str>>()
                            .join(",");
                        Config::set(key, &joined);
                    } else {
                        bail!(format!("config.toml has an invalid value for key '{key}'"));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::get_u64(ConfigKey::DailyLimit)?;
        Config::get_u64(ConfigKey::RequestTimeout)?;

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiURL),
            api_keys = Config::get_list(ConfigKey::ApiKeys).len(),
            model = Config::get(ConfigKey::Model),
            daily_limit = Config::get(ConfigKey::DailyLimit),
            supabase_url = Config::get(ConfigKey::SupabaseURL),
            preferences_file = Config::get(ConfigKey::PreferencesFile),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::ApiKeys {
                    return Some(
                        "# Upstream API keys, rotated whenever one runs out of quota.\n# api-keys = [\"\"]"
                            .to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg.get_help()?.to_string();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
