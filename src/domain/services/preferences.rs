#[cfg(test)]
#[path = "preferences_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Preferences;

/// YAML snapshot of persona, language and quota counters.
pub struct PreferencesStore {
    pub file_path: path::PathBuf,
}

impl Default for PreferencesStore {
    fn default() -> PreferencesStore {
        return PreferencesStore::new(path::PathBuf::from(Config::get(
            ConfigKey::PreferencesFile,
        )));
    }
}

impl PreferencesStore {
    pub fn new(file_path: path::PathBuf) -> PreferencesStore {
        return PreferencesStore { file_path };
    }

    /// Missing or unreadable files fall back to defaults.
    pub async fn load(&self) -> Preferences {
        if !self.file_path.exists() {
            return Preferences::default();
        }

        let res = fs::read_to_string(&self.file_path)
            .await
            .map_err(anyhow::Error::from)
            .and_then(|payload| {
                return serde_yaml::from_str::<Preferences>(&payload).map_err(anyhow::Error::from);
            });

        return match res {
            Ok(preferences) => preferences,
            Err(err) => {
                tracing::warn!(error = ?err, path = ?self.file_path, "Ignoring unreadable preferences file");
                Preferences::default()
            }
        };
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<()> {
        let payload = serde_yaml::to_string(preferences)?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }

    pub async fn clear(&self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.file_path).await?;
        return Ok(());
    }
}
