#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Identity;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorResponse {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

/// Password sign in against Supabase's GoTrue endpoints.
pub struct SupabaseAuth {
    url: String,
    anon_key: String,
}

impl Default for SupabaseAuth {
    fn default() -> SupabaseAuth {
        return SupabaseAuth::new(
            &Config::get(ConfigKey::SupabaseURL),
            &Config::get(ConfigKey::SupabaseAnonKey),
        );
    }
}

impl SupabaseAuth {
    pub fn new(url: &str, anon_key: &str) -> SupabaseAuth {
        return SupabaseAuth {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        };
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let res = reqwest::Client::new()
            .post(format!("{url}/auth/v1/token", url = self.url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.json::<AuthErrorResponse>().await.unwrap_or_default();
            let reason = body
                .error_description
                .or(body.msg)
                .unwrap_or_else(|| return format!("status {status}"));
            tracing::error!(status, reason, "Sign in failed");
            bail!("Sign in failed: {reason}");
        }

        let token = res.json::<TokenResponse>().await?;
        return Ok(Identity {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| return email.to_string()),
            access_token: token.access_token,
        });
    }

    pub async fn sign_out(&self, identity: &Identity) -> Result<()> {
        let res = reqwest::Client::new()
            .post(format!("{url}/auth/v1/logout", url = self.url))
            .header("apikey", &self.anon_key)
            .header(
                "Authorization",
                format!("Bearer {token}", token = identity.access_token),
            )
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Sign out failed");
            bail!("Sign out failed: status {}", res.status().as_u16());
        }

        return Ok(());
    }
}
