use std::env;

use anyhow::{Context, Result, anyhow};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SEED_PASSWORD: &str = "change-me";
const DEFAULT_MEDIA_UPLOAD_URL: &str = "https://api.cloudinary.com/v1_1/dl5yadj7c/image/upload";
const DEFAULT_MEDIA_UPLOAD_PRESET: &str = "searchsphere_upload";

/// Where articles and accounts live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend: Backend,
    pub admin_emails: Vec<String>,
    pub admin_seed_password: String,
    pub media_upload_url: String,
    pub media_upload_preset: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        let backend = match lookup("ARTICLE_BACKEND")
            .as_deref()
            .map(str::trim)
            .unwrap_or("postgres")
        {
            "postgres" => {
                let database_url =
                    lookup("DATABASE_URL").context("DATABASE_URL env var is missing")?;
                Backend::Postgres { database_url }
            }
            "memory" => Backend::Memory,
            other => return Err(anyhow!("unknown ARTICLE_BACKEND `{other}`")),
        };

        let admin_emails = lookup("ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            port,
            backend,
            admin_emails,
            admin_seed_password: lookup("ADMIN_SEED_PASSWORD")
                .unwrap_or_else(|| DEFAULT_SEED_PASSWORD.to_string()),
            media_upload_url: lookup("MEDIA_UPLOAD_URL")
                .unwrap_or_else(|| DEFAULT_MEDIA_UPLOAD_URL.to_string()),
            media_upload_preset: lookup("MEDIA_UPLOAD_PRESET")
                .unwrap_or_else(|| DEFAULT_MEDIA_UPLOAD_PRESET.to_string()),
        })
    }

    pub fn uses_default_seed_password(&self) -> bool {
        self.admin_seed_password == DEFAULT_SEED_PASSWORD
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}
