use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    articles::{ArticleStore, MemoryArticleStore, PgArticleStore},
    config::{AppConfig, Backend},
    identity::{IdentityProvider, MemoryIdentityProvider, PgIdentityProvider},
    media::{CloudinaryHost, ImageHost},
    moderation::InFlight,
    web::gate::{AdminPolicy, AuthGate},
};

#[derive(Clone)]
pub struct AppState {
    articles: Arc<dyn ArticleStore>,
    identity: Arc<dyn IdentityProvider>,
    images: Arc<dyn ImageHost>,
    gate: AuthGate,
    submissions: InFlight<Uuid>,
    reviews: InFlight<Uuid>,
}

impl AppState {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageHost>,
        gate: AuthGate,
    ) -> Self {
        Self {
            articles,
            identity,
            images,
            gate,
            submissions: InFlight::new(),
            reviews: InFlight::new(),
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let images: Arc<dyn ImageHost> = Arc::new(CloudinaryHost::new(
            config.media_upload_url.clone(),
            config.media_upload_preset.clone(),
        ));
        let gate = AuthGate::new(AdminPolicy::new(&config.admin_emails));

        let state = match &config.backend {
            Backend::Postgres { database_url } => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await
                    .context("failed to connect to Postgres")?;

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("failed to run database migrations")?;

                Self::new(
                    Arc::new(PgArticleStore::new(pool.clone())),
                    Arc::new(PgIdentityProvider::new(pool)),
                    images,
                    gate,
                )
            }
            Backend::Memory => {
                warn!("using in-memory storage; articles and accounts vanish on restart");
                Self::new(
                    Arc::new(MemoryArticleStore::new()),
                    Arc::new(MemoryIdentityProvider::new()),
                    images,
                    gate,
                )
            }
        };

        info!(backend = state.articles.backend_tag(), "article store ready");
        Ok(state)
    }

    /// Creates accounts for allow-listed admins that cannot sign in yet.
    ///
    /// Seeded accounts carry no role flag, so dropping an address from `ADMIN_EMAILS`
    /// revokes its access on the next start.
    pub async fn ensure_seed_admins(&self, config: &AppConfig) -> Result<()> {
        for email in &config.admin_emails {
            let created = self
                .identity
                .ensure_account(email, &config.admin_seed_password, false)
                .await
                .with_context(|| format!("failed to seed admin account {email}"))?;

            if created {
                if config.uses_default_seed_password() {
                    warn!(
                        %email,
                        "Seeded admin account with the default password 'change-me'. Update it promptly."
                    );
                } else {
                    info!(%email, "seeded admin account");
                }
            }
        }

        Ok(())
    }

    pub fn articles(&self) -> &dyn ArticleStore {
        self.articles.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn images(&self) -> &dyn ImageHost {
        self.images.as_ref()
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn submissions(&self) -> &InFlight<Uuid> {
        &self.submissions
    }

    pub fn reviews(&self) -> &InFlight<Uuid> {
        &self.reviews
    }
}
