//! SurrealDB connection management.

use guardia_core::error::{GuardiaError, GuardiaResult};
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "guardia".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Defaults overridden by `GUARDIA_DB_*` environment variables.
    pub fn from_env() -> GuardiaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GuardiaResult<Self> {
        let mut config = Self::default();
        let fields: [(&str, &mut String); 5] = [
            ("GUARDIA_DB_URL", &mut config.url),
            ("GUARDIA_DB_NAMESPACE", &mut config.namespace),
            ("GUARDIA_DB_DATABASE", &mut config.database),
            ("GUARDIA_DB_USERNAME", &mut config.username),
            ("GUARDIA_DB_PASSWORD", &mut config.password),
        ];
        for (key, slot) in fields {
            if let Some(value) = lookup(key) {
                if value.trim().is_empty() {
                    return Err(GuardiaError::Validation {
                        message: format!("{key} must not be empty"),
                    });
                }
                *slot = value;
            }
        }
        Ok(config)
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, sign in as root and select the configured namespace and
    /// database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Connected to SurrealDB");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
