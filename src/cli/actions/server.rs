use crate::confide::{
    self,
    oauth::GoogleOauth,
    session::{SessionManager, DEFAULT_SESSION_TTL},
    store::{memory::MemoryStore, postgres::PgUserStore, UserStore},
    AppState,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub session_secret: SecretString,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<SecretString>,
    pub google_callback_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store: Arc<dyn UserStore> = match &args.dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(dsn)
                .await
                .context("Failed to connect to database")?;
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            warn!("No --dsn given, serving from memory; users are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let sessions = SessionManager::new(args.session_secret, DEFAULT_SESSION_TTL);

    let oauth = match (args.google_client_id, args.google_client_secret) {
        (Some(client_id), Some(client_secret)) => Some(GoogleOauth::new(
            client_id,
            client_secret,
            args.google_callback_url,
        )),
        _ => {
            info!("Google OAuth not configured; /auth/google will redirect to /login");
            None
        }
    };

    let state = Arc::new(AppState {
        store,
        sessions,
        oauth,
    });

    confide::new(args.port, state).await
}
