use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(3000);
    let dsn = matches.get_one::<String>("dsn").cloned();

    let session_secret = matches
        .get_one::<String>("session-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --session-secret")?;

    let google_client_id = matches.get_one::<String>("google-client-id").cloned();
    let google_client_secret = matches
        .get_one::<String>("google-client-secret")
        .cloned()
        .map(SecretString::from);
    let google_callback_url = matches
        .get_one::<String>("google-callback-url")
        .cloned()
        .context("missing argument: --google-callback-url")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret,
        google_client_id,
        google_client_secret,
        google_callback_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars([("CONFIDE_DSN", None::<String>)], || {
            let matches = commands::new().get_matches_from(vec![
                "confide",
                "--port",
                "3001",
                "--session-secret",
                "sekret",
                "--google-client-id",
                "client-id",
                "--google-client-secret",
                "client-secret",
            ]);

            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected server action");
            };

            assert_eq!(args.port, 3001);
            assert_eq!(args.dsn, None);
            assert_eq!(args.session_secret.expose_secret(), "sekret");
            assert_eq!(args.google_client_id.as_deref(), Some("client-id"));
            assert_eq!(
                args.google_callback_url,
                "http://localhost:3000/auth/google/secrets"
            );
        });
    }
}
