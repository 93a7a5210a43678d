pub mod server;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> anyhow::Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
