use anyhow::Result;
use confide::cli::{actions, start};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    actions::execute(action).await
}
