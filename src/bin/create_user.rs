use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::info;

use pynnacle_api::{
    auth::{hash_password, user},
    config, db,
};

/// Creates a staff login, or resets the password of an existing one.
#[derive(Debug, Parser)]
#[command(name = "create-user", version, about)]
struct Cli {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    /// Read from PYNNACLE_PASSWORD when omitted
    #[arg(long, env = "PYNNACLE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Overrides `database_url` from the configuration
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let username = cli.username.trim();
    if username.is_empty() {
        bail!("username must not be blank");
    }
    if cli.password.len() < 8 {
        bail!("password must be at least 8 characters");
    }

    let database_url = match cli.database_url {
        Some(url) => url,
        None => config::load_config()
            .context("failed to load configuration")?
            .database_url,
    };
    let pool = db::establish_connection(&database_url)
        .await
        .context("failed to connect to database")?;

    let password_hash = hash_password(&cli.password).map_err(|e| anyhow!(e.to_string()))?;
    let account = user::upsert_account(&pool, username, cli.email.trim(), password_hash)
        .await
        .context("failed to save account")?;

    info!(username = %account.username, id = %account.id, "staff account ready");
    db::close_pool(pool).await?;
    Ok(())
}
