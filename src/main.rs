use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yatube::{
    db_helpers::{get_user_by_username, insert_user, set_staff_in_db},
    hash_password_argon2, init_db, run_app, AppState, Config, NewUser,
};

/// Yatube blogging server.
#[derive(Parser, Debug)]
#[command(name = "yatube", about = "Yatube blogging server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server (default).
    Serve,
    /// Create a staff account, or grant staff rights to an existing one.
    Createsuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = init_db(&config.database_url).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let listener = TcpListener::bind(config.bind_address)
                .with_context(|| format!("Could not bind {}", config.bind_address))?;
            let state = Arc::new(AppState::new(config, pool)?);
            run_app(state, listener).await
        }
        Command::Createsuperuser {
            username,
            email,
            password,
        } => {
            if get_user_by_username(&pool, &username).await?.is_some() {
                set_staff_in_db(&pool, &username, true).await?;
                tracing::info!("Granted staff rights to {}", username);
                return Ok(());
            }
            let new_user = NewUser {
                username,
                email,
                password: hash_password_argon2(password).await?,
                is_staff: true,
            };
            insert_user(&pool, &new_user).await?;
            tracing::info!("Created staff user {}", new_user.username);
            Ok(())
        }
    }
}
