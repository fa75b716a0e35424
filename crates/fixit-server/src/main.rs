//! fixit server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API.
//!
//! # Bootstrapping
//!
//! The first ADMIN account cannot be created through the API (user creation
//! is itself admin-gated), so the binary has a one-shot mode that writes it
//! through the store directly:
//!
//! ```text
//! fixit-server --create-admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use fixit_core::{
  store::RequestStore as _,
  user::{NewUser, Role},
};
use fixit_server::{AppState, ServerConfig, auth};
use fixit_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "fixit maintenance-request server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an ADMIN account from stdin input and exit.
  #[arg(long)]
  create_admin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FIXIT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path and open the store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: bootstrap the first admin and exit.
  if cli.create_admin {
    let username = prompt("Username: ")?;
    let email = prompt("Email: ")?;
    let password = prompt("Password: ")?;
    let password_hash = auth::hash_password(&password)?;

    let user = store
      .create_user(NewUser { username, email, role: Role::Admin, password_hash })
      .await
      .context("failed to create admin user")?;
    tracing::info!("created admin user {} ({})", user.username, user.email);
    return Ok(());
  }

  let state = AppState { store: Arc::new(store) };
  let app = fixit_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin with a prompt.
fn prompt(label: &str) -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("{label}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
