//! CLI command definitions and dispatch.

pub mod auth;
pub mod rbac;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use hrdesk_api::ApiClient;
use hrdesk_core::config::{AppConfig, StoreBackend};
use hrdesk_core::error::AppError;
use hrdesk_session::SessionController;
use hrdesk_store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

/// HRDesk — HR management console client
#[derive(Debug, Parser)]
#[command(name = "hrdesk", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (overrides HRDESK_ENV)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in to the HR server
    Login(auth::LoginArgs),
    /// Sign out a stored session
    Logout(auth::LogoutArgs),
    /// Show stored sessions
    Whoami,
    /// Show the permission set and landing route for a role
    Permissions(rbac::PermissionsArgs),
}

impl Cli {
    /// The configuration environment: flag, then HRDESK_ENV, then default.
    pub fn environment(&self) -> String {
        self.env
            .clone()
            .or_else(|| std::env::var("HRDESK_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Login(args) => auth::login(args, config).await,
            Commands::Logout(args) => auth::logout(args, config).await,
            Commands::Whoami => auth::whoami(config).await,
            Commands::Permissions(args) => rbac::permissions(args, config).await,
        }
    }
}

/// Helper: build the credential store selected by configuration
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn CredentialStore>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryCredentialStore::new())),
        StoreBackend::File => {
            let store = FileCredentialStore::open(&config.store.path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Helper: build a session controller over the configured store and API
pub async fn build_controller(config: &AppConfig) -> Result<SessionController, AppError> {
    let api = ApiClient::new(&config.api)?;
    let store = build_store(config).await?;
    Ok(SessionController::new(api, store, config.session.clone()))
}
