//! Sign-in and sign-out CLI commands.

use clap::Args;
use tracing::warn;

use hrdesk_api::ApiClient;
use hrdesk_core::config::AppConfig;
use hrdesk_core::error::AppError;
use hrdesk_core::events::SessionEvent;
use hrdesk_session::rbac::default_route_for;
use hrdesk_session::{LoginOutcome, SessionController};
use hrdesk_store::TabId;

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (prompted when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Take over an existing session elsewhere without asking
    #[arg(long)]
    pub force: bool,

    /// Stay signed in and stream session events until Ctrl-C
    #[arg(short, long)]
    pub watch: bool,
}

/// Arguments for `logout`
#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Username to sign out (required when several sessions are stored)
    #[arg(short, long)]
    pub username: Option<String>,
}

/// Execute `login`: prompt for missing credentials, sign in, and offer the
/// takeover retry when the account is active elsewhere.
pub async fn login(args: &LoginArgs, config: &AppConfig) -> Result<(), AppError> {
    let controller = super::build_controller(config).await?;

    let username = match &args.username {
        Some(username) => username.clone(),
        None => dialoguer::Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

    let mut outcome = controller.login(&username, &password, args.force).await?;

    if outcome == LoginOutcome::AlreadyActiveElsewhere {
        let take_over = dialoguer::Confirm::new()
            .with_prompt("This account is signed in elsewhere. Sign out the other session and take over?")
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;
        if !take_over {
            println!("Login cancelled.");
            return Ok(());
        }
        outcome = controller.login(&username, &password, true).await?;
    }

    match outcome {
        LoginOutcome::LoggedIn(identity) => {
            println!("Signed in as {} ({})", identity.display_name, identity.role);
            println!("Landing route: {}", default_route_for(identity.role));
        }
        LoginOutcome::AlreadyActiveElsewhere => {
            // The takeover raced yet another login.
            return Err(AppError::conflict("Account is still signed in elsewhere"));
        }
    }

    if args.watch {
        watch_events(&controller).await;
    }
    Ok(())
}

/// Stream session events until Ctrl-C. Exiting does not sign out; the
/// stored credential stays adoptable, like closing a browser tab.
async fn watch_events(controller: &SessionController) {
    let mut events = controller.subscribe();
    println!("Watching session events; Ctrl-C exits without signing out.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Exiting; use `hrdesk logout` to sign out.");
                return;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::TokenRefreshed { username, expires_at }) => {
                    println!("[refresh] {} now expires at {}", username, expires_at);
                }
                Ok(SessionEvent::SessionRevoked { username, reason }) => {
                    println!("[revoked] {} ({})", username, reason);
                }
                Ok(SessionEvent::SessionExpired { username }) => {
                    println!("[expired] {}", username);
                }
                Ok(SessionEvent::RedirectScheduled { route }) => {
                    println!("[redirect] -> {}", route);
                    return;
                }
                Ok(SessionEvent::LoggedIn { username, role, .. }) => {
                    println!("[login] {} ({})", username, role);
                }
                Ok(SessionEvent::LoggedOut { username }) => {
                    println!("[logout] {}", username);
                    return;
                }
                Err(_) => return,
            },
        }
    }
}

/// Execute `logout`: best-effort server invalidation for a stored session,
/// then remove the record. Works without a live session in this process.
pub async fn logout(args: &LogoutArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = super::build_store(config).await?;
    let api = ApiClient::new(&config.api)?;

    let usernames = store.list_usernames().await?;
    let username = match (&args.username, usernames.as_slice()) {
        (Some(username), _) => username.clone(),
        (None, [only]) => only.clone(),
        (None, []) => {
            println!("No stored session.");
            return Ok(());
        }
        (None, several) => {
            return Err(AppError::validation(format!(
                "Several sessions are stored ({}); pass --username",
                several.join(", ")
            )));
        }
    };

    let Some(record) = store.get(&username).await? else {
        println!("No stored session for '{}'.", username);
        return Ok(());
    };

    if let Err(e) = api.logout(&record.token).await {
        warn!(username = %username, error = %e, "Server-side logout failed; clearing locally anyway");
    }
    store.remove(&username, TabId::new()).await?;
    println!("Signed out '{}'.", username);
    Ok(())
}

/// Execute `whoami`: list the stored sessions without touching the network.
pub async fn whoami(config: &AppConfig) -> Result<(), AppError> {
    let store = super::build_store(config).await?;

    let mut usernames = store.list_usernames().await?;
    usernames.sort();
    if usernames.is_empty() {
        println!("Not signed in.");
        return Ok(());
    }

    for username in usernames {
        let Some(record) = store.get(&username).await? else {
            continue;
        };
        let status = if record.credential().is_expired(0) {
            " (token expired)"
        } else {
            ""
        };
        println!(
            "{}  role={}  session={}  expires={}{}",
            record.user.username, record.user.role, record.session_id, record.token_expiry, status,
        );
    }
    Ok(())
}
