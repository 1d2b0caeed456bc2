//! Permission table query command.

use clap::Args;

use hrdesk_core::config::AppConfig;
use hrdesk_core::error::AppError;
use hrdesk_entity::Role;
use hrdesk_session::rbac::default_route_for;
use hrdesk_session::PermissionTable;

/// Arguments for `permissions`
#[derive(Debug, Args)]
pub struct PermissionsArgs {
    /// Role to inspect (defaults to the stored session's role)
    #[arg(short, long)]
    pub role: Option<Role>,
}

/// Execute `permissions`: print the landing route and permission set of a
/// role, defaulting to the role of the single stored session.
pub async fn permissions(args: &PermissionsArgs, config: &AppConfig) -> Result<(), AppError> {
    let role = match args.role {
        Some(role) => role,
        None => stored_role(config).await?,
    };

    let table = PermissionTable::new();
    let mut names: Vec<String> = table
        .permissions_for_role(role)
        .into_iter()
        .map(|permission| {
            serde_json::to_string(&permission)
                .map(|name| name.trim_matches('"').to_string())
                .unwrap_or_else(|_| format!("{:?}", permission))
        })
        .collect();
    names.sort();

    println!("Role: {}", role);
    println!("Landing route: {}", default_route_for(role));
    println!("Permissions ({}):", names.len());
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

/// The role of the single stored session, when exactly one exists.
async fn stored_role(config: &AppConfig) -> Result<Role, AppError> {
    let store = super::build_store(config).await?;
    let usernames = store.list_usernames().await?;
    match usernames.as_slice() {
        [only] => {
            let record = store
                .get(only)
                .await?
                .ok_or_else(|| AppError::validation("No stored session; pass --role"))?;
            Ok(record.user.role)
        }
        [] => Err(AppError::validation("No stored session; pass --role")),
        _ => Err(AppError::validation(
            "Several sessions are stored; pass --role",
        )),
    }
}
