//! User and role directory: accounts, the role relation, and the auth
//! endpoints that establish an actor identity.

pub mod auth_routes;
pub mod roles;
pub mod users;

use log::{info, warn};

use crate::core::shared::utils::DbPool;

/// Create an administrator account from `ADMIN_EMAIL`/`ADMIN_PASSWORD` if one
/// does not exist yet. Skipped silently when the variables are unset.
pub fn bootstrap_admin(pool: &DbPool) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let mut conn = pool.get()?;

    if users::find_by_email(&mut conn, &email)?.is_some() {
        return Ok(());
    }

    let user = users::create_user(&mut conn, "Administrator", &email, &password)
        .map_err(|e| anyhow::anyhow!("Admin bootstrap failed: {e}"))?;

    match roles::find_by_name(&mut conn, roles::ROLE_ADMIN)? {
        Some(admin_role) => {
            roles::assign_role(&mut conn, user.id, admin_role.id)?;
            info!("Bootstrapped admin account {}", email);
        }
        None => warn!("Admin role missing; did migrations run?"),
    }

    Ok(())
}
