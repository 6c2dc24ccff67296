//! Role directory: the many-to-many user/role relation and its membership
//! queries. Roles are seeded by migration and immutable at runtime.

use axum::{
    extract::{Path, State},
    Json,
};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::error::ApiError;
use crate::core::shared::schema::{role_user, roles, users};
use crate::core::shared::state::AppState;

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Queryable, Insertable)]
#[diesel(table_name = roles)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub label: String,
}

/// Names of every role held by the user.
pub fn user_roles(conn: &mut PgConnection, user: Uuid) -> QueryResult<Vec<String>> {
    role_user::table
        .inner_join(roles::table)
        .filter(role_user::user_id.eq(user))
        .select(roles::name)
        .load(conn)
}

/// Set-membership check: does the user hold at least one of `names`?
pub fn user_has_role(conn: &mut PgConnection, user: Uuid, names: &[&str]) -> QueryResult<bool> {
    select(exists(
        role_user::table
            .inner_join(roles::table)
            .filter(role_user::user_id.eq(user))
            .filter(roles::name.eq_any(names)),
    ))
    .get_result(conn)
}

pub fn find_by_name(conn: &mut PgConnection, role_name: &str) -> QueryResult<Option<Role>> {
    roles::table
        .filter(roles::name.eq(role_name))
        .first(conn)
        .optional()
}

/// Attach a role to a user. Idempotent: re-attaching is a no-op.
pub fn assign_role(conn: &mut PgConnection, user: Uuid, role: Uuid) -> QueryResult<()> {
    diesel::insert_into(role_user::table)
        .values((role_user::role_id.eq(role), role_user::user_id.eq(user)))
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

pub fn revoke_role(conn: &mut PgConnection, user: Uuid, role: Uuid) -> QueryResult<usize> {
    diesel::delete(
        role_user::table
            .filter(role_user::role_id.eq(role))
            .filter(role_user::user_id.eq(user)),
    )
    .execute(conn)
}

#[derive(Debug, Deserialize)]
pub struct RoleMembershipRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleMembershipResponse {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

/// `POST /api/users/:id/roles` — admin-only role attach.
pub async fn attach_role(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleMembershipRequest>,
) -> Result<Json<RoleMembershipResponse>, ApiError> {
    change_membership(&state, &actor, id, &req.role, true)
}

/// `DELETE /api/users/:id/roles` — admin-only role detach.
pub async fn detach_role(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleMembershipRequest>,
) -> Result<Json<RoleMembershipResponse>, ApiError> {
    change_membership(&state, &actor, id, &req.role, false)
}

fn change_membership(
    state: &AppState,
    actor: &AuthenticatedUser,
    user: Uuid,
    role_name: &str,
    attach: bool,
) -> Result<Json<RoleMembershipResponse>, ApiError> {
    if !actor.has_role(ROLE_ADMIN) {
        return Err(ApiError::Forbidden);
    }

    let mut conn = state.conn.get()?;

    let user_exists: bool = select(exists(users::table.filter(users::id.eq(user))))
        .get_result(&mut conn)?;
    if !user_exists {
        return Err(ApiError::NotFound("User"));
    }

    let role = find_by_name(&mut conn, role_name)?.ok_or(ApiError::NotFound("Role"))?;

    if attach {
        assign_role(&mut conn, user, role.id)?;
        info!("Attached role {} to user {}", role.name, user);
    } else {
        revoke_role(&mut conn, user, role.id)?;
        info!("Detached role {} from user {}", role.name, user);
    }

    let current = user_roles(&mut conn, user)?;
    Ok(Json(RoleMembershipResponse {
        user_id: user,
        roles: current,
    }))
}
