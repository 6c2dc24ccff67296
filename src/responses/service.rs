//! Response application service. Mirrors the ticket service: validate,
//! look up (parent ticket first for thread operations), consult the policy
//! engine, then touch the store.

use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::policy::ResponsePolicy;
use crate::core::shared::error::{ApiError, ValidationErrors};
use crate::core::shared::pagination::{page_params, Page};
use crate::core::shared::schema::responses;
use crate::core::shared::state::AppState;
use crate::tickets::service::find_ticket;

use super::{CreateResponseRequest, ResponseListQuery, TicketResponse, UpdateResponseRequest};

pub fn list_responses(
    state: &AppState,
    actor: &AuthenticatedUser,
    ticket_id: Uuid,
    query: &ResponseListQuery,
) -> Result<Page<TicketResponse>, ApiError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, ticket_id)?;

    if !ResponsePolicy::view_any(actor) {
        return Err(ApiError::Forbidden);
    }

    let total: i64 = responses::table
        .filter(responses::ticket_id.eq(ticket.id))
        .count()
        .get_result(&mut conn)?;
    let rows: Vec<TicketResponse> = responses::table
        .filter(responses::ticket_id.eq(ticket.id))
        .order(responses::created_at.asc())
        .limit(per_page)
        .offset((page - 1) * per_page)
        .load(&mut conn)?;

    let path = format!(
        "{}/api/tickets/{}/responses",
        state.config.server.base_url, ticket.id
    );
    Ok(Page::new(rows, total, page, per_page, &path))
}

pub fn create_response(
    state: &AppState,
    actor: &AuthenticatedUser,
    ticket_id: Uuid,
    req: CreateResponseRequest,
) -> Result<TicketResponse, ApiError> {
    let mut errors = ValidationErrors::new();
    validate_content(&mut errors, Some(&req.content), true);
    errors.into_result()?;

    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, ticket_id)?;

    if !ResponsePolicy::create(actor, &ticket.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    let now = Utc::now();
    let response = TicketResponse {
        id: Uuid::new_v4(),
        content: req.content,
        ticket_id: ticket.id,
        user_id: actor.user_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(responses::table)
        .values(&response)
        .execute(&mut conn)?;

    info!(
        "Response {} added to ticket {} by {}",
        response.id, ticket.id, actor.user_id
    );
    Ok(response)
}

pub fn get_response(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> Result<TicketResponse, ApiError> {
    let mut conn = state.conn.get()?;
    let response = find_response(&mut conn, id)?;

    if !ResponsePolicy::view(actor, &response.snapshot()) {
        return Err(ApiError::Forbidden);
    }
    Ok(response)
}

pub fn update_response(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
    req: UpdateResponseRequest,
) -> Result<TicketResponse, ApiError> {
    let mut errors = ValidationErrors::new();
    validate_content(&mut errors, req.content.as_deref(), false);
    errors.into_result()?;

    let mut conn = state.conn.get()?;
    let response = find_response(&mut conn, id)?;

    if !ResponsePolicy::update(actor, &response.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    // An empty partial update leaves the row untouched.
    let Some(content) = req.content else {
        return Ok(response);
    };

    let updated: TicketResponse = diesel::update(responses::table.filter(responses::id.eq(id)))
        .set((
            responses::content.eq(content),
            responses::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    Ok(updated)
}

pub fn delete_response(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> Result<(), ApiError> {
    let mut conn = state.conn.get()?;
    let response = find_response(&mut conn, id)?;

    if !ResponsePolicy::delete(actor, &response.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    diesel::delete(responses::table.filter(responses::id.eq(id))).execute(&mut conn)?;
    info!("Response {} deleted by {}", id, actor.user_id);
    Ok(())
}

fn find_response(conn: &mut PgConnection, id: Uuid) -> Result<TicketResponse, ApiError> {
    responses::table
        .filter(responses::id.eq(id))
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound("Response"))
}

fn validate_content(errors: &mut ValidationErrors, content: Option<&str>, required: bool) {
    match content {
        None if required => errors.add("content", "The content field is required."),
        None => {}
        Some(value) => {
            if value.trim().is_empty() {
                errors.add("content", "The content field is required.");
            }
        }
    }
}
