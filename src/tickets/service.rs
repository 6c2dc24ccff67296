//! Ticket application service: validate input, consult the policy engine,
//! then perform the store operation. No business rule lives here beyond the
//! owner-scoping of list queries for non-staff actors.

use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::policy::TicketPolicy;
use crate::core::shared::enums::TicketStatus;
use crate::core::shared::error::{ApiError, ValidationErrors};
use crate::core::shared::pagination::{page_params, Page};
use crate::core::shared::schema::tickets;
use crate::core::shared::state::AppState;
use crate::directory::roles::{ROLE_ADMIN, ROLE_AGENT};

use super::{
    ChangeStatusRequest, CreateTicketRequest, Ticket, TicketChanges, TicketListQuery,
    UpdateTicketRequest,
};

pub fn list_tickets(
    state: &AppState,
    actor: &AuthenticatedUser,
    query: &TicketListQuery,
) -> Result<Page<Ticket>, ApiError> {
    let status_filter = parse_status_filter(query.status.as_deref())?;
    let (page, per_page) = page_params(query.page, query.per_page);

    if !TicketPolicy::view_any(actor) {
        return Err(ApiError::Forbidden);
    }

    // Clients only ever see their own tickets; staff see everything.
    let scope_to_owner = !actor.has_any_role(&[ROLE_AGENT, ROLE_ADMIN]);

    let filtered = || {
        let mut q = tickets::table.into_boxed();
        if scope_to_owner {
            q = q.filter(tickets::user_id.eq(actor.user_id));
        }
        if let Some(status) = status_filter {
            q = q.filter(tickets::status.eq(status));
        }
        if let Some(search) = query.search.as_deref() {
            let pattern = format!("%{search}%");
            q = q.filter(
                tickets::title
                    .ilike(pattern.clone())
                    .or(tickets::description.ilike(pattern)),
            );
        }
        q
    };

    let mut conn = state.conn.get()?;

    let total: i64 = filtered().count().get_result(&mut conn)?;
    let rows: Vec<Ticket> = filtered()
        .order(tickets::created_at.desc())
        .limit(per_page)
        .offset((page - 1) * per_page)
        .load(&mut conn)?;

    let path = format!("{}/api/tickets", state.config.server.base_url);
    Ok(Page::new(rows, total, page, per_page, &path))
}

pub fn create_ticket(
    state: &AppState,
    actor: &AuthenticatedUser,
    req: CreateTicketRequest,
) -> Result<Ticket, ApiError> {
    let mut errors = ValidationErrors::new();
    validate_title(&mut errors, Some(&req.title), true);
    validate_description(&mut errors, Some(&req.description), true);
    errors.into_result()?;

    if !TicketPolicy::create(actor) {
        return Err(ApiError::Forbidden);
    }

    let now = Utc::now();
    let ticket = Ticket {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        // Status is forced open at creation, whatever the payload said.
        status: TicketStatus::Open,
        user_id: actor.user_id,
        agent_id: None,
        created_at: now,
        updated_at: now,
    };

    let mut conn = state.conn.get()?;
    diesel::insert_into(tickets::table)
        .values(&ticket)
        .execute(&mut conn)?;

    info!("Ticket {} created by {}", ticket.id, actor.user_id);
    Ok(ticket)
}

pub fn get_ticket(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> Result<Ticket, ApiError> {
    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, id)?;

    if !TicketPolicy::view(actor, &ticket.snapshot()) {
        return Err(ApiError::Forbidden);
    }
    Ok(ticket)
}

pub fn update_ticket(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
    req: UpdateTicketRequest,
) -> Result<Ticket, ApiError> {
    let mut errors = ValidationErrors::new();
    validate_title(&mut errors, req.title.as_deref(), false);
    validate_description(&mut errors, req.description.as_deref(), false);
    let status = match req.status.as_deref() {
        Some(raw) => match raw.parse::<TicketStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.add("status", "The selected status is invalid.");
                None
            }
        },
        None => None,
    };
    errors.into_result()?;

    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, id)?;

    if !TicketPolicy::update(actor, &ticket.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    let changes = TicketChanges {
        title: req.title,
        description: req.description,
        status,
        agent_id: req.agent_id,
        updated_at: Some(Utc::now()),
    };

    // An empty partial update is a no-op; nothing is written, updated_at
    // included.
    if changes.title.is_none()
        && changes.description.is_none()
        && changes.status.is_none()
        && changes.agent_id.is_none()
    {
        return Ok(ticket);
    }

    let updated: Ticket = diesel::update(tickets::table.filter(tickets::id.eq(id)))
        .set(&changes)
        .get_result(&mut conn)?;

    Ok(updated)
}

pub fn delete_ticket(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> Result<(), ApiError> {
    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, id)?;

    if !TicketPolicy::delete(actor, &ticket.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    diesel::delete(tickets::table.filter(tickets::id.eq(id))).execute(&mut conn)?;
    info!("Ticket {} deleted by {}", id, actor.user_id);
    Ok(())
}

pub fn change_status(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
    req: &ChangeStatusRequest,
) -> Result<Ticket, ApiError> {
    let status = req.status.parse::<TicketStatus>().map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.add("status", "The selected status is invalid.");
        ApiError::Validation(errors)
    })?;

    let mut conn = state.conn.get()?;
    let ticket = find_ticket(&mut conn, id)?;

    if !TicketPolicy::change_status(actor, &ticket.snapshot()) {
        return Err(ApiError::Forbidden);
    }

    let updated: Ticket = diesel::update(tickets::table.filter(tickets::id.eq(id)))
        .set((
            tickets::status.eq(status),
            tickets::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    info!(
        "Ticket {} status {} -> {} by {}",
        id, ticket.status, status, actor.user_id
    );
    Ok(updated)
}

/// Shared lookup; "not found" is decided here, before any policy call.
pub fn find_ticket(conn: &mut PgConnection, id: Uuid) -> Result<Ticket, ApiError> {
    tickets::table
        .filter(tickets::id.eq(id))
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound("Ticket"))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<TicketStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add("status", "The selected status is invalid.");
            ApiError::Validation(errors)
        }),
    }
}

fn validate_title(errors: &mut ValidationErrors, title: Option<&str>, required: bool) {
    match title {
        None if required => errors.add("title", "The title field is required."),
        None => {}
        Some(value) => {
            if value.trim().is_empty() {
                errors.add("title", "The title field is required.");
            } else if value.chars().count() > 255 {
                errors.add("title", "The title may not be greater than 255 characters.");
            }
        }
    }
}

fn validate_description(errors: &mut ValidationErrors, description: Option<&str>, required: bool) {
    match description {
        None if required => errors.add("description", "The description field is required."),
        None => {}
        Some(value) => {
            if value.trim().is_empty() {
                errors.add("description", "The description field is required.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_validation_rules() {
        let mut errors = ValidationErrors::new();
        validate_title(&mut errors, Some("A perfectly fine title"), true);
        assert!(errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_title(&mut errors, None, true);
        assert!(!errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_title(&mut errors, Some("   "), false);
        assert!(!errors.is_empty());

        let long = "x".repeat(256);
        let mut errors = ValidationErrors::new();
        validate_title(&mut errors, Some(&long), false);
        assert!(!errors.is_empty());

        // Optional and absent is fine on partial updates.
        let mut errors = ValidationErrors::new();
        validate_title(&mut errors, None, false);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("pending")).unwrap(),
            Some(TicketStatus::Pending)
        );
        assert!(parse_status_filter(Some("bogus")).is_err());
    }
}
