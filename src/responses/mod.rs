pub mod service;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::policy::ResponseSnapshot;
use crate::core::shared::error::ApiError;
use crate::core::shared::pagination::Page;
use crate::core::shared::schema::responses;
use crate::core::shared::state::AppState;
use crate::tickets::DeletedResponse;

/// One reply on a ticket thread.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = responses)]
pub struct TicketResponse {
    pub id: Uuid,
    pub content: String,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketResponse {
    pub fn snapshot(&self) -> ResponseSnapshot {
        ResponseSnapshot {
            author_id: self.user_id,
            ticket_id: self.ticket_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateResponseRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResponseRequest {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(ticket_id): Path<Uuid>,
    Query(query): Query<ResponseListQuery>,
) -> Result<Json<Page<TicketResponse>>, ApiError> {
    Ok(Json(service::list_responses(
        &state, &actor, ticket_id, &query,
    )?))
}

pub async fn create_response(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<CreateResponseRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let response = service::create_response(&state, &actor, ticket_id, req)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_response(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, ApiError> {
    Ok(Json(service::get_response(&state, &actor, id)?))
}

pub async fn update_response(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResponseRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    Ok(Json(service::update_response(&state, &actor, id, req)?))
}

pub async fn delete_response(
    State(state): State<Arc<AppState>>,
    actor: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    service::delete_response(&state, &actor, id)?;
    Ok(Json(DeletedResponse {
        message: "Response deleted successfully".to_string(),
    }))
}

pub fn configure_responses_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/tickets/:id/responses",
            get(list_responses).post(create_response),
        )
        .route(
            "/api/responses/:id",
            get(get_response)
                .put(update_response)
                .delete(delete_response),
        )
}
