// src/handler/tickets.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        AssignMasterDto, CreateCommentDto, CreateTicketDto, TicketQueryParams,
        UpdateTicketDto, UpdateTicketStatusDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        ticketmodel::{Ticket, TicketWithUsers},
        usermodel::UserRole,
    },
    service::{
        access_policy::{can_access_comments, can_set_status, can_view_ticket, Session},
        error::ServiceError,
    },
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        // Managers see the queue they assign from; they still cannot edit,
        // delete or view tickets filed by others.
        .route(
            "/available",
            get(available_tickets).layer(middleware::from_fn(|state, req, next| {
                role_check(
                    state,
                    req,
                    next,
                    vec![UserRole::Master, UserRole::Admin, UserRole::Manager],
                )
            })),
        )
        .route(
            "/:ticket_id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/:ticket_id/assign", put(assign_master))
        .route(
            "/:ticket_id/claim",
            post(claim_ticket).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Master])
            })),
        )
        .route("/:ticket_id/status", put(update_ticket_status))
        .route(
            "/:ticket_id/comments",
            get(get_ticket_comments).post(add_comment),
        )
}

async fn load_ticket(app_state: &AppState, ticket_id: i64) -> Result<TicketWithUsers, HttpError> {
    app_state
        .ticket_service
        .get_ticket(ticket_id)
        .await?
        .ok_or_else(|| ServiceError::TicketNotFound(ticket_id).into())
}

fn permission_denied() -> HttpError {
    HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())
}

pub async fn list_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<TicketQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let tickets = match auth.user.role {
        UserRole::Admin => app_state.ticket_service.all_tickets().await?,
        UserRole::Master => app_state.ticket_service.tickets_for_master(auth.user.id).await?,
        UserRole::Client | UserRole::Manager => {
            app_state.ticket_service.tickets_for_client(auth.user.id).await?
        }
    };

    let tickets: Vec<TicketWithUsers> = match params.status {
        Some(status) => tickets
            .into_iter()
            .filter(|t| t.ticket.status == status)
            .collect(),
        None => tickets,
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "tickets": tickets,
            "results": tickets.len()
        }
    })))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let ticket: Ticket = app_state
        .ticket_service
        .try_create_ticket(body.title, body.description, auth.user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": ticket
        })),
    ))
}

pub async fn available_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let tickets = app_state.ticket_service.available_tickets().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "tickets": tickets,
            "results": tickets.len()
        }
    })))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = load_ticket(&app_state, ticket_id).await?;

    if !can_view_ticket(&auth.session(), &ticket.ticket) {
        return Err(permission_denied());
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn update_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
    Json(body): Json<UpdateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .ticket_service
        .try_update_ticket(&auth.session(), ticket_id, &body.title, &body.description)
        .await?;

    let ticket = load_ticket(&app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn delete_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .ticket_service
        .try_delete_ticket(&auth.session(), ticket_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("Ticket {} deleted", ticket_id)
    })))
}

async fn assign(
    app_state: &AppState,
    session: &Session,
    ticket_id: i64,
    master_id: i64,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .ticket_service
        .try_assign_master(session, ticket_id, master_id)
        .await?;

    let ticket = load_ticket(app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": ticket
    })))
}

pub async fn assign_master(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
    Json(body): Json<AssignMasterDto>,
) -> Result<impl IntoResponse, HttpError> {
    assign(&app_state, &auth.session(), ticket_id, body.master_id).await
}

pub async fn claim_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    assign(&app_state, &auth.session(), ticket_id, auth.user.id).await
}

pub async fn update_ticket_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
    Json(body): Json<UpdateTicketStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ticket = load_ticket(&app_state, ticket_id).await?;

    if !can_set_status(&auth.session(), &ticket.ticket, body.status) {
        return Err(permission_denied());
    }

    let changed = app_state
        .ticket_service
        .try_update_status(ticket_id, body.status)
        .await?;

    let ticket = load_ticket(&app_state, ticket_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "ticket": ticket,
            "changed": changed
        }
    })))
}

async fn comment_target(
    app_state: &AppState,
    auth: &JWTAuthMiddeware,
    ticket_id: i64,
) -> Result<Session, HttpError> {
    let ticket = load_ticket(app_state, ticket_id).await?;
    let session = auth.session();

    if !can_access_comments(&session, &ticket.ticket, app_state.env.comment_visibility) {
        return Err(permission_denied());
    }

    Ok(session)
}

pub async fn get_ticket_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    comment_target(&app_state, &auth, ticket_id).await?;

    let comments = app_state
        .ticket_service
        .comments_for_ticket(ticket_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": comments
    })))
}

pub async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<i64>,
    Json(body): Json<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = comment_target(&app_state, &auth, ticket_id).await?;

    let comment = app_state
        .ticket_service
        .try_add_comment(&session, ticket_id, &body.comment_text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": comment
        })),
    ))
}
