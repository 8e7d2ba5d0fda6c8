//! Notification endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use mallops_access::Action;
use mallops_core::models::audit::AuditOutcome;
use mallops_core::models::notification::{CreateNotification, Notification, ReadStatus};
use mallops_core::repository::{NotificationRepository, Pagination};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Identity, ValidJson};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/{id}/read-status", get(read_status))
        .route("/{id}/mark-read", post(mark_read))
}

#[derive(Debug, Deserialize)]
struct CreateNotificationRequest {
    title: String,
    body: String,
    #[serde(rename = "type")]
    kind: String,
    recipients: Option<Vec<Uuid>>,
}

async fn create(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ValidJson(body): ValidJson<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    state.access().require(&ctx, Action::NotificationCreate)?;

    let notification = state
        .notifications()
        .create(CreateNotification {
            title: body.title,
            body: body.body,
            kind: body.kind,
            created_by: ctx.user_id,
            recipients: body.recipients,
        })
        .await?;

    state
        .audit(
            &ctx,
            "notification.create",
            Some(notification.id),
            AuditOutcome::Success,
        )
        .await;

    Ok((StatusCode::CREATED, Json(notification)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    offset: Option<u64>,
    limit: Option<u64>,
}

async fn list(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    state.access().require(&ctx, Action::NotificationList)?;

    let page = state
        .notifications()
        .list_for_user(
            ctx.user_id,
            Pagination {
                offset: query.offset.unwrap_or(0),
                limit: query.limit.unwrap_or(50),
            },
        )
        .await?;

    Ok(Json(json!({
        "notifications": page.items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

async fn read_status(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReadStatus>> {
    state.access().require(&ctx, Action::NotificationReadStatus)?;

    let status = state.notifications().read_status(id).await?;
    Ok(Json(status))
}

async fn mark_read(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.access().require(&ctx, Action::NotificationMarkRead)?;

    state
        .notifications()
        .mark_read(id, ctx.user_id, ctx.tenant_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}
