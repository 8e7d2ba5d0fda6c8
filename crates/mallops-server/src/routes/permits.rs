//! Work-permit endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use mallops_access::Action;
use mallops_core::error::MallopsError;
use mallops_core::models::audit::AuditOutcome;
use mallops_core::models::permit::{
    Attachment, CreateWorkPermit, PermitFilter, PermitStatus, UpdateWorkPermit, WorkPermit,
};
use mallops_core::repository::{Pagination, StatusNotice, WorkPermitRepository};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, ValidJson};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(get_one).put(update))
        .route("/{id}/pdf", get(document))
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/violations", post(add_violation))
}

#[derive(Debug, Deserialize)]
struct CreatePermitRequest {
    /// Normally taken from the caller's scope; accepted in the body for
    /// callers whose account carries no mall.
    mall_id: Option<Uuid>,
    #[serde(rename = "type")]
    permit_type: String,
    risk_level: String,
    category: String,
    work_description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    attachments: Option<Vec<Attachment>>,
}

async fn create(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ValidJson(body): ValidJson<CreatePermitRequest>,
) -> ApiResult<(StatusCode, Json<WorkPermit>)> {
    state.access().require(&ctx, Action::PermitCreate)?;

    let tenant_id = ctx
        .tenant_id
        .ok_or_else(|| ApiError::validation("caller has no tenant scope"))?;
    let mall_id = ctx
        .mall_id
        .or(body.mall_id)
        .ok_or_else(|| ApiError::validation("mall_id is required"))?;

    let permit = state
        .permits()
        .create(CreateWorkPermit {
            mall_id,
            tenant_id,
            permit_type: body.permit_type,
            risk_level: body.risk_level,
            category: body.category,
            work_description: body.work_description,
            start_date: body.start_date,
            end_date: body.end_date,
            attachments: body.attachments,
            created_by: ctx.user_id,
        })
        .await?;

    state
        .audit(&ctx, "permit.create", Some(permit.id), AuditOutcome::Success)
        .await;

    Ok((StatusCode::CREATED, Json(permit)))
}

#[derive(Debug, Deserialize)]
struct PermitListQuery {
    status: Option<PermitStatus>,
    q: Option<String>,
    mine: Option<String>,
    offset: Option<u64>,
    limit: Option<u64>,
}

fn truthy(flag: &Option<String>) -> bool {
    matches!(flag.as_deref(), Some("1") | Some("true"))
}

async fn list(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Query(query): Query<PermitListQuery>,
) -> ApiResult<Json<Value>> {
    state.access().require(&ctx, Action::PermitList)?;

    // Tenant callers only ever see their own tenant; admins see their mall
    // unless they asked for their own submissions.
    let mut filter = PermitFilter {
        status: query.status,
        search: query.q,
        ..Default::default()
    };
    if ctx.role.is_tenant_scoped() || truthy(&query.mine) {
        filter.tenant_id = ctx.tenant_id;
    }
    filter.mall_id = ctx.mall_id;

    let pagination = Pagination {
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(50),
    };

    let page = state.permits().list(filter, pagination).await?;

    Ok(Json(json!({
        "workPermits": page.items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

async fn get_one(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WorkPermit>> {
    let access = state.access();
    access.require(&ctx, Action::PermitRead)?;

    let permit = state.permits().get_by_id(id).await?;
    access.require_resource(&ctx, Some(permit.mall_id), Some(permit.tenant_id))?;

    Ok(Json(permit))
}

#[derive(Debug, Deserialize, Default)]
struct UpdatePermitRequest {
    status: Option<PermitStatus>,
    #[serde(rename = "type")]
    permit_type: Option<String>,
    risk_level: Option<String>,
    category: Option<String>,
    work_description: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

fn status_label(status: PermitStatus) -> &'static str {
    match status {
        PermitStatus::PendingApproval => "pending approval",
        PermitStatus::Approved => "approved",
        PermitStatus::Active => "active",
        PermitStatus::Completed => "completed",
        PermitStatus::Rejected => "rejected",
        PermitStatus::Cancelled => "cancelled",
    }
}

async fn update(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdatePermitRequest>,
) -> ApiResult<Json<WorkPermit>> {
    let access = state.access();
    access.require(&ctx, Action::PermitUpdate)?;

    let mut permit = state.permits().get_by_id(id).await?;
    if let Err(denied) =
        access.require_resource(&ctx, Some(permit.mall_id), Some(permit.tenant_id))
    {
        state
            .audit(&ctx, "permit.update", Some(id), AuditOutcome::Denied)
            .await;
        return Err(denied.into());
    }

    let fields = UpdateWorkPermit {
        permit_type: body.permit_type,
        risk_level: body.risk_level,
        category: body.category,
        work_description: body.work_description,
        start_date: body.start_date,
        end_date: body.end_date,
    };
    let has_fields = fields.permit_type.is_some()
        || fields.risk_level.is_some()
        || fields.category.is_some()
        || fields.work_description.is_some()
        || fields.start_date.is_some()
        || fields.end_date.is_some();

    if has_fields {
        permit = state.permits().update(id, fields).await?;
    }

    if let Some(status) = body.status {
        let notice = StatusNotice {
            title: format!("Work permit {}", permit.permit_number),
            body: format!(
                "Work permit {} is now {}.",
                permit.permit_number,
                status_label(status)
            ),
            kind: "work_permit".into(),
        };
        permit = state
            .permits()
            .transition(id, status, ctx.user_id, notice)
            .await?;
        state
            .audit(&ctx, "permit.transition", Some(id), AuditOutcome::Success)
            .await;
    } else if has_fields {
        state
            .audit(&ctx, "permit.update", Some(id), AuditOutcome::Success)
            .await;
    }

    Ok(Json(permit))
}

/// Document source for the external PDF renderer. Only approved permits
/// have a document.
async fn document(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let access = state.access();
    access.require(&ctx, Action::PermitDocument)?;

    let permit = state.permits().get_by_id(id).await?;
    access.require_resource(&ctx, Some(permit.mall_id), Some(permit.tenant_id))?;

    if permit.status != PermitStatus::Approved {
        return Err(MallopsError::InvalidState {
            message: format!(
                "permit {} is not approved; no document is available",
                permit.permit_number
            ),
        }
        .into());
    }

    Ok(Json(json!({
        "format": "pdf",
        "generated_at": Utc::now(),
        "permit": permit,
    })))
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    comment: String,
}

async fn add_comment(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<CommentRequest>,
) -> ApiResult<Json<WorkPermit>> {
    let text = body.comment.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation("comment must not be empty"));
    }
    record_note(state, ctx, id, text, NoteKind::Comment).await
}

#[derive(Debug, Deserialize)]
struct ViolationRequest {
    violation: String,
}

async fn add_violation(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<ViolationRequest>,
) -> ApiResult<Json<WorkPermit>> {
    let text = body.violation.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation("violation must not be empty"));
    }
    record_note(state, ctx, id, text, NoteKind::Violation).await
}

enum NoteKind {
    Comment,
    Violation,
}

async fn record_note(
    state: AppState,
    ctx: mallops_access::AuthContext,
    id: Uuid,
    text: String,
    kind: NoteKind,
) -> ApiResult<Json<WorkPermit>> {
    let access = state.access();
    access.require(&ctx, Action::PermitInspect)?;

    let permit = state.permits().get_by_id(id).await?;
    access.require_resource(&ctx, Some(permit.mall_id), Some(permit.tenant_id))?;

    let (permit, action) = match kind {
        NoteKind::Comment => (
            state.permits().add_comment(id, ctx.user_id, text).await?,
            "permit.comment",
        ),
        NoteKind::Violation => (
            state.permits().add_violation(id, ctx.user_id, text).await?,
            "permit.violation",
        ),
    };

    state
        .audit(&ctx, action, Some(id), AuditOutcome::Success)
        .await;

    Ok(Json(permit))
}
