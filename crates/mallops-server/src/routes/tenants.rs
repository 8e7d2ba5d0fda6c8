//! Tenant administration endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use mallops_access::{AccessError, Action};
use mallops_core::models::audit::AuditOutcome;
use mallops_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use mallops_core::models::user::UserRole;
use mallops_core::repository::{Pagination, TenantRepository};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, ValidJson};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(delete))
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
    state.access().require(&ctx, Action::TenantRead)?;

    let pagination = Pagination {
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(50),
    };

    // Mall admins see their own mall; only SUPER_ADMIN sees everything.
    let page = match ctx.role {
        UserRole::SuperAdmin => state.tenants().list(pagination).await?,
        _ => {
            let mall_id = ctx.mall_id.ok_or(AccessError::Forbidden)?;
            state.tenants().list_by_mall(mall_id, pagination).await?
        }
    };

    Ok(Json(json!({
        "tenants": page.items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

#[derive(Debug, Deserialize)]
struct CreateTenantRequest {
    mall_id: Option<Uuid>,
    name: String,
    slug: String,
    metadata: Option<Value>,
}

async fn create(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ValidJson(body): ValidJson<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    state.access().require(&ctx, Action::TenantManage)?;

    // A mall admin always creates in their own mall.
    let mall_id = ctx
        .mall_id
        .or(body.mall_id)
        .ok_or_else(|| ApiError::validation("mall_id is required"))?;

    let tenant = state
        .tenants()
        .create(CreateTenant {
            mall_id,
            name: body.name,
            slug: body.slug,
            metadata: body.metadata,
        })
        .await?;

    state
        .audit(&ctx, "tenant.create", Some(tenant.id), AuditOutcome::Success)
        .await;

    Ok((StatusCode::CREATED, Json(tenant)))
}

async fn get_one(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Tenant>> {
    let access = state.access();
    access.require(&ctx, Action::TenantRead)?;

    let tenant = state.tenants().get_by_id(id).await?;
    access.require_resource(&ctx, Some(tenant.mall_id), None)?;

    Ok(Json(tenant))
}

async fn update(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateTenant>,
) -> ApiResult<Json<Tenant>> {
    let access = state.access();
    access.require(&ctx, Action::TenantManage)?;

    let tenant = state.tenants().get_by_id(id).await?;
    access.require_resource(&ctx, Some(tenant.mall_id), None)?;

    let tenant = state.tenants().update(id, body).await?;

    state
        .audit(&ctx, "tenant.update", Some(id), AuditOutcome::Success)
        .await;

    Ok(Json(tenant))
}

async fn delete(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let access = state.access();
    access.require(&ctx, Action::TenantManage)?;

    let tenant = state.tenants().get_by_id(id).await?;
    access.require_resource(&ctx, Some(tenant.mall_id), None)?;

    state.tenants().delete(id).await?;

    state
        .audit(&ctx, "tenant.delete", Some(id), AuditOutcome::Success)
        .await;

    Ok(StatusCode::NO_CONTENT)
}
