//! Workflow endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use mallops_access::Action;
use mallops_core::models::workflow::{
    CreateTaskInstance, CreateWorkflow, TaskInstance, UpdateTaskInstance, Workflow,
    WorkflowStatus, WorkflowStep,
};
use mallops_core::repository::{Pagination, WorkflowRepository};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Identity, ValidJson};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(get_one).put(update))
        .route("/{id}/tasks", post(add_task))
        .route("/tasks/{task_id}", put(update_task))
}

#[derive(Debug, Deserialize)]
struct CreateWorkflowRequest {
    #[serde(rename = "type")]
    workflow_type: String,
    data: Option<Value>,
    #[serde(default)]
    steps: Vec<WorkflowStep>,
}

async fn create(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ValidJson(body): ValidJson<CreateWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<Workflow>)> {
    state.access().require(&ctx, Action::WorkflowCreate)?;

    let workflow = state
        .workflows()
        .create(CreateWorkflow {
            workflow_type: body.workflow_type,
            created_by: ctx.user_id,
            data: body.data,
            steps: body.steps,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(workflow)))
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
    state.access().require(&ctx, Action::WorkflowRead)?;

    let page = state
        .workflows()
        .list(Pagination {
            offset: query.offset.unwrap_or(0),
            limit: query.limit.unwrap_or(50),
        })
        .await?;

    Ok(Json(json!({
        "workflows": page.items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

async fn get_one(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.access().require(&ctx, Action::WorkflowRead)?;

    let workflow = state.workflows().get_by_id(id).await?;
    let tasks = state.workflows().get_tasks(id).await?;

    Ok(Json(json!({ "workflow": workflow, "tasks": tasks })))
}

#[derive(Debug, Deserialize)]
struct UpdateWorkflowRequest {
    status: WorkflowStatus,
}

async fn update(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateWorkflowRequest>,
) -> ApiResult<Json<Workflow>> {
    state.access().require(&ctx, Action::WorkflowUpdate)?;

    let workflow = state.workflows().update_status(id, body.status).await?;
    Ok(Json(workflow))
}

#[derive(Debug, Deserialize)]
struct AddTaskRequest {
    assigned_to: Uuid,
    step: String,
}

async fn add_task(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<AddTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskInstance>)> {
    state.access().require(&ctx, Action::WorkflowCreate)?;

    let task = state
        .workflows()
        .add_task(CreateTaskInstance {
            workflow_id: id,
            assigned_to: body.assigned_to,
            step: body.step,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize, Default)]
struct UpdateTaskRequest {
    status: Option<WorkflowStatus>,
    comment: Option<String>,
}

async fn update_task(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    Path(task_id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskInstance>> {
    state.access().require(&ctx, Action::TaskUpdate)?;

    let task = state
        .workflows()
        .update_task(
            task_id,
            UpdateTaskInstance {
                status: body.status,
                comment: body.comment,
            },
        )
        .await?;

    Ok(Json(task))
}
