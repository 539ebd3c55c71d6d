//! Handlers for workspace directory management.

use std::path::PathBuf;

use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::routing::RequestContext;
use crate::services::workspace::WorkspaceInfo;

#[derive(Debug, Deserialize, Validate)]
pub struct WorkspacePathRequest {
    #[validate(length(min = 1, max = 4096))]
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct MobileWorkspace {
    pub name: String,
    pub path: PathBuf,
}

/// POST /api/system/getWorkspaces
pub async fn get_workspaces(ctx: RequestContext) -> AppResult<Json<DataResponse<Vec<WorkspaceInfo>>>> {
    let list = ctx.state.workspaces.list().await;
    Ok(Json(DataResponse { data: list }))
}

/// POST /api/system/getMobileWorkspaces
///
/// Mobile clients only show directory names.
pub async fn get_mobile_workspaces(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<Vec<MobileWorkspace>>>> {
    let data = ctx
        .state
        .workspaces
        .list()
        .await
        .into_iter()
        .map(|ws| MobileWorkspace {
            name: ws
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| ws.path.display().to_string()),
            path: ws.path,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/system/createWorkspaceDir
pub async fn create_workspace_dir(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<WorkspaceInfo>>> {
    let input: WorkspacePathRequest = ctx.valid_json()?;
    let info = ctx.state.workspaces.create(PathBuf::from(input.path)).await?;
    Ok(Json(DataResponse { data: info }))
}

/// POST /api/system/removeWorkspaceDir
pub async fn remove_workspace_dir(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<Vec<WorkspaceInfo>>>> {
    let input: WorkspacePathRequest = ctx.valid_json()?;
    ctx.state
        .workspaces
        .remove(&PathBuf::from(input.path))
        .await?;
    let list = ctx.state.workspaces.list().await;
    Ok(Json(DataResponse { data: list }))
}

/// POST /api/system/setWorkspaceDir
///
/// Switches the workspace the kernel serves.
pub async fn set_workspace_dir(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<Vec<WorkspaceInfo>>>> {
    let input: WorkspacePathRequest = ctx.valid_json()?;
    ctx.state
        .workspaces
        .set_current(PathBuf::from(input.path))
        .await?;
    let list = ctx.state.workspaces.list().await;
    Ok(Json(DataResponse { data: list }))
}
