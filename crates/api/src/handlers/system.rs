//! Handlers for `/api/system/*`: system info, configuration, update check,
//! log export and exit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use axum::Json;
use notekernel_core::error::CoreError;
use notekernel_core::types::{now_millis, UnixMillis};
use notekernel_core::version::compare_versions;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::routing::RequestContext;
use crate::services::conf::{
    AppearanceConf, AppearanceMode, SystemConf, SystemSection, PROXY_SCHEMES,
};
use crate::services::logs::export_logs;

/// Running kernel version.
pub const KERNEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shown in place of a configured access code.
const MASKED_AUTH_CODE: &str = "******";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct BootProgress {
    pub progress: u8,
    pub details: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UiProcessRequest {
    pub pid: u32,
}

#[derive(Debug, Serialize)]
pub struct EmojiItem {
    pub unicode: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct EmojiGroup {
    pub id: &'static str,
    pub title: &'static str,
    pub items: Vec<EmojiItem>,
}

/// `getConf` payload: the configuration plus kernel-level flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfView {
    #[serde(flatten)]
    pub conf: SystemConf,
    pub access_auth_code: &'static str,
    pub read_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiLayoutRequest {
    pub layout: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkServeRequest {
    pub network_serve: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadErrLogRequest {
    pub upload_err_log: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AutoLaunchRequest {
    #[validate(range(max = 2))]
    pub auto_launch: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAnalyticsRequest {
    pub google_analytics: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInstallPkgRequest {
    pub download_install_pkg: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProxyRequest {
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub host: String,
    #[serde(default)]
    pub port: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceModeRequest {
    pub mode: AppearanceMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub current_version: &'static str,
    pub latest_version: Option<String>,
    pub has_update: bool,
}

#[derive(Debug, Serialize)]
pub struct Changelog {
    /// `false` when no changelog is available.
    pub show: bool,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ExportedLog {
    pub zip: PathBuf,
}

// ---------------------------------------------------------------------------
// Public endpoints
// ---------------------------------------------------------------------------

/// GET|POST /api/system/bootProgress
pub async fn boot_progress(_ctx: RequestContext) -> AppResult<Json<DataResponse<BootProgress>>> {
    Ok(Json(DataResponse {
        data: BootProgress {
            progress: 100,
            details: "Finishing boot...",
        },
    }))
}

/// GET|POST /api/system/version
pub async fn version(_ctx: RequestContext) -> AppResult<Json<DataResponse<&'static str>>> {
    Ok(Json(DataResponse {
        data: KERNEL_VERSION,
    }))
}

/// POST /api/system/currentTime
pub async fn current_time(_ctx: RequestContext) -> AppResult<Json<DataResponse<UnixMillis>>> {
    Ok(Json(DataResponse { data: now_millis() }))
}

/// POST /api/system/uiproc
///
/// Records the PID of a UI process attached to this kernel.
pub async fn add_ui_process(ctx: RequestContext) -> AppResult<Json<DataResponse<Vec<u32>>>> {
    let input: UiProcessRequest = ctx.json()?;
    let mut pids = ctx.state.ui_processes.lock().await;
    if !pids.contains(&input.pid) {
        pids.push(input.pid);
        tracing::debug!(pid = input.pid, "UI process attached");
    }
    Ok(Json(DataResponse { data: pids.clone() }))
}

/// POST /api/system/getChangelog
///
/// Serves the configured changelog file. A missing file is not an error.
pub async fn get_changelog(ctx: RequestContext) -> AppResult<Json<DataResponse<Changelog>>> {
    let content = match &ctx.state.config.changelog_path {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(AppError::InternalError(format!(
                    "Failed to read changelog '{}': {e}",
                    path.display()
                )))
            }
        },
        None => String::new(),
    };

    Ok(Json(DataResponse {
        data: Changelog {
            show: !content.trim().is_empty(),
            content,
        },
    }))
}

// ---------------------------------------------------------------------------
// Authenticated endpoints
// ---------------------------------------------------------------------------

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "woff", "woff2"];

/// POST /api/system/getSysFonts
///
/// Font names (file stems) found under the configured font directories,
/// sorted and de-duplicated. Missing directories are skipped.
pub async fn get_sys_fonts(ctx: RequestContext) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let mut names = BTreeSet::new();
    let mut pending: Vec<PathBuf> = ctx.state.config.font_dirs.clone();

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping font directory");
                continue;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if let (true, Some(stem)) = (is_font, path.file_stem().and_then(|s| s.to_str())) {
                names.insert(stem.to_string());
            }
        }
    }

    Ok(Json(DataResponse {
        data: names.into_iter().collect(),
    }))
}

/// POST /api/system/getEmojiConf
///
/// Lists the custom emoji files of the current workspace (`data/emojis`).
pub async fn get_emoji_conf(ctx: RequestContext) -> AppResult<Json<DataResponse<Vec<EmojiGroup>>>> {
    let workspace = ctx.state.workspaces.current().await;
    let items = list_custom_emojis(&workspace.join("data").join("emojis")).await?;

    Ok(Json(DataResponse {
        data: vec![EmojiGroup {
            id: "custom",
            title: "Custom",
            items,
        }],
    }))
}

async fn list_custom_emojis(dir: &Path) -> AppResult<Vec<EmojiItem>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::InternalError(format!(
                "Failed to read emoji directory: {e}"
            )))
        }
    };

    let mut items = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read emoji entry: {e}")))?
    {
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to stat emoji entry: {e}")))?
            .is_file();
        if !is_file {
            continue;
        }
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let description = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        items.push(EmojiItem {
            unicode: file_name.to_string(),
            description,
        });
    }
    items.sort_by(|a, b| a.unicode.cmp(&b.unicode));
    Ok(items)
}

/// POST /api/system/getConf
pub async fn get_conf(ctx: RequestContext) -> AppResult<Json<DataResponse<ConfView>>> {
    let conf = ctx.state.conf.snapshot().await;
    let access_auth_code = if ctx.state.sessions.auth_enabled() {
        MASKED_AUTH_CODE
    } else {
        ""
    };

    Ok(Json(DataResponse {
        data: ConfView {
            conf,
            access_auth_code,
            read_only: ctx.state.is_read_only(),
        },
    }))
}

/// POST /api/system/setUILayout
pub async fn set_ui_layout(ctx: RequestContext) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let input: UiLayoutRequest = ctx.json()?;
    if !input.layout.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "layout must be a JSON object".into(),
        )));
    }
    let conf = ctx.state.conf.update(|c| c.ui_layout = input.layout).await;
    Ok(Json(DataResponse {
        data: conf.ui_layout,
    }))
}

/// POST /api/system/setNetworkServe
pub async fn set_network_serve(ctx: RequestContext) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: NetworkServeRequest = ctx.json()?;
    update_system(&ctx, |s| s.network_serve = input.network_serve).await
}

/// POST /api/system/setUploadErrLog
pub async fn set_upload_err_log(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: UploadErrLogRequest = ctx.json()?;
    update_system(&ctx, |s| s.upload_err_log = input.upload_err_log).await
}

/// POST /api/system/setAutoLaunch
pub async fn set_auto_launch(ctx: RequestContext) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: AutoLaunchRequest = ctx.valid_json()?;
    update_system(&ctx, |s| s.auto_launch = input.auto_launch).await
}

/// POST /api/system/setGoogleAnalytics
pub async fn set_google_analytics(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: GoogleAnalyticsRequest = ctx.json()?;
    update_system(&ctx, |s| {
        s.disable_google_analytics = !input.google_analytics
    })
    .await
}

/// POST /api/system/setDownloadInstallPkg
pub async fn set_download_install_pkg(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: DownloadInstallPkgRequest = ctx.json()?;
    update_system(&ctx, |s| s.download_install_pkg = input.download_install_pkg).await
}

/// POST /api/system/setNetworkProxy
///
/// An empty scheme clears the proxy; otherwise host and a numeric port are required.
pub async fn set_network_proxy(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<SystemSection>>> {
    let input: NetworkProxyRequest = ctx.valid_json()?;
    let scheme = input.scheme.trim().to_ascii_lowercase();

    if !PROXY_SCHEMES.contains(&scheme.as_str()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unsupported proxy scheme '{scheme}'"
        ))));
    }
    if !scheme.is_empty() {
        if input.host.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "Proxy host is required".into(),
            )));
        }
        if input.port.trim().parse::<u16>().map_or(true, |p| p == 0) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid proxy port '{}'",
                input.port
            ))));
        }
    }

    update_system(&ctx, |s| {
        s.network_proxy.scheme = scheme;
        s.network_proxy.host = input.host.trim().to_string();
        s.network_proxy.port = input.port.trim().to_string();
    })
    .await
}

/// POST /api/system/setAppearanceMode
pub async fn set_appearance_mode(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<AppearanceConf>>> {
    let input: AppearanceModeRequest = ctx.json()?;
    let conf = ctx
        .state
        .conf
        .update(|c| c.appearance.mode = input.mode)
        .await;
    Ok(Json(DataResponse {
        data: conf.appearance,
    }))
}

async fn update_system<F>(ctx: &RequestContext, f: F) -> AppResult<Json<DataResponse<SystemSection>>>
where
    F: FnOnce(&mut SystemSection),
{
    let conf = ctx.state.conf.update(|c| f(&mut c.system)).await;
    tracing::debug!(path = %ctx.path, "System configuration updated");
    Ok(Json(DataResponse { data: conf.system }))
}

// ---------------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------------

/// POST /api/system/exit
///
/// Starts graceful shutdown once the response has been written.
pub async fn exit(ctx: RequestContext) -> AppResult<Json<DataResponse<()>>> {
    tracing::info!(
        subject = ctx.identity.as_ref().map(|i| i.subject.as_str()).unwrap_or("unknown"),
        "Exit requested through the API"
    );
    ctx.state.shutdown.cancel();
    Ok(Json(DataResponse { data: () }))
}

/// POST /api/system/checkUpdate
pub async fn check_update(ctx: RequestContext) -> AppResult<Json<DataResponse<UpdateInfo>>> {
    let latest_version = ctx.state.config.latest_version.clone();
    let has_update = match &latest_version {
        Some(latest) => compare_versions(latest, KERNEL_VERSION)
            .map_err(|e| AppError::InternalError(format!("Unusable LATEST_VERSION: {e}")))?
            .is_gt(),
        None => false,
    };

    Ok(Json(DataResponse {
        data: UpdateInfo {
            current_version: KERNEL_VERSION,
            latest_version,
            has_update,
        },
    }))
}

/// POST /api/system/exportLog
pub async fn export_log(ctx: RequestContext) -> AppResult<Json<DataResponse<ExportedLog>>> {
    let zip = export_logs(
        ctx.state.config.log_dir.clone(),
        ctx.state.config.temp_dir.clone(),
    )
    .await
    .map_err(|e| AppError::InternalError(format!("Failed to export logs: {e}")))?;

    Ok(Json(DataResponse {
        data: ExportedLog { zip },
    }))
}
