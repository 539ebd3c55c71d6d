use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::auth::session::SessionStore;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::routing::RouteTable;
use crate::services::conf::ConfStore;
use crate::services::workspace::WorkspaceRegistry;

/// Shared application state available to every route step via [`RequestContext`].
///
/// This is cheaply cloneable (inner data is behind `Arc`).
///
/// [`RequestContext`]: crate::routing::RequestContext
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Frozen kernel route table.
    pub routes: Arc<RouteTable>,
    /// Access code, revocations and login throttling.
    pub sessions: Arc<SessionStore>,
    /// System configuration sections exposed through the API.
    pub conf: Arc<ConfStore>,
    /// Known workspace directories.
    pub workspaces: Arc<WorkspaceRegistry>,
    /// PIDs of UI processes attached to this kernel.
    pub ui_processes: Arc<Mutex<Vec<u32>>>,
    /// Process-wide read-only flag.
    read_only: Arc<AtomicBool>,
    /// Cancelled to stop the server gracefully.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ServerConfig, routes: RouteTable) -> AppResult<Self> {
        let sessions = SessionStore::new(config.access_auth_code.as_deref())
            .map_err(|e| AppError::InternalError(format!("Failed to hash access code: {e}")))?;

        Ok(Self {
            workspaces: Arc::new(WorkspaceRegistry::new(config.workspace_dir.clone())),
            read_only: Arc::new(AtomicBool::new(config.read_only)),
            config: Arc::new(config),
            routes: Arc::new(routes),
            sessions: Arc::new(sessions),
            conf: Arc::new(ConfStore::default()),
            ui_processes: Arc::new(Mutex::new(Vec::new())),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    pub fn set_read_only(&self, read_only: bool) {
        let previous = self.read_only.swap(read_only, Ordering::Relaxed);
        if previous != read_only {
            tracing::info!(read_only, "Read-only mode changed");
        }
    }
}
