//! Registry of known workspace directories.

use std::path::{Path, PathBuf};

use notekernel_core::error::CoreError;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub path: PathBuf,
    /// `true` for every workspace except the one the kernel is serving.
    pub closed: bool,
}

#[derive(Debug)]
struct Registry {
    paths: Vec<PathBuf>,
    current: PathBuf,
}

#[derive(Debug)]
pub struct WorkspaceRegistry {
    inner: RwLock<Registry>,
}

impl WorkspaceRegistry {
    pub fn new(current: PathBuf) -> Self {
        Self {
            inner: RwLock::new(Registry {
                paths: vec![current.clone()],
                current,
            }),
        }
    }

    pub async fn current(&self) -> PathBuf {
        self.inner.read().await.current.clone()
    }

    pub async fn list(&self) -> Vec<WorkspaceInfo> {
        let reg = self.inner.read().await;
        reg.paths
            .iter()
            .map(|p| WorkspaceInfo {
                path: p.clone(),
                closed: *p != reg.current,
            })
            .collect()
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.inner.read().await.paths.iter().any(|p| p == path)
    }

    /// Create the directory on disk and add it to the registry.
    pub async fn create(&self, path: PathBuf) -> Result<WorkspaceInfo, CoreError> {
        require_absolute(&path)?;
        if self.contains(&path).await {
            return Err(CoreError::Conflict(format!(
                "Workspace '{}' already exists",
                path.display()
            )));
        }

        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            CoreError::Internal(format!(
                "Failed to create workspace '{}': {e}",
                path.display()
            ))
        })?;

        let mut reg = self.inner.write().await;
        if !reg.paths.contains(&path) {
            reg.paths.push(path.clone());
        }
        tracing::info!(path = %path.display(), "Workspace created");
        Ok(WorkspaceInfo { path, closed: true })
    }

    /// Forget a workspace. Files on disk are left alone.
    pub async fn remove(&self, path: &Path) -> Result<(), CoreError> {
        let mut reg = self.inner.write().await;
        if reg.current.as_path() == path {
            return Err(CoreError::Conflict(
                "Cannot remove the workspace currently in use".into(),
            ));
        }
        let before = reg.paths.len();
        reg.paths.retain(|p| p != path);
        if reg.paths.len() == before {
            return Err(CoreError::NotFound {
                entity: "Workspace",
                key: path.display().to_string(),
            });
        }
        tracing::info!(path = %path.display(), "Workspace removed from registry");
        Ok(())
    }

    /// Switch the current workspace. The path must be registered or an existing directory.
    pub async fn set_current(&self, path: PathBuf) -> Result<(), CoreError> {
        require_absolute(&path)?;
        let registered = self.contains(&path).await;
        if !registered && !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(CoreError::NotFound {
                entity: "Workspace",
                key: path.display().to_string(),
            });
        }

        let mut reg = self.inner.write().await;
        if !reg.paths.contains(&path) {
            reg.paths.push(path.clone());
        }
        tracing::info!(from = %reg.current.display(), to = %path.display(), "Switching workspace");
        reg.current = path;
        Ok(())
    }
}

fn require_absolute(path: &Path) -> Result<(), CoreError> {
    if !path.is_absolute() {
        return Err(CoreError::Validation(format!(
            "Workspace path '{}' must be absolute",
            path.display()
        )));
    }
    Ok(())
}
