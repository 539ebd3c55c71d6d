//! In-memory system configuration.
//!
//! Persisting the configuration is owned by the host application; the kernel
//! API only reads and replaces sections of it.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Light (`0`) or dark (`1`) appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum AppearanceMode {
    #[default]
    Light,
    Dark,
}

impl TryFrom<u8> for AppearanceMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AppearanceMode::Light),
            1 => Ok(AppearanceMode::Dark),
            other => Err(format!("Invalid appearance mode {other}, expected 0 or 1")),
        }
    }
}

impl From<AppearanceMode> for u8 {
    fn from(mode: AppearanceMode) -> Self {
        match mode {
            AppearanceMode::Light => 0,
            AppearanceMode::Dark => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceConf {
    pub mode: AppearanceMode,
}

/// Outbound proxy; an empty scheme means direct connections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProxy {
    pub scheme: String,
    pub host: String,
    pub port: String,
}

pub const PROXY_SCHEMES: &[&str] = &["", "http", "https", "socks5"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemSection {
    pub network_serve: bool,
    pub upload_err_log: bool,
    /// Launch at login: 0 off, 1 on, 2 on and minimized.
    pub auto_launch: u8,
    pub disable_google_analytics: bool,
    pub download_install_pkg: bool,
    pub network_proxy: NetworkProxy,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            network_serve: false,
            upload_err_log: false,
            auto_launch: 0,
            disable_google_analytics: true,
            download_install_pkg: true,
            network_proxy: NetworkProxy::default(),
        }
    }
}

/// The slice of application configuration exposed through the kernel API.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemConf {
    pub appearance: AppearanceConf,
    pub system: SystemSection,
    /// Opaque UI layout document owned by the front end.
    pub ui_layout: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct ConfStore {
    inner: RwLock<SystemConf>,
}

impl ConfStore {
    pub async fn snapshot(&self) -> SystemConf {
        self.inner.read().await.clone()
    }

    /// Apply `f` under the write lock and return the updated configuration.
    pub async fn update<F>(&self, f: F) -> SystemConf
    where
        F: FnOnce(&mut SystemConf),
    {
        let mut conf = self.inner.write().await;
        f(&mut conf);
        conf.clone()
    }
}
