use std::path::PathBuf;

use notekernel_core::error::CoreError;
use notekernel_core::version::parse_version;

use crate::auth::jwt::JwtConfig;

/// Default request body limit for kernel API calls (8 MiB).
const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults for a desktop kernel listening on
/// loopback. Override via environment variables (or a `.env` file).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `6806`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on how long shutdown waits for in-flight requests.
    pub shutdown_timeout_secs: u64,
    /// Maximum buffered request body size.
    pub max_body_bytes: usize,
    /// Start with the process-wide read-only flag raised.
    pub read_only: bool,
    /// Access authorization code. `None` means every caller is the local owner.
    pub access_auth_code: Option<String>,
    /// Initial workspace directory.
    pub workspace_dir: PathBuf,
    /// Directory whose files `exportLog` archives.
    pub log_dir: PathBuf,
    /// Scratch directory for exports.
    pub temp_dir: PathBuf,
    /// Newest released version known to the update check. Always parseable.
    pub latest_version: Option<String>,
    /// Directories scanned by `getSysFonts`.
    pub font_dirs: Vec<PathBuf>,
    /// Changelog served by `getChangelog`.
    pub changelog_path: Option<PathBuf>,
    /// Access token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                   |
    /// |-------------------------|---------------------------|
    /// | `HOST`                  | `127.0.0.1`               |
    /// | `PORT`                  | `6806`                    |
    /// | `CORS_ORIGINS`          | `http://localhost:6806`   |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                      |
    /// | `MAX_BODY_BYTES`        | `8388608`                 |
    /// | `READ_ONLY`             | `false`                   |
    /// | `ACCESS_AUTH_CODE`      | unset (auth disabled)     |
    /// | `WORKSPACE_DIR`         | `./workspace`             |
    /// | `LOG_DIR`               | `<WORKSPACE_DIR>/temp/log`|
    /// | `TEMP_DIR`              | system temp dir           |
    /// | `LATEST_VERSION`        | unset                     |
    /// | `FONT_DIRS`             | platform font directories |
    /// | `CHANGELOG_PATH`        | unset                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "6806".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:6806".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .map(|v| v.parse().expect("MAX_BODY_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let read_only = std::env::var("READ_ONLY")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let access_auth_code = std::env::var("ACCESS_AUTH_CODE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let workspace_dir = std::env::var("WORKSPACE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("workspace"));

        let log_dir = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| workspace_dir.join("temp").join("log"));

        let temp_dir = std::env::var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("notekernel"));

        let latest_version = checked_latest_version(std::env::var("LATEST_VERSION").ok())
            .expect("LATEST_VERSION must be a dotted numeric version");

        let font_dirs: Vec<PathBuf> = match std::env::var("FONT_DIRS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => default_font_dirs(),
        };

        let changelog_path = std::env::var("CHANGELOG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            max_body_bytes,
            read_only,
            access_auth_code,
            workspace_dir,
            log_dir,
            temp_dir,
            latest_version,
            font_dirs,
            changelog_path,
            jwt,
        }
    }
}

/// Blank means unset; anything else must parse as a version.
fn checked_latest_version(raw: Option<String>) -> Result<Option<String>, CoreError> {
    match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(version) => {
            parse_version(&version)?;
            Ok(Some(version))
        }
        None => Ok(None),
    }
}

fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(target_os = "windows") {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(if cfg!(target_os = "macos") {
            home.join("Library").join("Fonts")
        } else {
            home.join(".local").join("share").join("fonts")
        });
    }
    dirs
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
