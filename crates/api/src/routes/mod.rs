pub mod health;
pub mod system;

use crate::routing::{RouteError, RouteTable};

/// Build the kernel route table.
///
/// Route hierarchy (guards run left to right, the handler last):
///
/// ```text
/// /api/system/bootProgress          GET|POST  public
/// /api/system/version               GET|POST  public
/// /api/system/currentTime           POST      public
/// /api/system/uiproc                POST      public
/// /api/system/loginAuth             POST      public
/// /api/system/logoutAuth            POST      public
/// /api/system/getChangelog          POST      public
///
/// /api/system/getEmojiConf          POST      auth
/// /api/system/getConf               POST      auth
/// /api/system/getSysFonts           POST      auth
/// /api/system/setUILayout           POST      auth, readonly
///
/// /api/system/setAccessAuthCode     POST      auth, admin, readonly
/// /api/system/setNetworkServe       POST      auth, admin, readonly
/// /api/system/setUploadErrLog       POST      auth, admin, readonly
/// /api/system/setAutoLaunch         POST      auth, admin, readonly
/// /api/system/setGoogleAnalytics    POST      auth, admin, readonly
/// /api/system/setDownloadInstallPkg POST      auth, admin, readonly
/// /api/system/setNetworkProxy       POST      auth, admin, readonly
/// /api/system/setAppearanceMode     POST      auth, admin, readonly
/// /api/system/setWorkspaceDir       POST      auth, admin, readonly
/// /api/system/createWorkspaceDir    POST      auth, admin, readonly
/// /api/system/removeWorkspaceDir    POST      auth, admin, readonly
///
/// /api/system/getWorkspaces         POST      auth, admin
/// /api/system/getMobileWorkspaces   POST      auth, admin
/// /api/system/exit                  POST      auth, admin
/// /api/system/checkUpdate           POST      auth, admin
/// /api/system/exportLog             POST      auth, admin
/// ```
///
/// `/health` is served by axum directly and never reaches this table.
pub fn api_routes() -> Result<RouteTable, RouteError> {
    let mut builder = RouteTable::builder();
    system::register(&mut builder)?;
    Ok(builder.build())
}
