//! Route chains for `/api/system/*`.

use axum::http::Method;

use crate::handlers::{auth, system, workspace};
use crate::middleware;
use crate::routing::{RouteError, RouteTableBuilder, Step};

/// No guards.
fn public(handler: Step) -> Vec<Step> {
    vec![handler]
}

/// Any authenticated caller.
fn authed(handler: Step) -> Vec<Step> {
    vec![middleware::auth(), handler]
}

/// Authenticated caller, blocked in read-only mode.
fn authed_writable(handler: Step) -> Vec<Step> {
    vec![middleware::auth(), middleware::readonly(), handler]
}

/// Administrator only.
fn admin(handler: Step) -> Vec<Step> {
    vec![middleware::auth(), middleware::admin(), handler]
}

/// Administrator only, blocked in read-only mode.
fn admin_writable(handler: Step) -> Vec<Step> {
    vec![
        middleware::auth(),
        middleware::admin(),
        middleware::readonly(),
        handler,
    ]
}

pub fn register(routes: &mut RouteTableBuilder) -> Result<(), RouteError> {
    let get_post = [Method::GET, Method::POST];

    // -- Public --
    routes
        .register_methods(
            &get_post,
            "/api/system/bootProgress",
            public(Step::handler("boot_progress", system::boot_progress)),
        )?
        .register_methods(
            &get_post,
            "/api/system/version",
            public(Step::handler("version", system::version)),
        )?
        .register(
            Method::POST,
            "/api/system/currentTime",
            public(Step::handler("current_time", system::current_time)),
        )?
        .register(
            Method::POST,
            "/api/system/uiproc",
            public(Step::handler("add_ui_process", system::add_ui_process)),
        )?
        .register(
            Method::POST,
            "/api/system/loginAuth",
            public(Step::handler("login_auth", auth::login_auth)),
        )?
        .register(
            Method::POST,
            "/api/system/logoutAuth",
            public(Step::handler("logout_auth", auth::logout_auth)),
        )?
        .register(
            Method::POST,
            "/api/system/getChangelog",
            public(Step::handler("get_changelog", system::get_changelog)),
        )?;

    // -- Authenticated --
    routes
        .register(
            Method::POST,
            "/api/system/getEmojiConf",
            authed(Step::handler("get_emoji_conf", system::get_emoji_conf)),
        )?
        .register(
            Method::POST,
            "/api/system/getConf",
            authed(Step::handler("get_conf", system::get_conf)),
        )?
        .register(
            Method::POST,
            "/api/system/getSysFonts",
            authed(Step::handler("get_sys_fonts", system::get_sys_fonts)),
        )?
        .register(
            Method::POST,
            "/api/system/setUILayout",
            authed_writable(Step::handler("set_ui_layout", system::set_ui_layout)),
        )?;

    // -- Administrator, mutating --
    routes
        .register(
            Method::POST,
            "/api/system/setAccessAuthCode",
            admin_writable(Step::handler(
                "set_access_auth_code",
                auth::set_access_auth_code,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/setNetworkServe",
            admin_writable(Step::handler("set_network_serve", system::set_network_serve)),
        )?
        .register(
            Method::POST,
            "/api/system/setUploadErrLog",
            admin_writable(Step::handler("set_upload_err_log", system::set_upload_err_log)),
        )?
        .register(
            Method::POST,
            "/api/system/setAutoLaunch",
            admin_writable(Step::handler("set_auto_launch", system::set_auto_launch)),
        )?
        .register(
            Method::POST,
            "/api/system/setGoogleAnalytics",
            admin_writable(Step::handler(
                "set_google_analytics",
                system::set_google_analytics,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/setDownloadInstallPkg",
            admin_writable(Step::handler(
                "set_download_install_pkg",
                system::set_download_install_pkg,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/setNetworkProxy",
            admin_writable(Step::handler("set_network_proxy", system::set_network_proxy)),
        )?
        .register(
            Method::POST,
            "/api/system/setAppearanceMode",
            admin_writable(Step::handler(
                "set_appearance_mode",
                system::set_appearance_mode,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/setWorkspaceDir",
            admin_writable(Step::handler(
                "set_workspace_dir",
                workspace::set_workspace_dir,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/createWorkspaceDir",
            admin_writable(Step::handler(
                "create_workspace_dir",
                workspace::create_workspace_dir,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/removeWorkspaceDir",
            admin_writable(Step::handler(
                "remove_workspace_dir",
                workspace::remove_workspace_dir,
            )),
        )?;

    // -- Administrator, read or control --
    routes
        .register(
            Method::POST,
            "/api/system/getWorkspaces",
            admin(Step::handler("get_workspaces", workspace::get_workspaces)),
        )?
        .register(
            Method::POST,
            "/api/system/getMobileWorkspaces",
            admin(Step::handler(
                "get_mobile_workspaces",
                workspace::get_mobile_workspaces,
            )),
        )?
        .register(
            Method::POST,
            "/api/system/exit",
            admin(Step::handler("exit", system::exit)),
        )?
        .register(
            Method::POST,
            "/api/system/checkUpdate",
            admin(Step::handler("check_update", system::check_update)),
        )?
        .register(
            Method::POST,
            "/api/system/exportLog",
            admin(Step::handler("export_log", system::export_log)),
        )?;

    Ok(())
}
