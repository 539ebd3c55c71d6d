//! Tests for route registration and chain evaluation.
//!
//! Most of these drive `RouteTable::dispatch` directly with a
//! `RequestContext`, so no HTTP server is involved.

mod common;

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::http::header::AUTHORIZATION;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use http_body_util::BodyExt;
use notekernel_api::error::AppError;
use notekernel_api::middleware;
use notekernel_api::routes::api_routes;
use notekernel_api::routing::{Guard, RequestContext, RouteError, RouteTable, Step};
use notekernel_api::state::AppState;
use notekernel_core::error::CoreError;
use notekernel_core::roles::Role;

type Trace = Arc<Mutex<Vec<&'static str>>>;

fn state_with(auth_code: Option<&str>) -> (AppState, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    let config = common::test_config(root.path(), auth_code);
    let state = AppState::new(config, RouteTable::builder().build()).unwrap();
    (state, root)
}

fn recording_guard(trace: &Trace, name: &'static str) -> Step {
    let trace = Arc::clone(trace);
    Step::guard(name, move |_ctx| {
        trace.lock().unwrap().push(name);
        ControlFlow::Continue(())
    })
}

fn rejecting_guard(trace: &Trace, name: &'static str) -> Step {
    let trace = Arc::clone(trace);
    Step::guard(name, move |_ctx| {
        trace.lock().unwrap().push(name);
        ControlFlow::Break(AppError::unauthenticated("no token"))
    })
}

fn recording_handler(trace: &Trace) -> Step {
    let trace = Arc::clone(trace);
    Step::handler("handler", move |_ctx: RequestContext| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().unwrap().push("handler");
            Ok::<_, AppError>(StatusCode::OK)
        }
    })
}

fn ok_handler() -> Step {
    Step::handler("ok", |_ctx: RequestContext| async {
        Ok::<_, AppError>(StatusCode::OK)
    })
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

// ---------------------------------------------------------------------------
// Chain evaluation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guards_run_in_declared_order_before_handler() {
    let (state, _root) = state_with(None);
    let trace = Trace::default();

    let mut builder = RouteTable::builder();
    builder
        .register(
            Method::POST,
            "/api/test",
            vec![
                recording_guard(&trace, "first"),
                recording_guard(&trace, "second"),
                recording_guard(&trace, "third"),
                recording_handler(&trace),
            ],
        )
        .unwrap();
    let table = builder.build();

    let response = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/test"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["first", "second", "third", "handler"]
    );
}

#[tokio::test]
async fn rejecting_guard_short_circuits_the_chain() {
    let (state, _root) = state_with(None);
    let trace = Trace::default();

    let mut builder = RouteTable::builder();
    builder
        .register(
            Method::POST,
            "/api/test",
            vec![
                recording_guard(&trace, "first"),
                rejecting_guard(&trace, "gate"),
                recording_guard(&trace, "never"),
                recording_handler(&trace),
            ],
        )
        .unwrap();
    let table = builder.build();

    let result = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/test"))
        .await;

    assert_matches!(result, Err(AppError::Core(CoreError::Unauthorized(_))));
    assert_eq!(*trace.lock().unwrap(), vec!["first", "gate"]);
}

#[tokio::test]
async fn handler_error_is_returned_unchanged() {
    let (state, _root) = state_with(None);

    let mut builder = RouteTable::builder();
    builder
        .register(
            Method::POST,
            "/api/fails",
            vec![Step::handler("fails", |_ctx: RequestContext| async {
                Err::<StatusCode, _>(AppError::Core(CoreError::Conflict("taken".into())))
            })],
        )
        .unwrap();
    let table = builder.build();

    let result = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/fails"))
        .await;

    assert_matches!(result, Err(AppError::Core(CoreError::Conflict(msg))) if msg == "taken");
}

#[tokio::test]
async fn unregistered_path_is_route_not_found() {
    let (state, _root) = state_with(None);
    let mut builder = RouteTable::builder();
    builder
        .register(Method::POST, "/api/known", vec![ok_handler()])
        .unwrap();
    let table = builder.build();

    let result = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/unknown"))
        .await;

    assert_matches!(
        result,
        Err(AppError::RouteNotFound { method, path }) if method == Method::POST && path == "/api/unknown"
    );
}

#[tokio::test]
async fn lookup_is_exact_on_method_and_path() {
    let (state, _root) = state_with(None);
    let mut builder = RouteTable::builder();
    builder
        .register(Method::POST, "/api/known", vec![ok_handler()])
        .unwrap();
    let table = builder.build();

    for (method, path) in [
        (Method::GET, "/api/known"),
        (Method::POST, "/api/known/"),
        (Method::POST, "/api/Known"),
    ] {
        let result = table
            .dispatch(RequestContext::new(state.clone(), method.clone(), path))
            .await;
        assert_matches!(
            result,
            Err(AppError::RouteNotFound { .. }),
            "{method} {path} should not match"
        );
    }
}

// ---------------------------------------------------------------------------
// Built-in guards
// ---------------------------------------------------------------------------

fn guarded_table(trace: &Trace, chain: Vec<Step>) -> RouteTable {
    let mut full = chain;
    full.push(recording_handler(trace));
    let mut builder = RouteTable::builder();
    builder.register(Method::POST, "/api/guarded", full).unwrap();
    builder.build()
}

#[tokio::test]
async fn missing_token_is_unauthenticated_and_stops_the_chain() {
    let (state, _root) = state_with(Some("1234"));
    let trace = Trace::default();
    let table = guarded_table(
        &trace,
        vec![middleware::auth(), recording_guard(&trace, "after_auth")],
    );

    let result = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/guarded"))
        .await;

    assert_matches!(result, Err(AppError::Core(CoreError::Unauthorized(_))));
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test]
async fn garbage_token_is_unauthenticated() {
    let (state, _root) = state_with(Some("1234"));
    let trace = Trace::default();
    let table = guarded_table(&trace, vec![middleware::auth()]);

    let ctx = RequestContext::new(state, Method::POST, "/api/guarded")
        .with_headers(bearer("not-a-jwt"));
    let result = table.dispatch(ctx).await;

    assert_matches!(result, Err(AppError::Core(CoreError::Unauthorized(_))));
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_admin_is_forbidden_and_handler_never_runs() {
    let (state, _root) = state_with(Some("1234"));
    let trace = Trace::default();
    let table = guarded_table(&trace, vec![middleware::auth(), middleware::admin()]);

    let token = common::token_for(&state, Role::Editor);
    let ctx =
        RequestContext::new(state, Method::POST, "/api/guarded").with_headers(bearer(&token));
    let result = table.dispatch(ctx).await;

    assert_matches!(result, Err(AppError::Core(CoreError::Forbidden(_))));
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test]
async fn admin_token_passes_every_guard() {
    let (state, _root) = state_with(Some("1234"));
    let trace = Trace::default();
    let table = guarded_table(
        &trace,
        vec![middleware::auth(), middleware::admin(), middleware::readonly()],
    );

    let token = common::token_for(&state, Role::Administrator);
    let ctx =
        RequestContext::new(state, Method::POST, "/api/guarded").with_headers(bearer(&token));
    let response = table.dispatch(ctx).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*trace.lock().unwrap(), vec!["handler"]);
}

#[tokio::test]
async fn read_only_flag_blocks_mutations_for_admins() {
    let (state, _root) = state_with(Some("1234"));
    state.set_read_only(true);
    let trace = Trace::default();
    let table = guarded_table(
        &trace,
        vec![middleware::auth(), middleware::admin(), middleware::readonly()],
    );

    let token = common::token_for(&state, Role::Administrator);
    let ctx =
        RequestContext::new(state, Method::POST, "/api/guarded").with_headers(bearer(&token));
    let result = table.dispatch(ctx).await;

    assert_matches!(result, Err(AppError::Core(CoreError::ReadOnly(_))));
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reader_role_is_blocked_by_readonly_guard() {
    let (state, _root) = state_with(Some("1234"));
    let trace = Trace::default();
    let table = guarded_table(&trace, vec![middleware::auth(), middleware::readonly()]);

    let token = common::token_for(&state, Role::Reader);
    let ctx =
        RequestContext::new(state, Method::POST, "/api/guarded").with_headers(bearer(&token));
    let result = table.dispatch(ctx).await;

    assert_matches!(result, Err(AppError::Core(CoreError::ReadOnly(_))));
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test]
async fn no_access_code_means_local_owner() {
    let (state, _root) = state_with(None);
    let table = {
        let mut builder = RouteTable::builder();
        builder
            .register(
                Method::POST,
                "/api/whoami",
                vec![
                    middleware::auth(),
                    middleware::admin(),
                    Step::handler("whoami", |ctx: RequestContext| async move {
                        let identity = ctx.identity()?;
                        Ok::<_, AppError>(identity.subject.clone())
                    }),
                ],
            )
            .unwrap();
        builder.build()
    };

    let response = table
        .dispatch(RequestContext::new(state, Method::POST, "/api/whoami"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn duplicate_registration_fails() {
    let mut builder = RouteTable::builder();
    builder
        .register(Method::POST, "/api/dup", vec![ok_handler()])
        .unwrap();

    let err = builder
        .register(Method::POST, "/api/dup", vec![ok_handler()])
        .unwrap_err();
    assert_matches!(err, RouteError::Duplicate { .. });

    // Same path under another method is a different route.
    builder
        .register(Method::GET, "/api/dup", vec![ok_handler()])
        .unwrap();
    assert_eq!(builder.build().len(), 2);
}

#[test]
fn empty_chain_is_rejected() {
    let err = RouteTable::builder()
        .register(Method::POST, "/api/empty", Vec::new())
        .unwrap_err();
    assert_matches!(err, RouteError::EmptyChain { .. });
}

#[test]
fn chain_without_handler_is_rejected() {
    let err = RouteTable::builder()
        .register(Method::POST, "/api/guards-only", vec![middleware::auth()])
        .unwrap_err();
    assert_matches!(err, RouteError::MissingHandler { .. });
}

#[test]
fn handler_before_guard_is_rejected() {
    let err = RouteTable::builder()
        .register(
            Method::POST,
            "/api/backwards",
            vec![ok_handler(), middleware::auth(), ok_handler()],
        )
        .unwrap_err();
    assert_matches!(err, RouteError::HandlerNotLast { step: "ok", .. });
}

#[test]
fn role_guard_before_auth_is_rejected() {
    let err = RouteTable::builder()
        .register(
            Method::POST,
            "/api/misordered",
            vec![middleware::admin(), middleware::auth(), ok_handler()],
        )
        .unwrap_err();
    assert_matches!(
        err,
        RouteError::GuardOrder {
            guard: middleware::GUARD_ADMIN_ROLE,
            ..
        }
    );

    let err = RouteTable::builder()
        .register(
            Method::POST,
            "/api/misordered",
            vec![middleware::readonly(), ok_handler()],
        )
        .unwrap_err();
    assert_matches!(
        err,
        RouteError::GuardOrder {
            guard: middleware::GUARD_READONLY,
            ..
        }
    );
}

#[test]
fn custom_guard_without_identity_needs_no_auth() {
    let guard = Guard::new("rate_limit", |_ctx| ControlFlow::Continue(()));
    RouteTable::builder()
        .register(Method::POST, "/api/open", vec![guard.into(), ok_handler()])
        .unwrap();
}

#[test]
fn relative_path_is_rejected() {
    let err = RouteTable::builder()
        .register(Method::POST, "api/no-slash", vec![ok_handler()])
        .unwrap_err();
    assert_eq!(err, RouteError::InvalidPath("api/no-slash".into()));
}

#[tokio::test]
async fn request_id_header_reaches_the_handler() {
    let (state, _root) = state_with(None);
    let mut builder = RouteTable::builder();
    builder
        .register(
            Method::POST,
            "/api/echo-id",
            vec![Step::handler("echo_id", |ctx: RequestContext| async move {
                Ok::<_, AppError>(ctx.request_id.unwrap_or_default())
            })],
        )
        .unwrap();
    let table = builder.build();

    let (parts, ()) = Request::builder()
        .method(Method::POST)
        .uri("/api/echo-id")
        .header("x-request-id", "req-7")
        .body(())
        .unwrap()
        .into_parts();
    let ctx = RequestContext::from_parts(state, parts, Bytes::new());
    assert_eq!(ctx.request_id.as_deref(), Some("req-7"));

    let response = table.dispatch(ctx).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"req-7");
}

// ---------------------------------------------------------------------------
// The kernel table
// ---------------------------------------------------------------------------

#[test]
fn kernel_table_builds_with_expected_chains() {
    use middleware::{GUARD_ADMIN_ROLE as ADMIN, GUARD_AUTH as AUTH, GUARD_READONLY as RO};

    let table = api_routes().unwrap();

    let chain = |method: Method, path: &str| {
        table
            .lookup(&method, path)
            .unwrap_or_else(|| panic!("{method} {path} should be registered"))
            .step_names()
    };

    assert_eq!(chain(Method::GET, "/api/system/bootProgress"), vec!["boot_progress"]);
    assert_eq!(chain(Method::POST, "/api/system/bootProgress"), vec!["boot_progress"]);
    assert_eq!(chain(Method::POST, "/api/system/loginAuth"), vec!["login_auth"]);
    assert_eq!(chain(Method::POST, "/api/system/getConf"), vec![AUTH, "get_conf"]);
    assert_eq!(chain(Method::POST, "/api/system/getChangelog"), vec!["get_changelog"]);
    assert_eq!(
        chain(Method::POST, "/api/system/getSysFonts"),
        vec![AUTH, "get_sys_fonts"]
    );
    assert_eq!(
        chain(Method::POST, "/api/system/setUILayout"),
        vec![AUTH, RO, "set_ui_layout"]
    );
    assert_eq!(
        chain(Method::POST, "/api/system/setAccessAuthCode"),
        vec![AUTH, ADMIN, RO, "set_access_auth_code"]
    );
    assert_eq!(
        chain(Method::POST, "/api/system/exportLog"),
        vec![AUTH, ADMIN, "export_log"]
    );
    assert!(table.lookup(&Method::GET, "/api/system/getConf").is_none());
}

#[test]
fn every_kernel_setter_is_behind_auth_and_readonly() {
    let table = api_routes().unwrap();

    for route in table.routes() {
        let names = route.step_names();
        let name = route.path().rsplit('/').next().unwrap();
        if name.starts_with("set") || name.starts_with("create") || name.starts_with("remove") {
            assert_eq!(names.first(), Some(&middleware::GUARD_AUTH), "{}", route.path());
            assert!(
                names.contains(&middleware::GUARD_READONLY),
                "{} must be blocked in read-only mode",
                route.path()
            );
        }
        assert!(route.chain().last().unwrap().is_handler());
    }
}
