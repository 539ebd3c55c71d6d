//! Chain steps: guards and terminal handlers.

use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::FutureExt;

use super::context::RequestContext;
use crate::error::{AppError, AppResult};

/// Outcome of a guard: `Continue(())` runs the next step, `Break(err)` ends the chain.
pub type GuardOutcome = ControlFlow<AppError>;

type GuardFn = dyn Fn(&mut RequestContext) -> GuardOutcome + Send + Sync;
type HandlerFn = dyn Fn(RequestContext) -> BoxFuture<'static, AppResult<Response>> + Send + Sync;

/// A step that may stop a request before it reaches the handler.
#[derive(Clone)]
pub struct Guard {
    name: &'static str,
    /// Attaches an identity for later steps.
    provides_identity: bool,
    /// Needs an identity-providing guard earlier in the chain.
    requires_identity: bool,
    check: Arc<GuardFn>,
}

impl Guard {
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&mut RequestContext) -> GuardOutcome + Send + Sync + 'static,
    {
        Self {
            name,
            provides_identity: false,
            requires_identity: false,
            check: Arc::new(check),
        }
    }

    pub fn providing_identity(mut self) -> Self {
        self.provides_identity = true;
        self
    }

    pub fn requiring_identity(mut self) -> Self {
        self.requires_identity = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn provides_identity(&self) -> bool {
        self.provides_identity
    }

    pub fn requires_identity(&self) -> bool {
        self.requires_identity
    }

    pub fn check(&self, ctx: &mut RequestContext) -> GuardOutcome {
        (self.check)(ctx)
    }
}

/// The terminal step that produces the response.
#[derive(Clone)]
pub struct Handler {
    name: &'static str,
    call: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async function whose output converts into a response.
    pub fn new<F, Fut, R>(name: &'static str, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<R>> + Send + 'static,
        R: IntoResponse,
    {
        let call: Arc<HandlerFn> = Arc::new(
            move |ctx: RequestContext| -> BoxFuture<'static, AppResult<Response>> {
                f(ctx)
                    .map(|result| result.map(IntoResponse::into_response))
                    .boxed()
            },
        );
        Self { name, call }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn call(&self, ctx: RequestContext) -> AppResult<Response> {
        (self.call)(ctx).await
    }
}

/// One element of a route chain.
#[derive(Clone)]
pub enum Step {
    Guard(Guard),
    Handler(Handler),
}

impl Step {
    pub fn guard<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&mut RequestContext) -> GuardOutcome + Send + Sync + 'static,
    {
        Step::Guard(Guard::new(name, check))
    }

    pub fn handler<F, Fut, R>(name: &'static str, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<R>> + Send + 'static,
        R: IntoResponse,
    {
        Step::Handler(Handler::new(name, f))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Guard(g) => g.name(),
            Step::Handler(h) => h.name(),
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, Step::Handler(_))
    }
}

impl From<Guard> for Step {
    fn from(guard: Guard) -> Self {
        Step::Guard(guard)
    }
}

impl From<Handler> for Step {
    fn from(handler: Handler) -> Self {
        Step::Handler(handler)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Guard(g) => write!(f, "Guard({})", g.name()),
            Step::Handler(h) => write!(f, "Handler({})", h.name()),
        }
    }
}
