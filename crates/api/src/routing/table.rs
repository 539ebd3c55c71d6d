//! The route table: exact (method, path) lookup over frozen step chains.

use axum::http::Method;
use axum::response::Response;
use indexmap::IndexMap;

use super::context::RequestContext;
use super::step::Step;
use crate::error::{AppError, AppResult};

/// Registration failures. All of them are programming errors surfaced at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },

    #[error("Route {method} {path} has an empty chain")]
    EmptyChain { method: Method, path: String },

    #[error("Route {method} {path} must end with exactly one handler")]
    MissingHandler { method: Method, path: String },

    #[error("Route {method} {path}: handler '{step}' must be the last step")]
    HandlerNotLast {
        method: Method,
        path: String,
        step: &'static str,
    },

    #[error("Route {method} {path}: guard '{guard}' needs an authentication guard before it")]
    GuardOrder {
        method: Method,
        path: String,
        guard: &'static str,
    },

    #[error("Route path '{0}' must start with '/'")]
    InvalidPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    path: String,
}

/// A registered route: the guards in order, then the terminal handler.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    path: String,
    chain: Vec<Step>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn chain(&self) -> &[Step] {
        &self.chain
    }

    /// Step names in declared order, handler last.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(Step::name).collect()
    }
}

/// Collects routes before the server starts. Rejects ambiguous or malformed chains.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: IndexMap<RouteKey, Route>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Duplicate (method, path) pairs fail.
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        chain: Vec<Step>,
    ) -> Result<&mut Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_string()));
        }
        validate_chain(&method, path, &chain)?;

        let key = RouteKey {
            method: method.clone(),
            path: path.to_string(),
        };
        if self.routes.contains_key(&key) {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }

        self.routes.insert(
            key,
            Route {
                method,
                path: path.to_string(),
                chain,
            },
        );
        Ok(self)
    }

    /// Register the same chain under several methods.
    pub fn register_methods(
        &mut self,
        methods: &[Method],
        path: &str,
        chain: Vec<Step>,
    ) -> Result<&mut Self, RouteError> {
        for method in methods {
            self.register(method.clone(), path, chain.clone())?;
        }
        Ok(self)
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            routes: self.routes,
        }
    }
}

fn validate_chain(method: &Method, path: &str, chain: &[Step]) -> Result<(), RouteError> {
    let Some((last, guards)) = chain.split_last() else {
        return Err(RouteError::EmptyChain {
            method: method.clone(),
            path: path.to_string(),
        });
    };

    if !last.is_handler() {
        return Err(RouteError::MissingHandler {
            method: method.clone(),
            path: path.to_string(),
        });
    }

    let mut identity_available = false;
    for step in guards {
        match step {
            Step::Handler(h) => {
                return Err(RouteError::HandlerNotLast {
                    method: method.clone(),
                    path: path.to_string(),
                    step: h.name(),
                });
            }
            Step::Guard(g) => {
                if g.requires_identity() && !identity_available {
                    return Err(RouteError::GuardOrder {
                        method: method.clone(),
                        path: path.to_string(),
                        guard: g.name(),
                    });
                }
                identity_available |= g.provides_identity();
            }
        }
    }
    Ok(())
}

/// Immutable route table shared by every request task.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: IndexMap<RouteKey, Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Exact (method, path) lookup.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.get(&RouteKey {
            method: method.clone(),
            path: path.to_string(),
        })
    }

    /// Routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for the request and run its chain left to right.
    ///
    /// A guard that breaks ends the chain with its error; handler errors are
    /// returned untouched.
    pub async fn dispatch(&self, mut ctx: RequestContext) -> AppResult<Response> {
        let route = self.lookup(&ctx.method, &ctx.path).ok_or_else(|| {
            tracing::debug!(
                method = %ctx.method,
                path = %ctx.path,
                request_id = ctx.request_id.as_deref(),
                "No route matched"
            );
            AppError::RouteNotFound {
                method: ctx.method.clone(),
                path: ctx.path.clone(),
            }
        })?;

        for step in route.chain() {
            match step {
                Step::Guard(guard) => {
                    if let std::ops::ControlFlow::Break(err) = guard.check(&mut ctx) {
                        tracing::debug!(
                            method = %ctx.method,
                            path = %ctx.path,
                            request_id = ctx.request_id.as_deref(),
                            guard = guard.name(),
                            error = %err,
                            "Guard rejected request"
                        );
                        return Err(err);
                    }
                }
                Step::Handler(handler) => {
                    tracing::debug!(
                        method = %ctx.method,
                        path = %ctx.path,
                        request_id = ctx.request_id.as_deref(),
                        handler = handler.name(),
                        "Dispatching to handler"
                    );
                    return handler.call(ctx).await;
                }
            }
        }

        // Unreachable for tables built through `RouteTableBuilder`.
        Err(AppError::InternalError(format!(
            "Route {} {} has no handler",
            route.method(),
            route.path()
        )))
    }
}
