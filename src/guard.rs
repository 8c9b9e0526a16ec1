use std::{fmt, str::FromStr};

use serde::Deserialize;
use tracing::{debug, error};

use crate::{AuthorizationMiddleware, Error, Result};

/// Route registration verbs guarded by [`Guarded`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    All,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
        Method::Trace,
        Method::Connect,
        Method::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
            Method::Trace => "trace",
            Method::Connect => "connect",
            Method::All => "all",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidOptions(format!("unsupported method {s:?}")))
    }
}

/// One entry of a route's handler chain.
#[derive(Debug, Clone)]
pub enum Handler<H> {
    /// An authorization check built from a rule set.
    Authorize(AuthorizationMiddleware),
    /// Any other host handler.
    Route(H),
}

impl<H> Handler<H> {
    pub fn is_authorization(&self) -> bool {
        matches!(self, Handler::Authorize(_))
    }
}

impl<H> From<AuthorizationMiddleware> for Handler<H> {
    fn from(middleware: AuthorizationMiddleware) -> Self {
        Handler::Authorize(middleware)
    }
}

/// Route registration surface of a host router.
pub trait Registrar {
    type Handler;

    fn register(&mut self, method: Method, path: &str, handlers: Vec<Handler<Self::Handler>>);
}

/// Optional grouping of routes under a common prefix.
pub trait Namespace: Registrar + Sized {
    fn namespace<F>(&mut self, prefix: &str, routes: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>;
}

/// Registrar wrapper that refuses routes without an authorization
/// middleware.
#[derive(Debug)]
pub struct Guarded<'a, R> {
    inner: &'a mut R,
}

/// Wraps `registrar` so every route registered through it must carry at
/// least one [`AuthorizationMiddleware`].
pub fn wrap<R: Registrar>(registrar: &mut R) -> Guarded<'_, R> {
    Guarded { inner: registrar }
}

macro_rules! verbs {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            pub fn $name(&mut self, path: &str, handlers: Vec<Handler<R::Handler>>) -> Result<()> {
                self.route($method, path, handlers)
            }
        )*
    };
}

impl<'a, R: Registrar> Guarded<'a, R> {
    /// Checks the handler chain and delegates to the wrapped registrar.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<Handler<R::Handler>>,
    ) -> Result<()> {
        if !handlers.iter().any(Handler::is_authorization) {
            error!(%method, path, "refusing to register route without authorization");
            return Err(Error::UnprotectedRoute {
                method,
                path: path.to_string(),
            });
        }

        debug!(%method, path, handlers = handlers.len(), "registering route");
        self.inner.register(method, path, handlers);
        Ok(())
    }

    verbs! {
        get => Method::Get,
        post => Method::Post,
        put => Method::Put,
        patch => Method::Patch,
        delete => Method::Delete,
        head => Method::Head,
        options => Method::Options,
        trace => Method::Trace,
        connect => Method::Connect,
        all => Method::All,
    }

    /// Groups routes under `prefix`. Routes registered inside `routes` go
    /// through the same check.
    pub fn namespace<F>(&mut self, prefix: &str, routes: F) -> Result<()>
    where
        R: Namespace,
        F: FnOnce(&mut Guarded<'_, R>) -> Result<()>,
    {
        self.inner
            .namespace(prefix, |inner| routes(&mut Guarded { inner }))
    }

    pub fn into_inner(self) -> &'a mut R {
        self.inner
    }
}
