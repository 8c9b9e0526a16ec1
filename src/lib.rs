//! Route-level authorization built from ordered `grant`/`revoke` rules.
//!
//! ```
//! use allow_route::{grant, revoke, rules, Authorizer, BoxError, Options, Request};
//! use serde_json::{json, Value};
//!
//! # fn main() -> allow_route::Result<()> {
//! let auth = Authorizer::new(Options::default())?;
//! let is_admin = auth.where_(
//!     |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!("admin")) },
//!     vec!["role"],
//! )?;
//! let is_locked = auth.where_(
//!     |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!(true)) },
//!     vec!["locked"],
//! )?;
//!
//! let middleware = auth.middleware(rules![grant(is_admin), revoke(is_locked)]);
//! let request = Request::new().with_param("role", "admin");
//! let authorized = futures::executor::block_on(middleware.rules().evaluate(&request));
//! assert!(authorized.unwrap());
//! # Ok(())
//! # }
//! ```
#![deny(rust_2018_idioms, warnings)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::similar_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::match_same_arms,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]
mod context;
mod errors;
mod evaluator;
mod guard;
mod options;
mod predicate;
mod rule;

use std::{future::Future, sync::Arc};

use serde_json::Value;

pub use context::{Request, RequestContext};
pub use errors::{BoxError, Error, Result, RuleResult};
pub use evaluator::{AuthorizationMiddleware, Next, Outcome, RuleSet, FORBIDDEN};
pub use guard::{wrap, Guarded, Handler, Method, Namespace, Registrar};
pub use options::Options;
pub use predicate::{Param, Where};
pub use rule::{anyone, grant, revoke, Anyone, Decision, Grant, Predicate, Revoke, Rule};

/// Entry point holding the configuration shared by every predicate and
/// middleware it builds.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    options: Arc<Options>,
}

impl Authorizer {
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Builds a predicate that calls `func` with the values of `params`,
    /// resolved against the request in the given order.
    ///
    /// Parameter keys are read from the configured `lookin` bag, or through
    /// [`RequestContext::param`] when none is set.
    pub fn where_<F, Fut, I>(&self, func: F, params: I) -> Result<Where<F>>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RuleResult<bool>> + Send + 'static,
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        Where::new(func, params, Arc::clone(&self.options))
    }

    /// Convenience wrapper around [`AuthorizationMiddleware::new`]; no
    /// authorizer configuration is applied to `rules`.
    #[allow(clippy::unused_self)]
    pub fn middleware(&self, rules: RuleSet) -> AuthorizationMiddleware {
        AuthorizationMiddleware::new(rules)
    }

    #[allow(clippy::unused_self)]
    pub fn wrap<'a, R: Registrar>(&self, registrar: &'a mut R) -> Guarded<'a, R> {
        wrap(registrar)
    }
}
