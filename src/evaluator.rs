use std::{fmt, sync::Arc};

use tracing::{debug, warn};

use crate::{BoxError, Decision, RequestContext, Rule, RuleResult};

/// Status sent when a request is not authorized.
pub const FORBIDDEN: u16 = 403;

/// Ordered list of rules. Order matters: the last rule with an opinion wins.
#[derive(Clone, Default)]
pub struct RuleSet(Vec<Arc<dyn Rule>>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rule` after every rule already in the set.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.0.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds the decisions of every rule, in order, into a verdict.
    ///
    /// Rules run one at a time; a rule is not started before the previous one
    /// has completed. The verdict starts as `false`, `Allow` sets it, `Deny`
    /// clears it and `Abstain` leaves it alone. A failing rule stops the fold
    /// and its error is returned as-is.
    ///
    /// There is no timeout: a rule that never completes stalls the evaluation.
    pub async fn evaluate(&self, context: &dyn RequestContext) -> RuleResult<bool> {
        let mut authorized = false;
        for (index, rule) in self.0.iter().enumerate() {
            let decision = match rule.decide(context).await {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(rule = index, kind = rule.name(), error = %e, "rule evaluation failed");
                    return Err(e);
                }
            };
            debug!(rule = index, kind = rule.name(), ?decision, "rule evaluated");

            match decision {
                Decision::Allow => authorized = true,
                Decision::Deny => authorized = false,
                Decision::Abstain => {}
            }
        }
        Ok(authorized)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(Rule::name))
            .finish()
    }
}

/// Builds a [`RuleSet`] from rules listed in evaluation order.
///
/// ```
/// use allow_route::{anyone, rules};
///
/// let rules = rules![anyone()];
/// assert_eq!(1, rules.len());
/// ```
#[macro_export]
macro_rules! rules {
    ($($rule:expr),* $(,)?) => {
        $crate::RuleSet::new()$(.rule($rule))*
    };
}

/// What the pipeline should do with a request after authorization.
#[derive(Debug)]
pub enum Outcome {
    /// Hand the request to the next handler.
    Proceed,
    /// Answer with the given status. Always [`FORBIDDEN`].
    Reject(u16),
    /// Route the error to the pipeline's error handling.
    Fail(BoxError),
}

/// Continuations of the host pipeline. Exactly one of them is invoked per
/// request, which is why each one consumes `self`.
pub trait Next {
    fn proceed(self);

    fn reject(self, status: u16);

    fn fail(self, error: BoxError);
}

/// A [`RuleSet`] ready to be mounted in front of a route.
///
/// Cloning is cheap; clones share the same rules.
#[derive(Debug, Clone)]
pub struct AuthorizationMiddleware {
    rules: Arc<RuleSet>,
}

impl AuthorizationMiddleware {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub async fn authorize(&self, context: &dyn RequestContext) -> Outcome {
        match self.rules.evaluate(context).await {
            Ok(true) => {
                debug!("request authorized");
                Outcome::Proceed
            }
            Ok(false) => {
                debug!(status = FORBIDDEN, "request rejected");
                Outcome::Reject(FORBIDDEN)
            }
            Err(e) => Outcome::Fail(e),
        }
    }

    pub async fn handle<N: Next>(&self, context: &dyn RequestContext, next: N) {
        match self.authorize(context).await {
            Outcome::Proceed => next.proceed(),
            Outcome::Reject(status) => next.reject(status),
            Outcome::Fail(e) => next.fail(e),
        }
    }
}

impl From<RuleSet> for AuthorizationMiddleware {
    fn from(rules: RuleSet) -> Self {
        Self::new(rules)
    }
}
