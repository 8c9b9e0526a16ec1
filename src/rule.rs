use std::sync::Arc;

use async_trait::async_trait;

use crate::{RequestContext, RuleResult};

/// Opinion of a single rule about a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// The rule expresses no opinion; the verdict so far is kept.
    Abstain,
}

/// A single authorization rule.
///
/// Rules may await external lookups before deciding. A rule error aborts the
/// evaluation of the whole rule set.
#[async_trait]
pub trait Rule: Send + Sync {
    async fn decide(&self, context: &dyn RequestContext) -> RuleResult<Decision>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str {
        "rule"
    }
}

/// Raw `true`/`false` outcome about a request, turned into a
/// [`Decision`] by [`grant`] or [`revoke`].
#[async_trait]
pub trait Predicate: Send + Sync {
    async fn test(&self, context: &dyn RequestContext) -> RuleResult<bool>;
}

#[async_trait]
impl<R> Rule for Arc<R>
where
    R: Rule + ?Sized,
{
    async fn decide(&self, context: &dyn RequestContext) -> RuleResult<Decision> {
        (**self).decide(context).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<P> Predicate for Arc<P>
where
    P: Predicate + ?Sized,
{
    async fn test(&self, context: &dyn RequestContext) -> RuleResult<bool> {
        (**self).test(context).await
    }
}

/// Allows the request when `predicate` holds, abstains otherwise.
pub fn grant<P: Predicate>(predicate: P) -> Grant<P> {
    Grant(predicate)
}

/// Denies the request when `predicate` holds, abstains otherwise.
pub fn revoke<P: Predicate>(predicate: P) -> Revoke<P> {
    Revoke(predicate)
}

/// Allows every request. Useful as a baseline that later rules revoke.
pub fn anyone() -> Anyone {
    Anyone
}

#[derive(Debug, Clone)]
pub struct Grant<P>(P);

#[async_trait]
impl<P: Predicate> Rule for Grant<P> {
    async fn decide(&self, context: &dyn RequestContext) -> RuleResult<Decision> {
        Ok(if self.0.test(context).await? {
            Decision::Allow
        } else {
            Decision::Abstain
        })
    }

    fn name(&self) -> &'static str {
        "grant"
    }
}

#[derive(Debug, Clone)]
pub struct Revoke<P>(P);

#[async_trait]
impl<P: Predicate> Rule for Revoke<P> {
    async fn decide(&self, context: &dyn RequestContext) -> RuleResult<Decision> {
        Ok(if self.0.test(context).await? {
            Decision::Deny
        } else {
            Decision::Abstain
        })
    }

    fn name(&self) -> &'static str {
        "revoke"
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Anyone;

#[async_trait]
impl Rule for Anyone {
    async fn decide(&self, _context: &dyn RequestContext) -> RuleResult<Decision> {
        Ok(Decision::Allow)
    }

    fn name(&self) -> &'static str {
        "anyone"
    }
}
