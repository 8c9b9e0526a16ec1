use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::{options::is_valid_name, Error, Options, Predicate, RequestContext, Result, RuleResult};

type Derivation = dyn Fn(&dyn RequestContext) -> Value + Send + Sync;

/// Describes how one argument of a [`Where`] predicate is obtained from the
/// request.
#[derive(Clone)]
pub enum Param {
    /// Read a named parameter through the context accessor.
    Key(String),
    /// Compute a value from the context, synchronously, on every request.
    Derive(Arc<Derivation>),
}

impl Param {
    pub fn key(name: impl Into<String>) -> Self {
        Param::Key(name.into())
    }

    pub fn derive<F>(derivation: F) -> Self
    where
        F: Fn(&dyn RequestContext) -> Value + Send + Sync + 'static,
    {
        Param::Derive(Arc::new(derivation))
    }

    fn validate(&self) -> Result<()> {
        match self {
            Param::Key(name) if !is_valid_name(name) => Err(Error::InvalidParameter(
                "parameter name must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn resolve(&self, context: &dyn RequestContext, options: &Options) -> Value {
        match self {
            Param::Key(name) => {
                let value = match options.lookin() {
                    Some(bag) => context.bag(bag, name),
                    None => context.param(name),
                };
                value.unwrap_or(Value::Null)
            }
            Param::Derive(derivation) => derivation(context),
        }
    }
}

impl From<&str> for Param {
    fn from(name: &str) -> Self {
        Param::key(name)
    }
}

impl From<String> for Param {
    fn from(name: String) -> Self {
        Param::Key(name)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Key(name) => f.debug_tuple("Key").field(name).finish(),
            Param::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Predicate built from a plain async function and a list of argument
/// specifiers.
///
/// On every request the specifiers are resolved in order and the function is
/// called with exactly one value per specifier.
pub struct Where<F> {
    func: F,
    params: Vec<Param>,
    options: Arc<Options>,
}

impl<F, Fut> Where<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RuleResult<bool>> + Send + 'static,
{
    /// Fails if any specifier is malformed.
    pub fn new<I>(func: F, params: I, options: Arc<Options>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Param>,
    {
        let params: Vec<Param> = params.into_iter().map(Into::into).collect();
        for param in &params {
            param.validate()?;
        }

        Ok(Self {
            func,
            params,
            options,
        })
    }
}

impl<F> fmt::Debug for Where<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Where")
            .field("params", &self.params)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Predicate for Where<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RuleResult<bool>> + Send + 'static,
{
    async fn test(&self, context: &dyn RequestContext) -> RuleResult<bool> {
        let args = self
            .params
            .iter()
            .map(|param| param.resolve(context, &self.options))
            .collect();
        (self.func)(args).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use futures::executor::block_on;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::{rule::tests::LookupFailed, BoxError, Request};

    fn options() -> Arc<Options> {
        Arc::new(Options::default())
    }

    #[test]
    fn resolves_keys_and_derivations_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let predicate = Where::new(
            move |args: Vec<Value>| {
                recorder.lock().unwrap().push(args);
                async { Ok::<_, BoxError>(true) }
            },
            vec![
                Param::key("a"),
                Param::derive(|context| context.bag("session", "user").unwrap_or_default()),
            ],
            options(),
        )
        .unwrap();

        let request = Request::new()
            .with_param("a", "first")
            .with_value("session", "user", "alice");
        assert_matches!(block_on(predicate.test(&request)), Ok(true));

        let seen = seen.lock().unwrap();
        assert_eq!(1, seen.len());
        assert_eq!(vec![json!("first"), json!("alice")], seen[0]);
    }

    #[test]
    fn derivation_receives_the_request() {
        let predicate = Where::new(
            |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!(7)) },
            vec![Param::derive(|context| {
                context.param("id").map_or(Value::Null, |id| json!(id.as_i64().unwrap_or(0) + 1))
            })],
            options(),
        )
        .unwrap();

        assert_matches!(
            block_on(predicate.test(&Request::new().with_param("id", 6))),
            Ok(true)
        );
        assert_matches!(
            block_on(predicate.test(&Request::new().with_param("id", 1))),
            Ok(false)
        );
    }

    #[test]
    fn no_params_calls_with_no_values() {
        let predicate = Where::new(
            |args: Vec<Value>| async move { Ok::<_, BoxError>(args.is_empty()) },
            Vec::<Param>::new(),
            options(),
        )
        .unwrap();

        assert_matches!(block_on(predicate.test(&Request::new())), Ok(true));
    }

    #[test]
    fn missing_key_resolves_to_null() {
        let predicate = Where::new(
            |args: Vec<Value>| async move { Ok::<_, BoxError>(args == vec![Value::Null]) },
            vec!["owner"],
            options(),
        )
        .unwrap();

        assert_matches!(block_on(predicate.test(&Request::new())), Ok(true));
    }

    #[test]
    fn lookin_reads_from_named_bag() {
        let predicate = Where::new(
            |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!("from-query")) },
            vec!["id"],
            Arc::new(Options::default().look_in("query")),
        )
        .unwrap();

        let request = Request::new()
            .with_param("id", "from-params")
            .with_value("query", "id", "from-query");
        assert_matches!(block_on(predicate.test(&request)), Ok(true));

        // generic accessor is not consulted when a bag is configured.
        let request = Request::new().with_param("id", "from-query");
        assert_matches!(block_on(predicate.test(&request)), Ok(false));
    }

    #[test]
    fn failure_is_returned_unchanged() {
        let predicate = Where::new(
            |_: Vec<Value>| async { Err::<bool, BoxError>(Box::new(LookupFailed("db"))) },
            vec!["id"],
            options(),
        )
        .unwrap();

        let error = block_on(predicate.test(&Request::new())).unwrap_err();
        assert_eq!("lookup failed: db", error.to_string());
        assert!(error.downcast_ref::<LookupFailed>().is_some());
    }

    #[test]
    fn empty_key_fails_at_construction() {
        let result = Where::new(
            |_: Vec<Value>| async { Ok::<_, BoxError>(true) },
            vec![Param::key("ok"), Param::key("")],
            options(),
        );
        assert_matches!(result, Err(Error::InvalidParameter(_)));
    }

    #[test_case("0" ; "digit")]
    #[test_case("x:y" ; "colon")]
    #[test_case("user id" ; "whitespace")]
    fn any_non_empty_key_is_resolved(name: &'static str) {
        let predicate = Where::new(
            |args: Vec<Value>| async move { Ok::<_, BoxError>(args[0] == json!("found")) },
            vec![name],
            options(),
        )
        .unwrap();

        let request = Request::new().with_param(name, "found");
        assert_matches!(block_on(predicate.test(&request)), Ok(true));
    }

    #[test]
    fn specifiers_from_strings() {
        assert_matches!(Param::from("id"), Param::Key(name) if name == "id");
        assert_matches!(Param::from(String::from("id")), Param::Key(name) if name == "id");
        assert_eq!("Derive(..)", format!("{:?}", Param::derive(|_| Value::Null)));
    }
}
