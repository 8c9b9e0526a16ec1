use serde::Deserialize;

use crate::{Error, Result};

/// Any non-empty string names a parameter or a bag.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
}

/// Authorizer configuration.
///
/// Passed once to [`Authorizer::new`](crate::Authorizer::new) and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Name of the request bag parameters are read from. When absent the
    /// context's generic parameter accessor is used.
    #[serde(default)]
    lookin: Option<String>,
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Options = serde_json::from_str(json).map_err(Error::Deserializing)?;
        options.validate()?;
        Ok(options)
    }

    #[must_use]
    pub fn look_in(mut self, bag: impl Into<String>) -> Self {
        self.lookin = Some(bag.into());
        self
    }

    pub fn lookin(&self) -> Option<&str> {
        self.lookin.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        match &self.lookin {
            Some(bag) if !is_valid_name(bag) => Err(Error::InvalidOptions(format!(
                "lookin must name a request bag, got {bag:?}"
            ))),
            _ => Ok(()),
        }
    }
}
