//! Loading a [`Context`] from configuration.
//!
//! ```toml
//! groups = ["public"]
//! allowed_additional_fields = ["_links"]
//! reset_missing_fields = true
//!
//! [attributes]
//! locale = "de"
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::context::Context;

/// Errors while reading a context configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid context configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Serializable mirror of [`Context`]. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    pub groups: Vec<String>,
    /// Leave unset to allow any additional field.
    pub allowed_additional_fields: Option<Vec<String>>,
    pub reset_missing_fields: bool,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ContextConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn into_context(self) -> Context {
        let builder = Context::builder()
            .groups(self.groups)
            .reset_missing_fields(self.reset_missing_fields)
            .attributes(self.attributes);
        let builder = match self.allowed_additional_fields {
            Some(fields) => builder.allowed_additional_fields(fields),
            None => builder,
        };
        builder.build()
    }
}

impl From<ContextConfig> for Context {
    fn from(config: ContextConfig) -> Self {
        config.into_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_toml_is_unrestricted() {
        let context = ContextConfig::from_toml_str("").unwrap().into_context();
        assert_eq!(context, Context::default());
    }

    #[test]
    fn toml_sets_every_key() {
        let config = ContextConfig::from_toml_str(
            r#"
groups = ["public", "admin"]
allowed_additional_fields = ["_links"]
reset_missing_fields = true

[attributes]
locale = "de"
depth = 3
"#,
        )
        .unwrap();
        let context: Context = config.into();

        assert_eq!(context.groups().len(), 2);
        assert!(context
            .allowed_additional_fields()
            .is_some_and(|f| f.contains("_links")));
        assert!(context.reset_missing_fields());
        assert_eq!(context.attribute("locale"), Some(&json!("de")));
        assert_eq!(context.attribute("depth"), Some(&json!(3)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = ContextConfig::from_toml_str("groupz = []").unwrap_err();
        assert!(err.to_string().contains("groupz"));
    }

    #[test]
    fn json_config_works_too() {
        let config: ContextConfig =
            serde_json::from_value(json!({ "allowed_additional_fields": [] })).unwrap();
        let context = config.into_context();
        assert!(context
            .allowed_additional_fields()
            .is_some_and(|f| f.is_empty()));
    }
}
