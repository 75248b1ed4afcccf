//! Per-call denormalization settings.

use std::collections::{BTreeMap, BTreeSet};

/// Settings shared, read-only, by every level of one denormalization call.
///
/// The default context is unrestricted: all groups active, any additional
/// field allowed, missing fields left untouched.
///
/// The engine itself does not read any attribute; attributes exist for
/// custom converters and policies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    groups: BTreeSet<String>,
    allowed_additional_fields: Option<BTreeSet<String>>,
    reset_missing_fields: bool,
    attributes: BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Active groups. Empty means every field is active.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Additional (unmapped) input keys that are tolerated.
    ///
    /// `None` tolerates any key; `Some` of an empty set tolerates none.
    pub fn allowed_additional_fields(&self) -> Option<&BTreeSet<String>> {
        self.allowed_additional_fields.as_ref()
    }

    /// Whether mapped fields absent from the input are cleared.
    pub fn reset_missing_fields(&self) -> bool {
        self.reset_missing_fields
    }

    pub fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

/// Builder for [`Context`].
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    context: Context,
}

impl ContextBuilder {
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_additional_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.allowed_additional_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Drop any allow-list set earlier: every additional field is tolerated.
    pub fn any_additional_fields(mut self) -> Self {
        self.context.allowed_additional_fields = None;
        self
    }

    pub fn reset_missing_fields(mut self, reset: bool) -> Self {
        self.context.reset_missing_fields = reset;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.attributes.insert(name.into(), value);
        self
    }

    pub fn attributes(mut self, attributes: BTreeMap<String, serde_json::Value>) -> Self {
        self.context.attributes = attributes;
        self
    }

    pub fn build(self) -> Context {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_unrestricted() {
        let context = Context::default();
        assert!(context.groups().is_empty());
        assert_eq!(context.allowed_additional_fields(), None);
        assert!(!context.reset_missing_fields());
        assert!(context.attributes().is_empty());
    }

    #[test]
    fn builder_sets_everything() {
        let context = Context::builder()
            .groups(["admin"])
            .allowed_additional_fields(["_links"])
            .reset_missing_fields(true)
            .attribute("locale", json!("de"))
            .build();

        assert!(context.groups().contains("admin"));
        assert!(context
            .allowed_additional_fields()
            .is_some_and(|allowed| allowed.contains("_links")));
        assert!(context.reset_missing_fields());
        assert_eq!(context.attribute("locale"), Some(&json!("de")));
    }

    #[test]
    fn empty_allow_list_differs_from_unrestricted() {
        let strict = Context::builder()
            .allowed_additional_fields(Vec::<String>::new())
            .build();
        assert_eq!(strict.allowed_additional_fields(), Some(&BTreeSet::new()));

        let loose = Context::builder()
            .allowed_additional_fields(["a"])
            .any_additional_fields()
            .build();
        assert_eq!(loose.allowed_additional_fields(), None);
    }
}
