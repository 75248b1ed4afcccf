//! Field visibility policies.

use std::collections::BTreeSet;

use crate::context::Context;
use crate::object::ObjectRef;

/// Decides whether a field mapping takes part in a call.
pub trait Policy {
    fn is_compliant(&self, context: &Context, object: &ObjectRef) -> bool;
}

/// Group check shared by every field mapping.
///
/// A field without groups is always active, as is every field when the
/// context has no active groups. Otherwise the two sets must intersect.
pub fn is_group_compliant(context: &Context, groups: &BTreeSet<String>) -> bool {
    if groups.is_empty() || context.groups().is_empty() {
        return true;
    }
    groups.iter().any(|group| context.groups().contains(group))
}

/// [`is_group_compliant`] as a [`Policy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPolicy {
    groups: BTreeSet<String>,
}

impl GroupPolicy {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupPolicy {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }
}

impl Policy for GroupPolicy {
    fn is_compliant(&self, context: &Context, _object: &ObjectRef) -> bool {
        is_group_compliant(context, &self.groups)
    }
}

/// A policy backed by a closure.
pub struct CallbackPolicy<F> {
    callback: F,
}

impl<F> CallbackPolicy<F>
where
    F: Fn(&Context, &ObjectRef) -> bool,
{
    pub fn new(callback: F) -> Self {
        CallbackPolicy { callback }
    }
}

impl<F> Policy for CallbackPolicy<F>
where
    F: Fn(&Context, &ObjectRef) -> bool,
{
    fn is_compliant(&self, context: &Context, object: &ObjectRef) -> bool {
        (self.callback)(context, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{object_ref, Record};
    use serde_json::json;

    fn groups(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn field_without_groups_is_always_compliant() {
        let context = Context::builder().groups(["admin"]).build();
        assert!(is_group_compliant(&context, &groups(&[])));
    }

    #[test]
    fn empty_context_groups_allow_everything() {
        assert!(is_group_compliant(&Context::default(), &groups(&["admin"])));
    }

    #[test]
    fn intersecting_groups_are_compliant() {
        let context = Context::builder().groups(["public", "admin"]).build();
        assert!(is_group_compliant(&context, &groups(&["admin", "internal"])));
    }

    #[test]
    fn disjoint_groups_are_not_compliant() {
        let context = Context::builder().groups(["public"]).build();
        assert!(!is_group_compliant(&context, &groups(&["admin"])));
    }

    #[test]
    fn group_match_is_exact() {
        let context = Context::builder().groups(["Admin"]).build();
        assert!(!is_group_compliant(&context, &groups(&["admin"])));
    }

    #[test]
    fn group_policy_ignores_object() {
        let object = object_ref(Record::new("Order", ["id"]));
        let policy = GroupPolicy::new(["admin"]);
        let context = Context::builder().groups(["admin"]).build();
        assert!(policy.is_compliant(&context, &object));
        assert!(!policy.is_compliant(&Context::builder().groups(["x"]).build(), &object));
    }

    #[test]
    fn callback_policy_reads_attributes() {
        let object = object_ref(Record::new("Order", ["id"]));
        let policy =
            CallbackPolicy::new(|context: &Context, _: &ObjectRef| context.attribute("locked").is_none());
        assert!(policy.is_compliant(&Context::default(), &object));
        let locked = Context::builder().attribute("locked", json!(true)).build();
        assert!(!policy.is_compliant(&locked, &object));
    }
}
