//! Taiga role permissions
//!
//! Maps Taiga role names onto the capabilities that unlock tools. Unknown
//! roles get nothing.

use std::collections::BTreeSet;

use sprintwright_core::RoleSet;

pub const VIEW_PROJECT: &str = "view_project";
pub const VIEW_MILESTONES: &str = "view_milestones";
pub const VIEW_US: &str = "view_us";
pub const ADD_US: &str = "add_us";
pub const ADD_TASK: &str = "add_task";

const ALL: &[&str] = &[VIEW_PROJECT, VIEW_MILESTONES, VIEW_US, ADD_US, ADD_TASK];
const CONTRIBUTOR: &[&str] = &[VIEW_PROJECT, VIEW_MILESTONES, VIEW_US, ADD_TASK];
const VIEWER: &[&str] = &[VIEW_PROJECT, VIEW_MILESTONES, VIEW_US];

/// Role name (normalized) to capabilities
pub const ROLE_PERMISSIONS: &[(&str, &[&str])] = &[
    ("product-owner", ALL),
    ("scrum-master", ALL),
    ("developer", CONTRIBUTOR),
    ("back", CONTRIBUTOR),
    ("front", CONTRIBUTOR),
    ("ux", CONTRIBUTOR),
    ("design", CONTRIBUTOR),
    ("stakeholder", VIEWER),
];

pub fn role_capabilities(role: &str) -> &'static [&'static str] {
    ROLE_PERMISSIONS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, caps)| *caps)
        .unwrap_or(&[])
}

/// Union of the capabilities of every role in the set
pub fn capabilities_for(roles: &RoleSet) -> BTreeSet<&'static str> {
    roles
        .iter()
        .flat_map(|role| role_capabilities(role).iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_owner_has_everything() {
        assert_eq!(capabilities_for(&RoleSet::parse("Product Owner")).len(), ALL.len());
    }

    #[test]
    fn test_developer_cannot_add_stories() {
        let caps = capabilities_for(&RoleSet::parse("developer"));
        assert!(caps.contains(ADD_TASK));
        assert!(!caps.contains(ADD_US));
    }

    #[test]
    fn test_stakeholder_is_read_only() {
        let caps = capabilities_for(&RoleSet::parse("stakeholder"));
        assert!(caps.contains(VIEW_US));
        assert!(!caps.contains(ADD_TASK));
    }

    #[test]
    fn test_roles_union() {
        let caps = capabilities_for(&RoleSet::parse("stakeholder, UX"));
        assert!(caps.contains(ADD_TASK));
    }

    #[test]
    fn test_unknown_role_has_nothing() {
        assert!(capabilities_for(&RoleSet::parse("guest")).is_empty());
        assert!(role_capabilities("admin").is_empty());
    }
}
