//! RBAC value helpers

use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Verbs for read access that follows changes
pub const READ_WATCH: [&str; 3] = ["get", "watch", "list"];

/// Build a resource rule from string slices
pub fn policy_rule(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(api_groups.iter().map(|g| g.to_string()).collect()),
        resources: Some(resources.iter().map(|r| r.to_string()).collect()),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// A namespaced Role holding a single rule
pub fn role(name: &str, namespace: &str, rule: PolicyRule) -> Role {
    Role {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        rules: Some(vec![rule]),
    }
}

/// Bind the Role `role_name` in `namespace` to a service account living in
/// `sa_namespace`
pub fn role_binding(
    name: &str,
    namespace: &str,
    role_name: &str,
    service_account: &str,
    sa_namespace: &str,
) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: role_name.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: service_account.to_string(),
            namespace: Some(sa_namespace.to_string()),
            ..Default::default()
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_rule_uses_the_core_group_for_empty_strings() {
        let rule = policy_rule(&[""], &["pods", "namespaces"], &READ_WATCH);
        assert_eq!(rule.api_groups, Some(vec![String::new()]));
        assert_eq!(
            rule.resources,
            Some(vec!["pods".to_string(), "namespaces".to_string()])
        );
        assert_eq!(rule.verbs, vec!["get", "watch", "list"]);
        assert_eq!(rule.non_resource_urls, None);
    }

    #[test]
    fn binding_points_at_the_role_and_service_account() {
        let rb = role_binding("rb", "apps", "r", "otel-collector", "observability");
        assert_eq!(rb.metadata.namespace.as_deref(), Some("apps"));
        assert_eq!(rb.role_ref.kind, "Role");
        assert_eq!(rb.role_ref.name, "r");
        let subject = &rb.subjects.unwrap()[0];
        assert_eq!(subject.kind, "ServiceAccount");
        assert_eq!(subject.name, "otel-collector");
        assert_eq!(subject.namespace.as_deref(), Some("observability"));
    }
}
