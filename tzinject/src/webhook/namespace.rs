use std::collections::BTreeSet;

use tzinject_base::consts::k8s::namespaces;

/// Namespaces in which admission requests are considered.
///
/// `kube-system` and `kube-public` are never admissible. An empty set admits
/// every other namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NamespaceFilter {
    allowed: BTreeSet<String>,
}

impl NamespaceFilter {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = namespaces
            .into_iter()
            .map(|namespace| namespace.as_ref().trim().to_string())
            .filter(|namespace| !namespace.is_empty())
            .collect();
        Self { allowed }
    }

    #[must_use]
    pub fn is_admissible(&self, namespace: &str) -> bool {
        if namespace == namespaces::KUBE_SYSTEM || namespace == namespaces::KUBE_PUBLIC {
            return false;
        }
        self.allowed.is_empty() || self.allowed.contains(namespace)
    }

    /// The configured namespaces, system namespaces excluded.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str).filter(|namespace| self.is_admissible(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_namespaces_are_never_admissible() {
        let filter = NamespaceFilter::new(["kube-system", "kube-public", "apps"]);
        assert!(!filter.is_admissible("kube-system"));
        assert!(!filter.is_admissible("kube-public"));
        assert!(filter.is_admissible("apps"));
        assert_eq!(filter.namespaces().collect::<Vec<_>>(), ["apps"]);

        let filter = NamespaceFilter::default();
        assert!(!filter.is_admissible("kube-system"));
    }

    #[test]
    fn test_empty_set_admits_everything_else() {
        let filter = NamespaceFilter::new([" ", ""]);
        assert!(filter.is_admissible("default"));
        assert!(filter.is_admissible("anything"));
        assert_eq!(filter.namespaces().count(), 0);
    }

    #[test]
    fn test_configured_set_restricts() {
        let filter = NamespaceFilter::new(["default", " jobs "]);
        assert!(filter.is_admissible("default"));
        assert!(filter.is_admissible("jobs"));
        assert!(!filter.is_admissible("apps"));
    }
}
