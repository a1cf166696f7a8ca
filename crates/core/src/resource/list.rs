use json_patch::{Patch, jsonptr::Pointer};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::Error, injector::Injector, pointer, resource::Resource};

/// A `v1/List` whose items may be of any kind, including nested lists.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub items: Vec<Value>,
}

impl ResourceList {
    /// Generates patches for every recognized item, addressed as
    /// `<prefix>/items/<index>`.
    ///
    /// # Errors
    ///
    /// The first item that fails to decode or to generate aborts the whole
    /// list.
    pub fn expand(&self, injector: &Injector<'_>, prefix: &Pointer) -> Result<Patch, Error> {
        let mut operations = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            let Some(resource) = Resource::classify(item)? else {
                tracing::debug!(index, "Skip list item of unrecognized kind");
                continue;
            };
            let path = pointer::join(prefix, ["items", index.to_string().as_str()]);
            operations.extend(injector.generate(&resource, &path)?.0);
        }
        Ok(Patch(operations))
    }
}

#[cfg(test)]
mod tests {
    use json_patch::PatchOperation;
    use serde_json::json;

    use super::*;
    use crate::resolver::InjectionDefaults;

    fn paths(patch: &Patch) -> Vec<String> {
        serde_json::to_value(patch)
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|operation| operation["path"].as_str().unwrap().to_string())
            .collect()
    }

    fn pod(name: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name},
            "spec": {"containers": [{"name": name}]}
        })
    }

    #[test]
    fn test_skip_unrecognized_items() {
        let list = ResourceList {
            items: vec![
                pod("web"),
                json!({"apiVersion": "v1", "kind": "Service", "metadata": {"name": "web"}}),
                json!({
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "metadata": {"name": "api"},
                    "spec": {
                        "selector": {},
                        "template": {"spec": {"containers": [{"name": "api"}]}}
                    }
                }),
            ],
        };
        let defaults = InjectionDefaults::default();

        let patch = list.expand(&Injector::new(&defaults), Pointer::root()).unwrap();

        let paths = paths(&patch);
        assert!(!paths.is_empty());
        assert!(paths.iter().any(|path| path.starts_with("/items/0/")));
        assert!(paths.iter().any(|path| path.starts_with("/items/2/")));
        assert!(
            paths.iter().all(|path| path.starts_with("/items/0/") || path.starts_with("/items/2/"))
        );
        assert!(patch.0.iter().all(|operation| matches!(operation, PatchOperation::Add(_))));
    }

    #[test]
    fn test_nested_list() {
        let list = ResourceList {
            items: vec![json!({"apiVersion": "v1", "kind": "List", "items": [pod("a"), pod("b")]})],
        };
        let defaults = InjectionDefaults::default();

        let patch = list.expand(&Injector::new(&defaults), Pointer::root()).unwrap();

        let paths = paths(&patch);
        assert!(paths.iter().any(|path| path.starts_with("/items/0/items/0/spec/")));
        assert!(paths.iter().any(|path| path.starts_with("/items/0/items/1/spec/")));
    }

    #[test]
    fn test_first_failure_aborts() {
        let list = ResourceList {
            items: vec![pod("web"), json!({"kind": "Pod", "spec": {"containers": 1}})],
        };
        let defaults = InjectionDefaults::default();

        assert!(list.expand(&Injector::new(&defaults), Pointer::root()).is_err());
    }

    #[test]
    fn test_items_without_metadata() {
        let mut document = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"apiVersion": "v1", "kind": "Pod", "spec": {"containers": [{"name": "a"}]}},
                {
                    "apiVersion": "apps/v1",
                    "kind": "StatefulSet",
                    "spec": {
                        "selector": {"matchLabels": {"app": "db"}},
                        "serviceName": "db",
                        "template": {"spec": {"containers": [{"name": "db"}]}}
                    }
                }
            ]
        });
        let list = ResourceList::deserialize(&document).unwrap();
        let defaults = InjectionDefaults::default();
        let patch = list.expand(&Injector::new(&defaults), Pointer::root()).unwrap();
        assert!(paths(&patch).contains(&"/items/0/metadata".to_string()));
        assert!(paths(&patch).contains(&"/items/1/metadata".to_string()));

        json_patch::patch(&mut document, &patch).unwrap();
        for item in document["items"].as_array().unwrap() {
            assert_eq!(item["metadata"]["annotations"]["timezone.tzinject.io/injected"], "true");
        }
    }

    #[test]
    fn test_empty_list() {
        let defaults = InjectionDefaults::default();
        let patch =
            ResourceList::default().expand(&Injector::new(&defaults), Pointer::root()).unwrap();
        assert!(patch.0.is_empty());
    }
}
