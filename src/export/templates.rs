//! Template chain traversal.
//!
//! Import chains can be arbitrarily long and may form diamonds (two imports
//! sharing a grandparent), so the walk uses an explicit stack instead of
//! recursion. Chains are expected to be acyclic; a cycle is reported as
//! [`Error::CyclicInheritance`] instead of looping.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{Error, Result};
use crate::model::ConfigObject;
use crate::repository::TemplateRepository;

struct Frame {
    id: i64,
    object: Option<ConfigObject>,
    pending: std::vec::IntoIter<ConfigObject>,
}

/// Every ancestor template of `object`, in resolution order.
///
/// An ancestor always comes after all of its own ancestors, and imports
/// listed later come after imports listed earlier, so folding the list from
/// left to right lets later entries override earlier ones. Each ancestor is
/// listed once even when reachable along several paths.
///
/// # Errors
///
/// `CyclicInheritance` when a template (directly or indirectly) imports
/// itself; repository errors are propagated.
pub fn ancestors<R>(repo: &R, object: &ConfigObject) -> Result<Vec<ConfigObject>>
where
    R: TemplateRepository + ?Sized,
{
    let Some(root_id) = object.id() else {
        return Ok(Vec::new());
    };

    let mut on_path = HashSet::from([root_id]);
    let mut finished = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![Frame {
        id: root_id,
        object: None,
        pending: repo.parents(object)?.into_iter(),
    }];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.next(),
            None => break,
        };

        match next {
            Some(parent) => {
                let Some(parent_id) = parent.id() else {
                    continue;
                };
                if on_path.contains(&parent_id) {
                    return Err(Error::CyclicInheritance {
                        kind: parent.kind(),
                        name: parent.name(),
                    });
                }
                if finished.contains(&parent_id) {
                    continue;
                }
                trace!(kind = %parent.kind(), parent = %parent.name(), "descending into template");
                let grandparents = repo.parents(&parent)?;
                on_path.insert(parent_id);
                stack.push(Frame {
                    id: parent_id,
                    object: Some(parent),
                    pending: grandparents.into_iter(),
                });
            }
            None => {
                if let Some(frame) = stack.pop() {
                    on_path.remove(&frame.id);
                    finished.insert(frame.id);
                    if let Some(template) = frame.object {
                        order.push(template);
                    }
                }
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectType, Properties};
    use serde_json::json;
    use std::collections::HashMap;

    /// Import graph keyed by object id.
    struct Graph {
        objects: HashMap<i64, ConfigObject>,
        imports: HashMap<i64, Vec<i64>>,
    }

    impl Graph {
        fn new(edges: &[(i64, &[i64])]) -> Self {
            let mut objects = HashMap::new();
            let mut imports = HashMap::new();
            for (id, parents) in edges {
                for node in std::iter::once(id).chain(parents.iter()) {
                    objects.entry(*node).or_insert_with(|| host(*node));
                }
                imports.insert(*id, parents.to_vec());
            }
            Self { objects, imports }
        }

        fn get(&self, id: i64) -> ConfigObject {
            self.objects[&id].clone()
        }
    }

    impl TemplateRepository for Graph {
        fn parents(&self, object: &ConfigObject) -> Result<Vec<ConfigObject>> {
            let Some(id) = object.id() else {
                return Ok(Vec::new());
            };
            Ok(self
                .imports
                .get(&id)
                .map(|ids| ids.iter().map(|p| self.get(*p)).collect())
                .unwrap_or_default())
        }
    }

    fn host(id: i64) -> ConfigObject {
        let mut props = Properties::new();
        props.insert("id".into(), json!(id));
        props.insert("object_name".into(), json!(format!("t{id}")));
        props.insert("object_type".into(), json!("template"));
        ConfigObject::new(ObjectType::Host, props)
    }

    fn names(list: &[ConfigObject]) -> Vec<String> {
        list.iter().map(ConfigObject::name).collect()
    }

    #[test]
    fn test_linear_chain_deepest_first() {
        let graph = Graph::new(&[(1, &[2]), (2, &[3]), (3, &[])]);
        let chain = ancestors(&graph, &graph.get(1)).unwrap();
        assert_eq!(names(&chain), vec!["t3", "t2"]);
    }

    #[test]
    fn test_import_order_preserved() {
        let graph = Graph::new(&[(1, &[2, 3]), (2, &[]), (3, &[])]);
        let chain = ancestors(&graph, &graph.get(1)).unwrap();
        assert_eq!(names(&chain), vec!["t2", "t3"]);
    }

    #[test]
    fn test_diamond_listed_once() {
        let graph = Graph::new(&[(1, &[2, 3]), (2, &[4]), (3, &[4]), (4, &[])]);
        let chain = ancestors(&graph, &graph.get(1)).unwrap();
        assert_eq!(names(&chain), vec!["t4", "t2", "t3"]);
    }

    #[test]
    fn test_cycle_detected() {
        let graph = Graph::new(&[(1, &[2]), (2, &[3]), (3, &[2])]);
        let err = ancestors(&graph, &graph.get(1)).unwrap_err();
        assert!(matches!(err, Error::CyclicInheritance { ref name, .. } if name == "t2"));
    }

    #[test]
    fn test_self_import_detected() {
        let graph = Graph::new(&[(1, &[1])]);
        assert!(matches!(
            ancestors(&graph, &graph.get(1)),
            Err(Error::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let edges: Vec<(i64, Vec<i64>)> = (1..=5_000).map(|id| (id, vec![id + 1])).collect();
        let borrowed: Vec<(i64, &[i64])> =
            edges.iter().map(|(id, p)| (*id, p.as_slice())).collect();
        let graph = Graph::new(&borrowed);
        let chain = ancestors(&graph, &graph.get(1)).unwrap();
        assert_eq!(chain.len(), 5_000);
        assert_eq!(chain[0].name(), "t5001");
    }

    #[test]
    fn test_unstored_object_has_no_ancestors() {
        let graph = Graph::new(&[]);
        let detached = ConfigObject::detached(ObjectType::Host, Properties::new());
        assert!(ancestors(&graph, &detached).unwrap().is_empty());
    }
}
