//! Import dependency graph
//!
//! Built up while a top-level load is in progress and used to report the
//! edge path of a circular import.

use la_arena::{Arena, Idx};
use pr_model::PackageNameQualified;
use pr_span::Position;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt;

/// One import edge: package `from` imports package `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageImport {
    /// The importing package
    pub from: PackageNameQualified,
    /// The imported package
    pub to: PackageNameQualified,
    /// Where `from` imports `to`
    pub position: Option<Position>,
}

impl fmt::Display for PackageImport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} -> {}", self.from, self.to)
    }
}

type NodeId = Idx<PackageNameQualified>;

/// Directed graph over package names, edges in insertion order
#[derive(Debug, Default, Clone)]
pub struct ImportGraph {
    nodes: Arena<PackageNameQualified>,
    index: FxHashMap<PackageNameQualified, NodeId>,
    edges: FxHashMap<NodeId, Vec<(NodeId, Option<Position>)>>,
}

impl ImportGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &PackageNameQualified) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.nodes.alloc(name.clone());
        self.index.insert(name.clone(), id);
        id
    }

    /// Records an import; repeating an edge keeps the first position
    pub fn add_import(&mut self, import: &PackageImport) {
        let from = self.node(&import.from);
        let to = self.node(&import.to);
        let targets = self.edges.entry(from).or_default();
        if !targets.iter().any(|(target, _)| *target == to) {
            targets.push((to, import.position));
        }
    }

    /// Shortest edge path from `from` to `to`, found breadth first
    ///
    /// Returns `None` if `to` is unreachable, and an empty path if the two
    /// are the same package.
    pub fn shortest_path(
        &self,
        from: &PackageNameQualified,
        to: &PackageNameQualified,
    ) -> Option<Vec<PackageImport>> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;

        let mut previous: FxHashMap<NodeId, (NodeId, Option<Position>)> = FxHashMap::default();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if current == goal {
                break;
            }
            for &(next, position) in self.edges.get(&current).into_iter().flatten() {
                if next != start && !previous.contains_key(&next) {
                    previous.insert(next, (current, position));
                    queue.push_back(next);
                }
            }
        }

        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            let &(parent, position) = previous.get(&current)?;
            path.push(PackageImport {
                from: self.nodes[parent].clone(),
                to: self.nodes[current].clone(),
                position,
            });
            current = parent;
        }
        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(from: &str, to: &str) -> PackageImport {
        PackageImport {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
            position: None,
        }
    }

    fn render(path: &[PackageImport]) -> Vec<String> {
        path.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_shortest_path_prefers_fewer_edges() {
        let mut graph = ImportGraph::new();
        graph.add_import(&import("a", "b"));
        graph.add_import(&import("b", "c"));
        graph.add_import(&import("c", "d"));
        graph.add_import(&import("a", "d"));

        let path = graph
            .shortest_path(&"a".parse().unwrap(), &"d".parse().unwrap())
            .unwrap();
        assert_eq!(render(&path), ["a -> d"]);

        let path = graph
            .shortest_path(&"b".parse().unwrap(), &"d".parse().unwrap())
            .unwrap();
        assert_eq!(render(&path), ["b -> c", "c -> d"]);
    }

    #[test]
    fn test_unreachable_and_trivial_paths() {
        let mut graph = ImportGraph::new();
        graph.add_import(&import("x.a", "x.b"));
        assert!(
            graph
                .shortest_path(&"x.b".parse().unwrap(), &"x.a".parse().unwrap())
                .is_none()
        );
        assert!(
            graph
                .shortest_path(&"x.a".parse().unwrap(), &"x.a".parse().unwrap())
                .unwrap()
                .is_empty()
        );
        assert!(
            graph
                .shortest_path(&"x.a".parse().unwrap(), &"x.z".parse().unwrap())
                .is_none()
        );
    }

    #[test]
    fn test_duplicate_edges_are_merged() {
        let mut graph = ImportGraph::new();
        graph.add_import(&import("a", "b"));
        graph.add_import(&import("a", "b"));
        let path = graph
            .shortest_path(&"a".parse().unwrap(), &"b".parse().unwrap())
            .unwrap();
        assert_eq!(path.len(), 1);
    }
}
