//! Dependency graph over registered modules.
//!
//! Built from explicit declarations at registration time and stored both
//! ways: forward (module → dependencies) for enable checks, reverse
//! (module → dependents) for cascades. Self-references are excluded and a
//! registration that would close a cycle is rejected up front, since the
//! cascade logic assumes an acyclic graph.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    forward: HashMap<String, Vec<String>>,
    reverse: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Record a module and its declared dependencies.
    ///
    /// Callers must run [`DependencyGraph::would_close_cycle`] first.
    pub fn insert(&mut self, name: &str, dependencies: &[String]) {
        self.forward
            .insert(name.to_string(), dependencies.to_vec());
        for dep in dependencies {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .push(name.to_string());
        }
    }

    /// Modules that directly depend on `name`.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.reverse.get(name).cloned().unwrap_or_default()
    }

    /// Check whether adding `name` with `dependencies` would close a cycle.
    ///
    /// Walks forward edges from each declared dependency; reaching `name`
    /// means the new edges complete a loop. Returns the dependency through
    /// which the cycle closes. Dependencies on not-yet-registered names
    /// dead-end and are fine here; the enable path handles them.
    pub fn would_close_cycle(&self, name: &str, dependencies: &[String]) -> Option<String> {
        for dep in dependencies {
            let mut stack = vec![dep.as_str()];
            let mut seen = vec![];
            while let Some(current) = stack.pop() {
                if current == name {
                    return Some(dep.clone());
                }
                if seen.contains(&current) {
                    continue;
                }
                seen.push(current);
                if let Some(next) = self.forward.get(current) {
                    stack.extend(next.iter().map(String::as_str));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_forward_and_reverse_maps() {
        let mut graph = DependencyGraph::default();
        graph.insert("logging", &[]);
        graph.insert("status", &deps(&["logging"]));
        graph.insert("alerts", &deps(&["logging", "status"]));

        let mut dependents = graph.dependents("logging");
        dependents.sort();
        assert_eq!(dependents, vec!["alerts", "status"]);
        assert!(graph.dependents("alerts").is_empty());
    }

    #[test]
    fn test_direct_cycle_rejected() {
        let mut graph = DependencyGraph::default();
        graph.insert("a", &deps(&["b"]));
        assert_eq!(graph.would_close_cycle("b", &deps(&["a"])), Some("a".into()));
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let mut graph = DependencyGraph::default();
        graph.insert("a", &deps(&["b"]));
        graph.insert("b", &deps(&["c"]));
        assert_eq!(graph.would_close_cycle("c", &deps(&["a"])), Some("a".into()));
    }

    #[test]
    fn test_unregistered_dependency_is_not_a_cycle() {
        let graph = DependencyGraph::default();
        assert_eq!(graph.would_close_cycle("a", &deps(&["ghost"])), None);
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let mut graph = DependencyGraph::default();
        graph.insert("base", &[]);
        graph.insert("left", &deps(&["base"]));
        graph.insert("right", &deps(&["base"]));
        assert_eq!(
            graph.would_close_cycle("top", &deps(&["left", "right"])),
            None
        );
    }
}
