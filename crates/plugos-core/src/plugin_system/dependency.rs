use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use thiserror::Error;

/// Error that can occur when resolving dependencies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// A plugin declares a dependency that is not part of the graph
    #[error("Plugin '{plugin}' depends on missing plugin '{dependency}'")]
    MissingDependency { plugin: String, dependency: String },

    /// Dependency cycle detected, path runs from the cycle start to the repeated node
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// Mapping from a plugin name to the names it declares as prerequisites.
///
/// Node order is insertion order, so resolution over the same graph is
/// deterministic. Duplicate dependencies are collapsed on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    order: Vec<String>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its direct dependencies, replacing any previous entry.
    pub fn add_node<I, S>(&mut self, name: &str, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let deps: Vec<String> = dependencies
            .into_iter()
            .map(Into::into)
            .filter(|dep| seen.insert(dep.clone()))
            .collect();

        if self.edges.insert(name.to_string(), deps).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Whether `name` is a node of this graph
    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Direct dependencies of `name`
    pub fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.edges.get(name).map(Vec::as_slice)
    }

    /// Node names in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<S>)> for DependencyGraph {
    fn from_iter<T: IntoIterator<Item = (S, Vec<S>)>>(iter: T) -> Self {
        let mut graph = DependencyGraph::new();
        for (name, deps) in iter {
            let name: String = name.into();
            graph.add_node(&name, deps);
        }
        graph
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .nodes()
            .map(|name| format!("{} -> [{}]", name, self.edges[name].join(", ")))
            .collect();
        write!(f, "{{{}}}", entries.join("; "))
    }
}

/// Computes a dependency-first ordering of every node in `graph`.
///
/// Every name in the result appears after all of its direct and transitive
/// dependencies. If `preferred_start` has no dependencies it is emitted first;
/// otherwise it has no effect. Resolution either returns the complete order or
/// fails; a partial order is never returned.
pub fn resolve_order(
    graph: &DependencyGraph,
    preferred_start: Option<&str>,
) -> Result<Vec<String>, DependencyError> {
    check_references(graph)?;
    detect_cycles(graph)?;

    // Here in-degree counts unresolved prerequisites of a node.
    let mut in_degree: HashMap<&str, usize> = graph
        .nodes()
        .map(|name| (name, graph.edges[name].len()))
        .collect();

    let mut queue: VecDeque<&str> = graph
        .nodes()
        .filter(|name| in_degree[name] == 0)
        .collect();

    if let Some(start) = preferred_start {
        if let Some(pos) = queue.iter().position(|name| *name == start) {
            if let Some(name) = queue.remove(pos) {
                queue.push_front(name);
            }
        }
    }

    let mut sorted = Vec::with_capacity(graph.len());
    while let Some(current) = queue.pop_front() {
        sorted.push(current.to_string());

        for candidate in graph.nodes() {
            if candidate == current || !graph.edges[candidate].iter().any(|dep| dep == current) {
                continue;
            }
            if let Some(degree) = in_degree.get_mut(candidate) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(candidate);
                }
            }
        }
    }

    // Unreachable after detect_cycles; kept as a post-condition.
    if sorted.len() != graph.len() {
        let unresolved: Vec<String> = graph
            .nodes()
            .filter(|name| !sorted.iter().any(|done| done == name))
            .map(str::to_string)
            .collect();
        log::error!("Topological sort left unresolved plugins: {:?}", unresolved);
        return Err(DependencyError::CircularDependency(unresolved));
    }

    Ok(sorted)
}

fn check_references(graph: &DependencyGraph) -> Result<(), DependencyError> {
    for name in graph.nodes() {
        for dep in &graph.edges[name] {
            if !graph.contains(dep) {
                return Err(DependencyError::MissingDependency {
                    plugin: name.to_string(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn detect_cycles(graph: &DependencyGraph) -> Result<(), DependencyError> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    for name in graph.nodes() {
        if !visited.contains(name) {
            visit(graph, name, &mut visited, &mut stack)?;
        }
    }
    Ok(())
}

fn visit<'g>(
    graph: &'g DependencyGraph,
    name: &'g str,
    visited: &mut HashSet<&'g str>,
    stack: &mut Vec<&'g str>,
) -> Result<(), DependencyError> {
    if let Some(start) = stack.iter().position(|on_stack| *on_stack == name) {
        let mut path: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
        path.push(name.to_string());
        return Err(DependencyError::CircularDependency(path));
    }
    if visited.contains(name) {
        return Ok(());
    }

    stack.push(name);
    for dep in &graph.edges[name] {
        visit(graph, dep, visited, stack)?;
    }
    stack.pop();
    visited.insert(name);
    Ok(())
}
