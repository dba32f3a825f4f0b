use std::sync::Arc;

use super::{descriptor, SilentPlugin};
use crate::plugin_system::dependency::resolve_order;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::{LoadedPlugins, PluginRegistry};
use crate::plugin_system::traits::Plugin;
use crate::storage::config::ConfigData;

fn registry_with(entries: &[(&str, &[&str])]) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    for (name, deps) in entries {
        registry
            .register(descriptor(name, deps), Arc::new(SilentPlugin), None)
            .unwrap();
    }
    registry
}

#[test]
fn test_register_and_lookup() {
    let mut registry = PluginRegistry::new();
    let config = ConfigData::new().with("level", serde_json::json!("debug"));
    registry
        .register(descriptor("log", &[]), Arc::new(SilentPlugin), Some(config.clone()))
        .unwrap();

    assert!(registry.is_registered("log"));
    assert!(!registry.is_registered("db"));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.descriptor("log").unwrap().version, "1.0.0");
    assert_eq!(registry.config("log"), Some(&config));
    assert!(registry.get("log").is_some());
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut registry = registry_with(&[("log", &[])]);
    let err = registry
        .register(descriptor("log", &["other"]), Arc::new(SilentPlugin), None)
        .unwrap_err();

    assert!(matches!(
        err.as_plugin_system(),
        Some(PluginSystemError::DuplicateRegistration { name }) if name == "log"
    ));
    assert_eq!(registry.len(), 1);
    assert!(registry.descriptor("log").unwrap().dependencies.is_empty());
}

#[test]
fn test_list_keeps_registration_order() {
    let registry = registry_with(&[("c", &[]), ("a", &[]), ("b", &[])]);
    let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
    assert_eq!(registry.names(), names);
}

#[test]
fn test_dependency_subgraph_is_transitive_closure() {
    let registry = registry_with(&[
        ("a", &[]),
        ("b", &["a"]),
        ("c", &["b"]),
        ("unrelated", &[]),
    ]);
    let sub = registry.dependency_subgraph("c");

    let mut nodes: Vec<&str> = sub.nodes().collect();
    nodes.sort();
    assert_eq!(nodes, vec!["a", "b", "c"]);
    assert_eq!(resolve_order(&sub, None).unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_dependency_subgraph_reports_unregistered_dependency() {
    let registry = registry_with(&[("app", &["db"])]);
    let sub = registry.dependency_subgraph("app");
    assert_eq!(sub.len(), 1);
    assert!(resolve_order(&sub, None).is_err());
}

#[test]
fn test_dependency_graph_of_drops_outside_edges() {
    let registry = registry_with(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
    let graph = registry.dependency_graph_of(&["b".to_string(), "c".to_string()]);

    assert_eq!(graph.len(), 2);
    assert!(graph.dependencies("b").unwrap().is_empty());
    assert_eq!(graph.dependencies("c").unwrap(), &["b".to_string()]);
}

#[test]
fn test_dependents_of() {
    let registry = registry_with(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
    assert_eq!(registry.dependents_of("a"), vec!["b", "c"]);
    assert_eq!(registry.dependents_of("b"), vec!["c"]);
    assert!(registry.dependents_of("c").is_empty());
}

#[test]
fn test_loaded_plugins_tracks_load_order() {
    let mut loaded = LoadedPlugins::new();
    let plugin: Arc<dyn Plugin> = Arc::new(SilentPlugin);

    loaded.insert("b", plugin.clone());
    loaded.insert("a", plugin.clone());
    loaded.insert("b", plugin.clone());
    assert_eq!(loaded.names(), vec!["b", "a"]);

    assert!(loaded.remove("b").is_some());
    assert!(loaded.remove("b").is_none());
    assert_eq!(loaded.names(), vec!["a"]);
    assert!(loaded.contains("a"));
    assert_eq!(loaded.len(), 1);
}
