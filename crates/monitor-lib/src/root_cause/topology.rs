//! Causal dependency graph between components
//!
//! The four core components have fixed edges. Disk components are only known
//! at query time, so their edges are synthesized from the current disk list:
//! every disk depends on Memory and CPU, and Processes depends on every disk.
//! No rule makes a core component depend on itself or on Processes, so the
//! graph stays acyclic for any disk list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{is_disk_key, CPU, MEMORY, NETWORK, PROCESSES};

/// Static edges in declaration order
const CORE_DEPENDENCIES: [(&str, &[&str]); 4] = [
    (CPU, &[]),
    (MEMORY, &[CPU]),
    (NETWORK, &[CPU, MEMORY]),
    (PROCESSES, &[CPU, MEMORY]),
];

/// Dependencies every disk picks up
const DISK_DEPENDENCIES: [&str; 2] = [MEMORY, CPU];

/// A directed `component -> depends_on` edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub component: String,
    pub depends_on: String,
}

/// Dependency graph over the core components and a snapshot of disk keys
#[derive(Debug, Clone, Default)]
pub struct DependencyTopology {
    disks: Vec<String>,
}

impl DependencyTopology {
    /// Build the graph for the given disk component keys.
    ///
    /// Keys that are not disk keys are ignored; duplicates keep their first
    /// position.
    pub fn new<I, S>(disk_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let disks = disk_keys
            .into_iter()
            .map(Into::into)
            .filter(|k| is_disk_key(k) && seen.insert(k.clone()))
            .collect();
        Self { disks }
    }

    /// Disk keys known to this topology
    pub fn disks(&self) -> &[String] {
        &self.disks
    }

    /// Every component key in the graph: core components then disks
    pub fn components(&self) -> Vec<String> {
        CORE_DEPENDENCIES
            .iter()
            .map(|(key, _)| key.to_string())
            .chain(self.disks.iter().cloned())
            .collect()
    }

    /// Direct dependencies of `component`, static edges first
    pub fn dependencies_of(&self, component: &str) -> Vec<&str> {
        let mut deps: Vec<&str> = CORE_DEPENDENCIES
            .iter()
            .find(|(key, _)| *key == component)
            .map(|(_, deps)| deps.to_vec())
            .unwrap_or_default();

        if is_disk_key(component) {
            deps.extend(DISK_DEPENDENCIES);
        }

        if component == PROCESSES {
            deps.extend(self.disks.iter().map(String::as_str));
        }

        deps
    }

    /// Transitive dependencies of `affected`, depth first.
    ///
    /// Only components accepted by `observed` are visited. Each component
    /// appears once, in first-visit order.
    pub fn dependency_chain<F>(&self, affected: &str, observed: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut chain = Vec::new();
        self.walk(affected, &observed, &mut chain);
        chain
    }

    fn walk<F>(&self, component: &str, observed: &F, chain: &mut Vec<String>)
    where
        F: Fn(&str) -> bool,
    {
        for dep in self.dependencies_of(component) {
            if observed(dep) && !chain.iter().any(|c| c == dep) {
                chain.push(dep.to_string());
                self.walk(dep, observed, chain);
            }
        }
    }

    /// All edges of the graph, grouped by component
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.components()
            .iter()
            .flat_map(|component| {
                self.dependencies_of(component)
                    .into_iter()
                    .map(|dep| DependencyEdge {
                        component: component.clone(),
                        depends_on: dep.to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
