//! Primary key update cascading
//!
//! An entity cascades key updates when it allows them itself, or when its
//! identity reaches, through identity references and subclassing, an entity
//! that does. Reachability is computed over a directed graph of entities.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::{Directed, Direction, Graph};
use tracing::debug;

use super::BuildState;
use crate::error::BuildResult;
use crate::metamodel::{Entity, EntityId, MetaEdEnvironment, PropertyKind};

/// Directed graph of identity dependencies between entities
///
/// An edge `a -> b` means `a`'s primary key contains `b`'s.
#[derive(Debug, Clone)]
pub struct IdentityGraph {
    graph: Graph<EntityId, (), Directed>,
    node_map: HashMap<EntityId, NodeIndex>,
}

impl IdentityGraph {
    pub fn from_environment(env: &MetaEdEnvironment) -> BuildResult<Self> {
        let mut graph = Graph::<EntityId, (), Directed>::new();
        let mut node_map = HashMap::new();
        for entity in env.entities() {
            node_map.insert(entity.id, graph.add_node(entity.id));
        }

        for entity in env.entities() {
            let from = node_map[&entity.id];
            let mut targets = Vec::new();
            if entity.kind.is_subclass() {
                targets.push(env.base_entity(entity)?.id);
            }
            identity_references(env, entity, &mut targets)?;
            for target in targets {
                if let Some(&to) = node_map.get(&target) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Ok(Self { graph, node_map })
    }

    /// Whether `from`'s identity depends on `to`, directly or transitively
    ///
    /// An entity always reaches itself.
    pub fn can_reach(&self, from: EntityId, to: EntityId) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_map.get(&from), self.node_map.get(&to)) else {
            return false;
        };
        let mut visited = HashSet::new();
        let mut stack = vec![from_idx];
        while let Some(node) = stack.pop() {
            if node == to_idx {
                return true;
            }
            if visited.insert(node) {
                stack.extend(self.graph.neighbors(node).filter(|n| !visited.contains(n)));
            }
        }
        false
    }

    /// Entities that allow key updates plus every entity whose identity reaches one
    pub fn cascading_entities(&self, env: &MetaEdEnvironment) -> HashSet<EntityId> {
        let mut cascading = HashSet::new();
        let mut stack: Vec<NodeIndex> = env
            .entities()
            .iter()
            .filter(|e| e.allow_primary_key_updates)
            .filter_map(|e| self.node_map.get(&e.id).copied())
            .collect();

        while let Some(node) = stack.pop() {
            if cascading.insert(self.graph[node]) {
                stack.extend(self.graph.neighbors_directed(node, Direction::Incoming));
            }
        }
        cascading
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Entities referenced by identity, looking through identity inline commons
fn identity_references(env: &MetaEdEnvironment, entity: &Entity, out: &mut Vec<EntityId>) -> BuildResult<()> {
    for property in entity.properties.iter().filter(|p| p.is_part_of_identity) {
        match property.kind {
            PropertyKind::Association | PropertyKind::DomainEntity => {
                out.push(env.referenced_entity(entity, property)?.id);
            }
            PropertyKind::InlineCommon => {
                let inline = env.referenced_entity(entity, property)?;
                identity_references(env, inline, out)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Compute the cascading entity set for the foreign key pass
pub fn run(state: &mut BuildState<'_>) -> BuildResult<()> {
    let graph = IdentityGraph::from_environment(state.env)?;
    state.update_cascading = graph.cascading_entities(state.env);
    debug!(
        identity_edges = graph.edge_count(),
        cascading = state.update_cascading.len(),
        "Update cascade computed"
    );
    state.identity_graph = Some(graph);
    Ok(())
}
