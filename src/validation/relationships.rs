//! Relationship validation functionality
//!
//! Detects cycles among cascading foreign keys. Databases reject a cascade
//! that can loop back to its starting table, so such cycles are reported per
//! cascade kind.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};

use crate::models::{ForeignKey, TableRepository};

/// Which cascade a cycle is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeKind {
    Delete,
    Update,
}

impl CascadeKind {
    fn applies(&self, foreign_key: &ForeignKey) -> bool {
        match self {
            Self::Delete => foreign_key.with_delete_cascade,
            Self::Update => foreign_key.with_update_cascade,
        }
    }
}

/// Tables forming a cascading cycle, as `schema.table` names
#[derive(Debug, Clone)]
pub struct CascadeCycle {
    pub kind: CascadeKind,
    pub tables: Vec<String>,
}

/// Result of relationship validation
#[derive(Debug, Default)]
pub struct RelationshipValidationResult {
    pub cascade_cycles: Vec<CascadeCycle>,
}

impl RelationshipValidationResult {
    pub fn is_valid(&self) -> bool {
        self.cascade_cycles.is_empty()
    }
}

/// Relationship validator
#[derive(Debug, Default)]
pub struct RelationshipValidator;

impl RelationshipValidator {
    /// Create a new relationship validator
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, repository: &TableRepository) -> RelationshipValidationResult {
        let mut cascade_cycles = self.find_cascade_cycles(repository, CascadeKind::Delete);
        cascade_cycles.extend(self.find_cascade_cycles(repository, CascadeKind::Update));
        RelationshipValidationResult { cascade_cycles }
    }

    /// Strongly connected groups of tables linked by one kind of cascade
    pub fn find_cascade_cycles(&self, repository: &TableRepository, kind: CascadeKind) -> Vec<CascadeCycle> {
        let mut graph = Graph::<String, (), Directed>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut Graph<String, (), Directed>, name: String| {
            *node_map
                .entry(name.clone())
                .or_insert_with(|| graph.add_node(name))
        };

        for table in repository.all_tables() {
            let from = node(&mut graph, format!("{}.{}", table.schema, table.table_id));
            for foreign_key in table.foreign_keys.iter().filter(|fk| kind.applies(fk)) {
                let to = node(
                    &mut graph,
                    format!("{}.{}", foreign_key.foreign_table_schema, foreign_key.foreign_table_id),
                );
                // Edges point from the referenced table to the one the cascade reaches
                graph.add_edge(to, from, ());
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut tables: Vec<String> = component.iter().map(|&n| graph[n].clone()).collect();
                tables.sort();
                CascadeCycle { kind, tables }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnPair, ForeignKeyReason, Table, TableExistenceReason};

    fn foreign_key(from: &str, to: &str) -> ForeignKey {
        ForeignKey::new(from, "EdFi", to, vec![ColumnPair::same("Id")], ForeignKeyReason::Reference)
    }

    #[test]
    fn test_no_cycles_in_parent_chain() {
        let mut repo = TableRepository::new();
        repo.insert(Table::new("EdFi", "Student", TableExistenceReason::Main)).unwrap();
        let mut address = Table::new("EdFi", "StudentAddress", TableExistenceReason::Common);
        address.add_foreign_key(foreign_key("StudentAddress", "Student").with_delete_cascade(true));
        repo.insert(address).unwrap();

        assert!(RelationshipValidator::new().validate(&repo).is_valid());
    }

    #[test]
    fn test_update_cascade_cycle_reported() {
        let mut repo = TableRepository::new();
        let mut a = Table::new("EdFi", "A", TableExistenceReason::Main);
        a.add_foreign_key(foreign_key("A", "B").with_update_cascade(true));
        let mut b = Table::new("EdFi", "B", TableExistenceReason::Main);
        b.add_foreign_key(foreign_key("B", "A").with_update_cascade(true));
        repo.insert(a).unwrap();
        repo.insert(b).unwrap();

        let result = RelationshipValidator::new().validate(&repo);
        assert_eq!(result.cascade_cycles.len(), 1);
        assert_eq!(result.cascade_cycles[0].kind, CascadeKind::Update);
        assert_eq!(result.cascade_cycles[0].tables, vec!["edfi.A", "edfi.B"]);
    }

    #[test]
    fn test_self_referencing_delete_cascade() {
        let mut repo = TableRepository::new();
        let mut course = Table::new("EdFi", "Course", TableExistenceReason::Main);
        course.add_foreign_key(foreign_key("Course", "Course").with_delete_cascade(true));
        repo.insert(course).unwrap();

        let cycles = RelationshipValidator::new().find_cascade_cycles(&repo, CascadeKind::Delete);
        assert_eq!(cycles.len(), 1);
        assert!(RelationshipValidator::new()
            .find_cascade_cycles(&repo, CascadeKind::Update)
            .is_empty());
    }
}
