//! Build strategy: an immutable chain of policy overrides
//!
//! Each recursive descent step may add one override relative to whatever its
//! caller's strategy already says. Layers are shared, never mutated:
//! - parent context: a property whose context prefix is prepended to nested names
//! - ignore role name: leaf columns drop their own role name segment
//! - leaf columns nullable: every produced column is forced nullable
//! - suppress primary key: properties stop contributing key columns
//! - skip path: properties on a merge directive path produce no columns
//!
//! Every parent-context descent re-roots the nearest skip path layer at the
//! segments following the descended property, dropping it when the property
//! is on none of its paths. Pushing another skip path or an ignore-role-name
//! layer directly on top of a skip path discards it.

use std::rc::Rc;

use super::naming::ColumnNaming;
use super::transform::ColumnTransform;
use crate::metamodel::EntityProperty;
use crate::models::ColumnNameComponent;

/// Property captured by a parent-context layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContext {
    pub context_prefix: String,
    pub full_property_name: String,
}

impl ParentContext {
    pub fn of(property: &EntityProperty) -> Self {
        Self {
            context_prefix: property.context_prefix().to_string(),
            full_property_name: property.full_property_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Layer {
    ParentContext(ParentContext),
    IgnoreRoleName,
    LeafColumnsNullable,
    SuppressPrimaryKey,
    SkipPath(Vec<Vec<String>>),
}

#[derive(Debug)]
struct Node {
    layer: Layer,
    next: Option<Rc<Node>>,
}

/// Persistent strategy chain; cloning is cheap
#[derive(Debug, Clone, Default)]
pub struct BuildStrategy {
    head: Option<Rc<Node>>,
}

impl BuildStrategy {
    /// The root strategy with every policy at its default
    pub fn new() -> Self {
        Self::default()
    }

    fn layers(&self) -> impl Iterator<Item = &Layer> {
        std::iter::successors(self.head.as_deref(), |&node| node.next.as_deref())
            .map(|node| &node.layer)
    }

    fn push(&self, layer: Layer) -> Self {
        Self {
            head: Some(Rc::new(Node {
                layer,
                next: self.head.clone(),
            })),
        }
    }

    fn from_layers_root_first(layers: Vec<Layer>) -> Self {
        layers
            .into_iter()
            .fold(Self::default(), |strategy, layer| strategy.push(layer))
    }

    /// Concatenated context prefixes, root first
    pub fn parent_context(&self) -> String {
        self.parent_context_properties()
            .iter()
            .map(|p| p.context_prefix.as_str())
            .collect()
    }

    /// Parent-context properties, root first
    pub fn parent_context_properties(&self) -> Vec<ParentContext> {
        let mut properties: Vec<ParentContext> = self
            .layers()
            .filter_map(|layer| match layer {
                Layer::ParentContext(p) => Some(p.clone()),
                _ => None,
            })
            .collect();
        properties.reverse();
        properties
    }

    /// Wrap a transform so leaf columns come out nullable under a nullable layer
    pub fn leaf_columns(&self, transform: ColumnTransform) -> ColumnTransform {
        if self.layers().any(|l| matches!(l, Layer::LeafColumnsNullable)) {
            ColumnTransform::make_null(transform)
        } else {
            transform
        }
    }

    /// Name a column from the active parent context plus role and base names
    ///
    /// Parent context prefixes contribute name components only when non-empty.
    /// Under an ignore-role-name layer the role segment is dropped entirely.
    pub fn column_namer(&self, role_name: &str, base_name: &str) -> ColumnNaming {
        let ignore_role_name = self.layers().any(|l| matches!(l, Layer::IgnoreRoleName));
        let mut name_components: Vec<ColumnNameComponent> = self
            .parent_context_properties()
            .into_iter()
            .filter(|p| !p.context_prefix.is_empty())
            .map(|p| ColumnNameComponent::parent_context(p.context_prefix))
            .collect();

        let role_name = if ignore_role_name { "" } else { role_name };
        if !role_name.is_empty() {
            name_components.push(ColumnNameComponent::role_name(role_name));
        }
        if !base_name.is_empty() {
            name_components.push(ColumnNameComponent::base(base_name));
        }

        ColumnNaming {
            column_id: format!("{}{}{}", self.parent_context(), role_name, base_name),
            name_components,
        }
    }

    /// Whether the property produces columns under the nearest skip path layer
    pub fn build_columns(&self, property: &EntityProperty) -> bool {
        let Some(paths) = self.layers().find_map(|layer| match layer {
            Layer::SkipPath(paths) => Some(paths),
            _ => None,
        }) else {
            return true;
        };

        let name = property.full_property_name();
        let mut on_path = paths.iter().filter(|p| p.first() == Some(&name)).peekable();
        if on_path.peek().is_none() {
            return true;
        }
        on_path.any(|p| p.len() > 1)
    }

    pub fn suppress_primary_key_creation(&self) -> bool {
        self.layers()
            .any(|l| matches!(l, Layer::SuppressPrimaryKey))
    }

    /// Drop a skip path layer sitting directly on top of the chain
    fn without_leading_skip_path(&self) -> Self {
        match self.head.as_deref() {
            Some(Node {
                layer: Layer::SkipPath(_),
                next,
            }) => Self { head: next.clone() },
            _ => self.clone(),
        }
    }

    /// Re-root the nearest skip path layer at the segments after `property`
    fn reroot_skip_path(&self, property: &EntityProperty) -> Self {
        let mut above = Vec::new();
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            if let Layer::SkipPath(paths) = &node.layer {
                let name = property.full_property_name();
                let remaining: Vec<Vec<String>> = paths
                    .iter()
                    .filter(|p| p.first() == Some(&name))
                    .map(|p| p[1..].to_vec())
                    .collect();

                let mut rebuilt = Self {
                    head: node.next.clone(),
                };
                if !remaining.is_empty() {
                    rebuilt = rebuilt.push(Layer::SkipPath(remaining));
                }
                return above
                    .into_iter()
                    .rev()
                    .fold(rebuilt, |strategy, layer| strategy.push(layer));
            }
            above.push(node.layer.clone());
            cursor = node.next.as_ref();
        }
        self.clone()
    }

    pub fn append_parent_context_property(&self, property: &EntityProperty) -> Self {
        self.reroot_skip_path(property)
            .push(Layer::ParentContext(ParentContext::of(property)))
    }

    pub fn column_namer_ignores_role_name(&self) -> Self {
        self.without_leading_skip_path().push(Layer::IgnoreRoleName)
    }

    /// Skip properties lying on the given merge directive paths
    pub fn skip_path(&self, eligible_property_paths: Vec<Vec<String>>) -> Self {
        self.without_leading_skip_path()
            .push(Layer::SkipPath(eligible_property_paths))
    }

    pub fn make_leaf_columns_nullable(&self) -> Self {
        self.push(Layer::LeafColumnsNullable)
    }

    pub fn suppress_primary_key_creation_from_properties(&self) -> Self {
        self.push(Layer::SuppressPrimaryKey)
    }

    fn without(&self, remove: impl Fn(&Layer) -> bool) -> Self {
        if !self.layers().any(&remove) {
            return self.clone();
        }
        let mut kept: Vec<Layer> = self.layers().filter(|l| !remove(*l)).cloned().collect();
        kept.reverse();
        Self::from_layers_root_first(kept)
    }

    /// Splice every leaf-nullable layer out of the chain
    pub fn undo_leaf_columns_nullable(&self) -> Self {
        self.without(|l| matches!(l, Layer::LeafColumnsNullable))
    }

    /// Splice every primary-key suppression layer out of the chain
    pub fn undo_suppress_primary_key_creation_from_properties(&self) -> Self {
        self.without(|l| matches!(l, Layer::SuppressPrimaryKey))
    }

    /// Strategy for the contents of a freshly spawned table
    ///
    /// Parent contexts, leaf nullability and key suppression belong to the
    /// table being left behind. Skip paths survive.
    pub fn for_new_table(&self) -> Self {
        self.undo_leaf_columns_nullable()
            .undo_suppress_primary_key_creation_from_properties()
            .without(|l| matches!(l, Layer::ParentContext(_)))
    }

    /// Number of layers, root included
    pub fn depth(&self) -> usize {
        self.layers().count()
    }
}
