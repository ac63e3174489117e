//! Top level entities of the input model

use serde::{Deserialize, Serialize};

use super::property::{EntityProperty, PropertyId};

/// Index of an entity inside its [`MetaEdEnvironment`](super::MetaEdEnvironment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub usize);

/// Closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    DomainEntity,
    DomainEntitySubclass,
    DomainEntityExtension,
    Association,
    AssociationSubclass,
    AssociationExtension,
    Descriptor,
    Enumeration,
    MapTypeEnumeration,
    SchoolYearEnumeration,
    Common,
    CommonExtension,
    InlineCommon,
    Choice,
}

impl EntityKind {
    pub fn is_subclass(&self) -> bool {
        matches!(self, Self::DomainEntitySubclass | Self::AssociationSubclass)
    }

    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            Self::DomainEntityExtension | Self::AssociationExtension | Self::CommonExtension
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DomainEntity => "Domain Entity",
            Self::DomainEntitySubclass => "Domain Entity Subclass",
            Self::DomainEntityExtension => "Domain Entity Extension",
            Self::Association => "Association",
            Self::AssociationSubclass => "Association Subclass",
            Self::AssociationExtension => "Association Extension",
            Self::Descriptor => "Descriptor",
            Self::Enumeration => "Enumeration",
            Self::MapTypeEnumeration => "Map Type Enumeration",
            Self::SchoolYearEnumeration => "School Year Enumeration",
            Self::Common => "Common",
            Self::CommonExtension => "Common Extension",
            Self::InlineCommon => "Inline Common",
            Self::Choice => "Choice",
        }
    }
}

/// A named entity owning an ordered list of properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Assigned by the environment on insertion
    #[serde(default = "unassigned")]
    pub id: EntityId,
    pub kind: EntityKind,
    pub meta_ed_name: String,
    pub namespace: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: Vec<EntityProperty>,
    /// Base entity of a subclass or extension
    #[serde(default)]
    pub base_entity: Option<EntityId>,
    #[serde(default)]
    pub allow_primary_key_updates: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// Map type enumeration of a descriptor
    #[serde(default)]
    pub map_type: Option<EntityId>,
}

fn unassigned() -> EntityId {
    EntityId(usize::MAX)
}

impl Entity {
    pub fn new(kind: EntityKind, namespace: impl Into<String>, meta_ed_name: impl Into<String>) -> Self {
        Self {
            id: unassigned(),
            kind,
            meta_ed_name: meta_ed_name.into(),
            namespace: namespace.into(),
            documentation: String::new(),
            properties: Vec::new(),
            base_entity: None,
            allow_primary_key_updates: false,
            is_abstract: false,
            map_type: None,
        }
    }

    pub fn with_property(mut self, property: EntityProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn with_base_entity(mut self, base: EntityId) -> Self {
        self.base_entity = Some(base);
        self
    }

    pub fn with_map_type(mut self, map_type: EntityId) -> Self {
        self.map_type = Some(map_type);
        self
    }

    pub fn allowing_primary_key_updates(mut self) -> Self {
        self.allow_primary_key_updates = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Identity properties in declaration order
    pub fn identity_properties(&self) -> impl Iterator<Item = (PropertyId, &EntityProperty)> {
        self.properties_with_ids()
            .filter(|(_, property)| property.is_part_of_identity)
    }

    pub fn properties_with_ids(&self) -> impl Iterator<Item = (PropertyId, &EntityProperty)> {
        let entity = self.id;
        self.properties
            .iter()
            .enumerate()
            .map(move |(index, property)| (PropertyId { entity, index }, property))
    }

    pub fn has_map_type(&self) -> bool {
        self.map_type.is_some()
    }

    /// Database schema for this entity's tables
    pub fn schema(&self) -> String {
        self.namespace.to_lowercase()
    }
}
