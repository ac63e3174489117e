//! Entity properties of the input model

use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Stable address of a property: owning entity plus declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId {
    pub entity: EntityId,
    pub index: usize,
}

/// Closed set of property kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PropertyKind {
    Boolean,
    Currency,
    Date,
    Datetime,
    Duration,
    Integer,
    BigInteger,
    Percent,
    Short,
    Time,
    Year,
    #[serde(rename_all = "camelCase")]
    Decimal { precision: u32, scale: u32 },
    #[serde(rename_all = "camelCase")]
    String {
        #[serde(default)]
        min_length: Option<u32>,
        max_length: u32,
    },
    Descriptor,
    Enumeration,
    SchoolYearEnumeration,
    Association,
    DomainEntity,
    Common,
    Choice,
    InlineCommon,
}

impl PropertyKind {
    /// String kind with only a maximum length
    pub fn string(max_length: u32) -> Self {
        Self::String {
            min_length: None,
            max_length,
        }
    }

    /// Scalar kinds that map straight onto one column
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Currency
                | Self::Date
                | Self::Datetime
                | Self::Duration
                | Self::Integer
                | Self::BigInteger
                | Self::Percent
                | Self::Short
                | Self::Time
                | Self::Year
                | Self::Decimal { .. }
                | Self::String { .. }
        )
    }

    /// Association or domain entity reference
    pub fn is_entity_reference(&self) -> bool {
        matches!(self, Self::Association | Self::DomainEntity)
    }

    /// Descriptor, enumeration or school year enumeration
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::Descriptor | Self::Enumeration | Self::SchoolYearEnumeration
        )
    }

    /// Kinds that must carry a resolved `referenced_entity`
    pub fn requires_referenced_entity(&self) -> bool {
        matches!(
            self,
            Self::Association
                | Self::DomainEntity
                | Self::Descriptor
                | Self::Enumeration
                | Self::Common
                | Self::Choice
                | Self::InlineCommon
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Duration => "duration",
            Self::Integer => "integer",
            Self::BigInteger => "bigInteger",
            Self::Percent => "percent",
            Self::Short => "short",
            Self::Time => "time",
            Self::Year => "year",
            Self::Decimal { .. } => "decimal",
            Self::String { .. } => "string",
            Self::Descriptor => "descriptor",
            Self::Enumeration => "enumeration",
            Self::SchoolYearEnumeration => "schoolYearEnumeration",
            Self::Association => "association",
            Self::DomainEntity => "domainEntity",
            Self::Common => "common",
            Self::Choice => "choice",
            Self::InlineCommon => "inlineCommon",
        }
    }
}

/// Declared equivalence between two property paths of the same owning entity
///
/// Both paths start at the owning entity, e.g. `Session.School` merged onto `School`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDirective {
    pub source_property_path: Vec<String>,
    pub target_property_path: Vec<String>,
}

impl MergeDirective {
    /// Build from dotted paths
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source_property_path: split_path(source),
            target_property_path: split_path(target),
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// A property declared on an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProperty {
    pub meta_ed_name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub shorten_to: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub is_part_of_identity: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_required_collection: bool,
    #[serde(default)]
    pub is_optional_collection: bool,
    #[serde(default)]
    pub is_identity_rename: bool,
    /// Base entity identity name replaced by an identity rename
    #[serde(default)]
    pub base_key_name: String,
    /// Weak references produce columns but no foreign key
    #[serde(default)]
    pub is_weak: bool,
    #[serde(default)]
    pub delete_cascade: bool,
    /// Common property redirected to a CommonExtension
    #[serde(default)]
    pub is_extension_override: bool,
    #[serde(default)]
    pub merge_directives: Vec<MergeDirective>,
    #[serde(default)]
    pub referenced_entity: Option<EntityId>,
}

impl EntityProperty {
    /// Create a required, non-identity property
    pub fn new(meta_ed_name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            meta_ed_name: meta_ed_name.into(),
            kind,
            role_name: String::new(),
            shorten_to: String::new(),
            documentation: String::new(),
            is_part_of_identity: false,
            is_required: true,
            is_optional: false,
            is_required_collection: false,
            is_optional_collection: false,
            is_identity_rename: false,
            base_key_name: String::new(),
            is_weak: false,
            delete_cascade: false,
            is_extension_override: false,
            merge_directives: Vec::new(),
            referenced_entity: None,
        }
    }

    fn with_cardinality(mut self, identity: bool, required: bool, optional: bool) -> Self {
        self.is_part_of_identity = identity;
        self.is_required = required;
        self.is_optional = optional;
        self.is_required_collection = false;
        self.is_optional_collection = false;
        self
    }

    pub fn identity(self) -> Self {
        self.with_cardinality(true, false, false)
    }

    pub fn required(self) -> Self {
        self.with_cardinality(false, true, false)
    }

    pub fn optional(self) -> Self {
        self.with_cardinality(false, false, true)
    }

    pub fn required_collection(mut self) -> Self {
        self = self.with_cardinality(false, false, false);
        self.is_required_collection = true;
        self
    }

    pub fn optional_collection(mut self) -> Self {
        self = self.with_cardinality(false, false, false);
        self.is_optional_collection = true;
        self
    }

    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = role_name.into();
        self
    }

    pub fn with_shorten_to(mut self, shorten_to: impl Into<String>) -> Self {
        self.shorten_to = shorten_to.into();
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn references(mut self, entity: EntityId) -> Self {
        self.referenced_entity = Some(entity);
        self
    }

    /// Mark as the identity property that renames the base entity's key
    pub fn identity_rename(mut self, base_key_name: impl Into<String>) -> Self {
        self = self.identity();
        self.is_identity_rename = true;
        self.base_key_name = base_key_name.into();
        self
    }

    pub fn with_merge_directive(mut self, source: &str, target: &str) -> Self {
        self.merge_directives.push(MergeDirective::new(source, target));
        self
    }

    pub fn weak(mut self) -> Self {
        self.is_weak = true;
        self
    }

    pub fn with_delete_cascade(mut self) -> Self {
        self.delete_cascade = true;
        self
    }

    pub fn extension_override(mut self) -> Self {
        self.is_extension_override = true;
        self
    }

    pub fn is_collection(&self) -> bool {
        self.is_required_collection || self.is_optional_collection
    }

    /// Role name as it appears in generated identifiers
    pub fn context_prefix(&self) -> &str {
        if !self.shorten_to.is_empty() {
            &self.shorten_to
        } else if self.role_name == self.meta_ed_name {
            ""
        } else {
            &self.role_name
        }
    }

    /// Role name plus declared name, the segment used in property paths
    pub fn full_property_name(&self) -> String {
        if self.role_name == self.meta_ed_name {
            self.meta_ed_name.clone()
        } else {
            format!("{}{}", self.role_name, self.meta_ed_name)
        }
    }

    /// Context prefix plus declared name, used for join table ids
    pub fn ods_name(&self) -> String {
        format!("{}{}", self.context_prefix(), self.meta_ed_name)
    }
}
