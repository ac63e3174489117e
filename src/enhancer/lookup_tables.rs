//! Descriptor, enumeration and school year tables
//!
//! Lookup tables are the targets of the lookup foreign keys the builders add
//! for descriptor, enumeration and school year properties.

use tracing::{debug, warn};

use super::{BuildState, build_and_commit};
use crate::builder::naming::{self, SCHOOL_YEAR_COLUMN, SCHOOL_YEAR_TABLE};
use crate::builder::table_builder::build_entity_tables;
use crate::builder::{BuildContext, BuildStrategy, Scope, TableSet};
use crate::error::{BuildError, BuildResult};
use crate::metamodel::{Entity, EntityKind};
use crate::models::{
    Column, ColumnDataType, ColumnNameComponent, ColumnPair, ForeignKey, ForeignKeyReason, Table,
    TableExistenceReason, TableKey,
};
use crate::version::TechnologyVersion;

/// Abstract table every descriptor table extends
pub const BASE_DESCRIPTOR_TABLE: &str = "Descriptor";
pub const BASE_DESCRIPTOR_KEY: &str = "DescriptorId";

fn key_column(table_id: &str) -> Column {
    Column::new(format!("{}Id", table_id), ColumnDataType::Integer)
        .with_name_components(vec![
            ColumnNameComponent::base(table_id),
            ColumnNameComponent::synthetic("Id"),
        ])
        .primary_key()
}

/// `CodeValue`, `Description` and `ShortDescription` of enumeration-style tables
fn code_value_columns() -> Vec<Column> {
    vec![
        Column::new("CodeValue", ColumnDataType::string(50)),
        Column::new("Description", ColumnDataType::string(1024)),
        Column::new("ShortDescription", ColumnDataType::string(450)),
    ]
}

/// Enumeration-style table keyed by a surrogate identity column
fn enumeration_style_table(
    namespace: &str,
    table_id: &str,
    reason: TableExistenceReason,
    description: &str,
    version: TechnologyVersion,
) -> Table {
    let mut table = Table::new(namespace, table_id, reason).with_description(description);
    table.add_column(key_column(table_id).identity_database_type(), version);
    table.add_columns(code_value_columns(), version);
    table
}

/// The abstract `Descriptor` table in the core namespace
fn base_descriptor_table(namespace: &str, version: TechnologyVersion) -> Table {
    let mut table = Table::new(namespace, BASE_DESCRIPTOR_TABLE, TableExistenceReason::Descriptor)
        .with_description("This is the base entity for the descriptor pattern.");
    table.include_create_date_column = true;
    table.include_last_modified_date_and_id_column = true;
    table.add_columns(
        vec![
            key_column("Descriptor").identity_database_type(),
            Column::new("Namespace", ColumnDataType::string(255)),
            Column::new("CodeValue", ColumnDataType::string(50)),
            Column::new("ShortDescription", ColumnDataType::string(75)),
            Column::new("Description", ColumnDataType::string(1024)).nullable(),
            Column::new("EffectiveBeginDate", ColumnDataType::Date).nullable(),
            Column::new("EffectiveEndDate", ColumnDataType::Date).nullable(),
        ],
        version,
    );
    table
}

/// `<Name>Descriptor` table plus the join tables of its own properties
fn build_descriptor_table(
    ctx: &BuildContext<'_>,
    descriptor: &Entity,
    tables: &mut TableSet,
) -> BuildResult<usize> {
    let table_id = naming::descriptor_table_name(&descriptor.meta_ed_name);
    let key = key_column(&table_id).with_description(format!(
        "A unique identifier used as Primary Key and Foreign Key to {}.",
        BASE_DESCRIPTOR_TABLE
    ));

    let mut table = Table::new(&descriptor.namespace, &table_id, TableExistenceReason::Descriptor)
        .with_description(descriptor.documentation.clone())
        .with_parent_entity(descriptor.id);
    table.add_column(key.clone(), ctx.version);
    table.add_foreign_key(
        ForeignKey::new(
            &table_id,
            ctx.core_namespace,
            BASE_DESCRIPTOR_TABLE,
            vec![ColumnPair::new(&key.column_id, BASE_DESCRIPTOR_KEY)],
            ForeignKeyReason::DescriptorBase,
        )
        .with_delete_cascade(true),
    );

    let index = tables.push(table);
    let scope = Scope::root(tables, index, vec![key]);
    build_entity_tables(ctx, descriptor, &scope, &BuildStrategy::new(), tables)?;
    Ok(index)
}

/// Descriptor tables, preceded by the abstract `Descriptor` table
pub fn descriptors(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let mut descriptors = env.entities_of_kind(EntityKind::Descriptor).peekable();
    if descriptors.peek().is_none() {
        return Ok(());
    }

    let version = state.config.target_technology_version;
    let core = state.config.core_namespace.as_str();
    if state.repository.table(core, BASE_DESCRIPTOR_TABLE).is_none() {
        let mut base = base_descriptor_table(core, version);
        if version.primary_key_sort_applies() {
            base.sort_columns();
        }
        state.repository.insert(base)?;
    }

    for descriptor in descriptors {
        let (index, keys) = build_and_commit(state, descriptor.id, |ctx, tables| {
            build_descriptor_table(ctx, descriptor, tables)
        })?;
        if let Some(Some(key)) = keys.get(index) {
            state.repository.set_entity_table(descriptor.id, key.clone());
        }
    }
    Ok(())
}

/// `<Name>Type` tables for descriptors carrying a map type enumeration
///
/// The descriptor table gains a nullable `<Name>TypeId` column referencing
/// the new table.
pub fn descriptor_map_types(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let version = state.config.target_technology_version;

    for descriptor in env.entities_of_kind(EntityKind::Descriptor) {
        let Some(map_type) = descriptor.map_type else {
            continue;
        };
        let map_type = env.entity(map_type).ok_or_else(|| {
            BuildError::dangling(&descriptor.namespace, &descriptor.meta_ed_name, "mapTypeEnumeration")
        })?;

        let table_id = naming::enumeration_table_name(&descriptor.meta_ed_name);
        let map_table = enumeration_style_table(
            &descriptor.namespace,
            &table_id,
            TableExistenceReason::MapType,
            &map_type.documentation,
            version,
        );
        let key_id = map_table
            .primary_key_ids()
            .first()
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("{}Id", table_id));
        let (_, keys) = build_and_commit(state, map_type.id, |_, tables| {
            tables.push(map_table);
            Ok(())
        })?;
        if let Some(Some(key)) = keys.first() {
            state.repository.set_entity_table(map_type.id, key.clone());
        }

        let descriptor_key = state
            .repository
            .entity_table_key(descriptor.id)
            .cloned()
            .ok_or_else(|| BuildError::MissingTable {
                namespace: descriptor.namespace.clone(),
                entity: descriptor.meta_ed_name.clone(),
                table_id: naming::descriptor_table_name(&descriptor.meta_ed_name),
            })?;
        if let Some(table) = state.repository.get_mut(&descriptor_key) {
            let column = Column::new(&key_id, ColumnDataType::Integer)
                .with_name_components(vec![
                    ColumnNameComponent::base(table_id.clone()),
                    ColumnNameComponent::synthetic("Id"),
                ])
                .nullable();
            table.add_column(column, version);
            if version.primary_key_sort_applies() {
                table.sort_columns();
            }
            let foreign_key = ForeignKey::new(
                table.table_id.clone(),
                descriptor.namespace.clone(),
                table_id.clone(),
                vec![ColumnPair::same(&key_id)],
                ForeignKeyReason::MapType,
            );
            table.add_foreign_key(foreign_key);
        }
        debug!(
            descriptor = %descriptor.meta_ed_name,
            table_id = %table_id,
            "Map type table built"
        );
    }
    Ok(())
}

/// `<Name>Type` table of every enumeration
pub fn enumerations(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let version = state.config.target_technology_version;

    for enumeration in env.entities_of_kind(EntityKind::Enumeration) {
        let table_id = naming::enumeration_table_name(&enumeration.meta_ed_name);
        let table = enumeration_style_table(
            &enumeration.namespace,
            &table_id,
            TableExistenceReason::Enumeration,
            &enumeration.documentation,
            version,
        )
        .with_parent_entity(enumeration.id);
        let (_, keys) = build_and_commit(state, enumeration.id, |_, tables| {
            tables.push(table);
            Ok(())
        })?;
        if let Some(Some(key)) = keys.first() {
            state.repository.set_entity_table(enumeration.id, key.clone());
        }
    }
    Ok(())
}

/// The `SchoolYearType` table, once per namespace
pub fn school_years(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let version = state.config.target_technology_version;

    for school_year in env.entities_of_kind(EntityKind::SchoolYearEnumeration) {
        if let Some(key) = state
            .repository
            .table(&school_year.namespace, SCHOOL_YEAR_TABLE)
            .map(|t| TableKey::new(t.namespace.clone(), t.table_id.clone()))
        {
            warn!(
                namespace = %school_year.namespace,
                entity = %school_year.meta_ed_name,
                "School year table already built for namespace, reusing it"
            );
            state.repository.set_entity_table(school_year.id, key);
            continue;
        }

        let mut table = Table::new(&school_year.namespace, SCHOOL_YEAR_TABLE, TableExistenceReason::SchoolYear)
            .with_description(school_year.documentation.clone())
            .with_parent_entity(school_year.id);
        table.add_columns(
            vec![
                Column::new(SCHOOL_YEAR_COLUMN, ColumnDataType::Short)
                    .with_name_components(vec![ColumnNameComponent::base(SCHOOL_YEAR_COLUMN)])
                    .primary_key(),
                Column::new("SchoolYearDescription", ColumnDataType::string(50)),
                Column::new("CurrentSchoolYear", ColumnDataType::Boolean),
            ],
            version,
        );
        let (_, keys) = build_and_commit(state, school_year.id, |_, tables| {
            tables.push(table);
            Ok(())
        })?;
        if let Some(Some(key)) = keys.first() {
            state.repository.set_entity_table(school_year.id, key.clone());
        }
    }
    Ok(())
}
