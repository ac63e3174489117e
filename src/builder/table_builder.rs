//! Table builders, one per property kind
//!
//! A builder either appends columns to the table of the current [`Scope`] or
//! spawns a join table keyed by the scope's primary key. Spawned tables land
//! in the [`TableSet`] of the top-level entity; their foreign keys back to the
//! parent are created on [`TableSet::commit`], once every table's primary key
//! order is final.

use std::collections::HashSet;

use tracing::debug;

use super::column_creator::{create_columns, merge_skip_paths};
use super::naming::{self, TableNaming};
use super::primary_key::{collect_primary_keys, inherited_primary_keys};
use super::strategy::BuildStrategy;
use super::transform::ColumnTransform;
use super::{BuildContext, PropertyRef};
use crate::error::{BuildError, BuildResult};
use crate::metamodel::{Entity, EntityId, EntityKind, PropertyKind};
use crate::models::{
    Column, ColumnPair, ForeignKey, ForeignKeyReason, ReferenceSource, Table, TableExistenceReason,
    TableKey, TableNameComponent, TableRepository,
};
use crate::version::TechnologyVersion;

/// Table a spawned table's parent foreign key points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// A table of the same [`TableSet`]
    Local(usize),
    /// A table committed by an earlier build
    Stored(TableKey),
}

#[derive(Debug, Clone)]
struct ParentLink {
    child: usize,
    target: LinkTarget,
    reason: ForeignKeyReason,
}

/// Tables produced while building one top-level entity
#[derive(Debug)]
pub struct TableSet {
    root_entity: EntityId,
    tables: Vec<Table>,
    links: Vec<ParentLink>,
    discarded: HashSet<usize>,
}

impl TableSet {
    pub fn new(root_entity: EntityId) -> Self {
        Self {
            root_entity,
            tables: Vec::new(),
            links: Vec::new(),
            discarded: HashSet::new(),
        }
    }

    pub fn push(&mut self, mut table: Table) -> usize {
        if table.parent_entity.is_none() {
            table.parent_entity = Some(self.root_entity);
        }
        self.tables.push(table);
        self.tables.len() - 1
    }

    pub fn get(&self, index: usize) -> &Table {
        &self.tables[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Table {
        &mut self.tables[index]
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len() - self.discarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the cascading foreign key from `child` back to its parent table
    pub fn link_to_parent(&mut self, child: usize, target: LinkTarget, reason: ForeignKeyReason) {
        self.links.push(ParentLink {
            child,
            target,
            reason,
        });
    }

    /// Drop a table from the set; it will not be committed
    pub fn discard(&mut self, index: usize) {
        self.discarded.insert(index);
        self.links.retain(|link| link.child != index);
    }

    pub fn is_discarded(&self, index: usize) -> bool {
        self.discarded.contains(&index)
    }

    /// Finish every table and insert it into the repository
    ///
    /// Tables are visited in creation order, so a parent is always finished
    /// before its children copy its primary key order.
    pub fn commit(
        self,
        repository: &mut TableRepository,
        version: TechnologyVersion,
    ) -> BuildResult<Vec<Option<TableKey>>> {
        let Self {
            mut tables,
            links,
            discarded,
            ..
        } = self;

        for index in 0..tables.len() {
            if discarded.contains(&index) {
                continue;
            }
            let link = links.iter().find(|l| l.child == index);
            let target = match link {
                Some(link) => Some(Self::resolve_target(&tables, repository, link, index)?),
                None => None,
            };

            let table = &mut tables[index];
            if let Some((_, _, parent_keys)) = &target {
                table.parent_key_column_ids = parent_keys.clone();
            }
            if version.primary_key_sort_applies() {
                table.sort_columns();
            }
            if let (Some(link), Some((namespace, table_id, parent_keys))) = (link, target) {
                let pairs = parent_keys.iter().map(|id| ColumnPair::same(id)).collect();
                let foreign_key =
                    ForeignKey::new(table.table_id.clone(), namespace, table_id, pairs, link.reason)
                        .with_delete_cascade(true);
                table.add_foreign_key(foreign_key);
            }
        }

        let mut keys = Vec::with_capacity(tables.len());
        for (index, table) in tables.into_iter().enumerate() {
            if discarded.contains(&index) {
                keys.push(None);
                continue;
            }
            debug!(
                namespace = %table.namespace,
                table_id = %table.table_id,
                columns = table.columns.len(),
                "Committing table"
            );
            keys.push(Some(repository.insert(table)?));
        }
        Ok(keys)
    }

    /// Namespace, table id and primary key ids of a link target
    fn resolve_target(
        tables: &[Table],
        repository: &TableRepository,
        link: &ParentLink,
        child: usize,
    ) -> BuildResult<(String, String, Vec<String>)> {
        let parent = match &link.target {
            LinkTarget::Local(index) => &tables[*index],
            LinkTarget::Stored(key) => {
                repository
                    .get(key)
                    .ok_or_else(|| BuildError::MissingTable {
                        namespace: key.namespace.clone(),
                        entity: tables[child].table_id.clone(),
                        table_id: key.table_id.clone(),
                    })?
            }
        };
        let keys = parent
            .primary_key_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok((parent.namespace.clone(), parent.table_id.clone(), keys))
    }
}

/// Where a builder puts its columns and how it hangs spawned tables
#[derive(Debug, Clone)]
pub struct Scope {
    /// Table receiving columns
    pub table: usize,
    /// Namespace of spawned tables
    pub namespace: String,
    /// Naming root of spawned tables
    pub table_id: String,
    pub name_group: Vec<TableNameComponent>,
    /// Parent foreign key target of spawned tables
    pub parent_link: LinkTarget,
    /// Key copied into spawned tables
    pub primary_keys: Vec<Column>,
    /// Full property names from the table root to the current owner
    pub path: Vec<String>,
}

impl Scope {
    /// Scope rooted at a table of the set
    pub fn root(tables: &TableSet, index: usize, primary_keys: Vec<Column>) -> Self {
        let table = tables.get(index);
        Self {
            table: index,
            namespace: table.namespace.clone(),
            table_id: table.table_id.clone(),
            name_group: table.name_group.clone(),
            parent_link: LinkTarget::Local(index),
            primary_keys,
            path: Vec::new(),
        }
    }

    /// Scope whose columns go to `index` while spawned tables hang off a stored table
    pub fn detached(index: usize, namespace: impl Into<String>, parent: &Table, parent_key: TableKey) -> Self {
        Self {
            table: index,
            namespace: namespace.into(),
            table_id: parent.table_id.clone(),
            name_group: parent.name_group.clone(),
            parent_link: LinkTarget::Stored(parent_key),
            primary_keys: parent.primary_key_columns(),
            path: Vec::new(),
        }
    }

    fn descend(&self, full_property_name: String) -> Self {
        let mut scope = self.clone();
        scope.path.push(full_property_name);
        scope
    }

    /// Prefix a column with the property path leading to this scope
    fn place(&self, column: Column) -> Column {
        self.path
            .iter()
            .rev()
            .fold(column, |column, segment| column.prefixed_by(segment))
    }
}

/// Table builder selected by property kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableBuilder {
    Simple,
    /// Descriptor, enumeration and school year references
    Lookup,
    /// Association and DomainEntity references
    Reference,
    Common,
    Choice,
    InlineCommon,
}

impl TableBuilder {
    pub fn for_property(kind: &PropertyKind) -> Self {
        match kind {
            PropertyKind::Boolean
            | PropertyKind::Currency
            | PropertyKind::Date
            | PropertyKind::Datetime
            | PropertyKind::Duration
            | PropertyKind::Integer
            | PropertyKind::BigInteger
            | PropertyKind::Percent
            | PropertyKind::Short
            | PropertyKind::Time
            | PropertyKind::Year
            | PropertyKind::Decimal { .. }
            | PropertyKind::String { .. } => Self::Simple,
            PropertyKind::Descriptor
            | PropertyKind::Enumeration
            | PropertyKind::SchoolYearEnumeration => Self::Lookup,
            PropertyKind::Association | PropertyKind::DomainEntity => Self::Reference,
            PropertyKind::Common => Self::Common,
            PropertyKind::Choice => Self::Choice,
            PropertyKind::InlineCommon => Self::InlineCommon,
        }
    }

    pub fn build_tables(
        &self,
        ctx: &BuildContext<'_>,
        prop: PropertyRef<'_>,
        scope: &Scope,
        strategy: &BuildStrategy,
        tables: &mut TableSet,
    ) -> BuildResult<()> {
        match self {
            Self::Simple => build_simple(ctx, prop, scope, strategy, tables),
            Self::Lookup => build_lookup(ctx, prop, scope, strategy, tables),
            Self::Reference => build_reference(ctx, prop, scope, strategy, tables),
            Self::Common if prop.property.is_extension_override => {
                build_common_extension(ctx, prop, scope, strategy, tables)
            }
            Self::Common => build_common(ctx, prop, scope, strategy, tables),
            Self::Choice => {
                let choice = ctx.env.referenced_entity(prop.owner, prop.property)?;
                let nested = strategy.make_leaf_columns_nullable();
                let scope = scope.descend(prop.property.full_property_name());
                build_entity_tables(ctx, choice, &scope, &nested, tables)
            }
            Self::InlineCommon => {
                let inline = ctx.env.referenced_entity(prop.owner, prop.property)?;
                let mut nested = strategy.append_parent_context_property(prop.property);
                if prop.property.is_optional {
                    nested = nested.make_leaf_columns_nullable();
                }
                let scope = scope.descend(prop.property.full_property_name());
                build_entity_tables(ctx, inline, &scope, &nested, tables)
            }
        }
    }
}

/// Build the tables and columns of one property
pub fn build_property_tables(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    TableBuilder::for_property(&prop.property.kind).build_tables(ctx, prop, scope, strategy, tables)
}

/// Build every property of an entity into the scope
pub fn build_entity_tables(
    ctx: &BuildContext<'_>,
    entity: &Entity,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    for prop in PropertyRef::all_of(entity) {
        build_property_tables(ctx, prop, scope, strategy, tables)?;
    }
    Ok(())
}

/// Root table of a domain entity, association or subclass
///
/// Returns the index of the root table; join tables follow it in the set.
pub fn build_main_table(
    ctx: &BuildContext<'_>,
    entity: &Entity,
    reason: TableExistenceReason,
    tables: &mut TableSet,
) -> BuildResult<usize> {
    let naming = TableNaming::main(&entity.meta_ed_name);
    let mut table = Table::new(&entity.namespace, naming.table_id, reason)
        .with_name_group(naming.name_group)
        .with_description(entity.documentation.clone())
        .with_parent_entity(entity.id);
    // Subclass rows share the audit columns of their base row
    let audited = reason == TableExistenceReason::Main;
    table.include_create_date_column = audited;
    table.include_last_modified_date_and_id_column = audited;

    let strategy = BuildStrategy::new();
    let primary_keys = collect_primary_keys(ctx, entity, &strategy)?;
    if entity.kind.is_subclass() {
        table.add_columns(inherited_primary_keys(ctx, entity, &strategy)?, ctx.version);
    }

    let index = tables.push(table);
    let scope = Scope::root(tables, index, primary_keys);
    build_entity_tables(ctx, entity, &scope, &strategy, tables)?;

    debug!(
        entity = %entity.meta_ed_name,
        table_id = %tables.get(index).table_id,
        columns = tables.get(index).columns.len(),
        tables = tables.len(),
        "Built main table"
    );
    Ok(index)
}

/// `<Base>Extension` table of a domain entity or association extension
///
/// Returns `None` when the table would carry nothing beyond the base key;
/// join tables for the extension's collections are built either way.
pub fn build_extension_table(
    ctx: &BuildContext<'_>,
    extension: &Entity,
    tables: &mut TableSet,
) -> BuildResult<Option<usize>> {
    let base = ctx.env.base_entity(extension)?;
    let (base_key, base_table) = stored_entity_table(ctx, extension, base)?;

    let naming = TableNaming::suffixed(&base_table.table_id, &base_table.name_group, "Extension");
    let mut table = Table::new(&extension.namespace, naming.table_id, TableExistenceReason::Extension)
        .with_name_group(naming.name_group)
        .with_description(extension.documentation.clone());
    table.include_create_date_column = ctx.include_create_date_on_extension_tables;
    table.add_parent_primary_keys(&base_table.primary_key_columns(), ctx.version);

    let index = tables.push(table);
    let scope = Scope::detached(index, &extension.namespace, base_table, base_key.clone());
    build_entity_tables(ctx, extension, &scope, &BuildStrategy::new(), tables)?;

    if !tables.get(index).has_own_columns() {
        debug!(
            entity = %extension.meta_ed_name,
            table_id = %tables.get(index).table_id,
            "Extension adds no columns, table elided"
        );
        tables.discard(index);
        return Ok(None);
    }
    tables.link_to_parent(index, LinkTarget::Stored(base_key), ForeignKeyReason::Extension);
    Ok(Some(index))
}

/// Committed main table of an entity
pub(crate) fn stored_entity_table<'a>(
    ctx: &BuildContext<'a>,
    requester: &Entity,
    entity: &Entity,
) -> BuildResult<(TableKey, &'a Table)> {
    let missing = || BuildError::MissingTable {
        namespace: entity.namespace.clone(),
        entity: requester.meta_ed_name.clone(),
        table_id: entity.meta_ed_name.clone(),
    };
    let key = ctx.tables.entity_table_key(entity.id).ok_or_else(missing)?;
    let table = ctx.tables.get(key).ok_or_else(missing)?;
    Ok((key.clone(), table))
}

fn add_to_scope(
    ctx: &BuildContext<'_>,
    scope: &Scope,
    columns: Vec<Column>,
    transform: &ColumnTransform,
    tables: &mut TableSet,
) {
    let table = tables.get_mut(scope.table);
    for column in columns {
        table.add_column(scope.place(transform.apply(column)), ctx.version);
    }
}

fn build_simple(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    if prop.property.is_collection() {
        return build_collection_table(ctx, prop, scope, strategy, None, tables);
    }
    let columns = create_columns(ctx, prop, strategy)?;
    add_to_scope(ctx, scope, columns, &strategy.leaf_columns(ColumnTransform::Unchanged), tables);
    Ok(())
}

/// Namespace, table id and key column of a lookup property's target table
struct LookupTarget {
    namespace: String,
    table_id: String,
    column_id: String,
}

impl LookupTarget {
    fn of(ctx: &BuildContext<'_>, prop: PropertyRef<'_>) -> BuildResult<Self> {
        let property = prop.property;
        let target = match property.kind {
            PropertyKind::SchoolYearEnumeration => {
                let namespace = ctx
                    .env
                    .entities_of_kind(EntityKind::SchoolYearEnumeration)
                    .next()
                    .map(|e| e.namespace.clone())
                    .unwrap_or_else(|| ctx.core_namespace.to_string());
                Self {
                    namespace,
                    table_id: naming::SCHOOL_YEAR_TABLE.to_string(),
                    column_id: naming::SCHOOL_YEAR_COLUMN.to_string(),
                }
            }
            PropertyKind::Descriptor => {
                let referenced = ctx.env.referenced_entity(prop.owner, property)?;
                let table_id = naming::descriptor_table_name(&referenced.meta_ed_name);
                Self {
                    namespace: referenced.namespace.clone(),
                    column_id: format!("{}Id", table_id),
                    table_id,
                }
            }
            _ => {
                let referenced = ctx.env.referenced_entity(prop.owner, property)?;
                let table_id = naming::enumeration_table_name(&referenced.meta_ed_name);
                Self {
                    namespace: referenced.namespace.clone(),
                    column_id: format!("{}Id", table_id),
                    table_id,
                }
            }
        };
        Ok(target)
    }

    fn foreign_key(&self, parent_table_id: &str, column_id: &str, property: &str) -> ForeignKey {
        ForeignKey::new(
            parent_table_id,
            self.namespace.clone(),
            self.table_id.clone(),
            vec![ColumnPair::new(column_id, self.column_id.clone())],
            ForeignKeyReason::Lookup,
        )
        .with_source_property(property)
    }
}

fn build_lookup(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let target = LookupTarget::of(ctx, prop)?;
    if prop.property.is_collection() {
        return build_collection_table(ctx, prop, scope, strategy, Some(target), tables);
    }

    let columns = create_columns(ctx, prop, strategy)?;
    let Some(column_id) = columns.first().map(|c| c.column_id.clone()) else {
        return Ok(());
    };
    add_to_scope(ctx, scope, columns, &strategy.leaf_columns(ColumnTransform::Unchanged), tables);

    let table = tables.get_mut(scope.table);
    let foreign_key = target.foreign_key(&table.table_id, &column_id, &prop.property.full_property_name());
    table.add_foreign_key(foreign_key);
    Ok(())
}

fn new_join_table(
    scope: &Scope,
    strategy: &BuildStrategy,
    prop: PropertyRef<'_>,
    reason: TableExistenceReason,
) -> Table {
    let naming = TableNaming::join_table(&scope.table_id, &scope.name_group, strategy, prop.property);
    let mut table = Table::new(&scope.namespace, naming.table_id, reason)
        .with_name_group(naming.name_group)
        .with_description(prop.property.documentation.clone());
    table.is_required_collection_table = prop.property.is_required_collection;
    table.include_create_date_column = true;
    table
}

/// Join table for a scalar or lookup collection
fn build_collection_table(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    lookup: Option<LookupTarget>,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let mut join = new_join_table(scope, strategy, prop, TableExistenceReason::Collection);
    join.add_parent_primary_keys(&scope.primary_keys, ctx.version);

    let content = strategy.for_new_table().column_namer_ignores_role_name();
    let leaf = create_columns(ctx, prop, &content)?;
    if let (Some(target), Some(column)) = (&lookup, leaf.first()) {
        let foreign_key = target.foreign_key(
            &join.table_id,
            &column.column_id,
            &prop.property.full_property_name(),
        );
        join.add_foreign_key(foreign_key);
    }
    join.add_columns(ColumnTransform::PrimaryKey.apply_all(leaf), ctx.version);

    let index = tables.push(join);
    tables.link_to_parent(index, scope.parent_link.clone(), ForeignKeyReason::Collection);
    Ok(())
}

fn build_reference(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let property = prop.property;
    let referenced = ctx.env.referenced_entity(prop.owner, property)?;
    if property.is_collection() {
        return build_reference_collection_table(ctx, prop, referenced, scope, strategy, tables);
    }
    if !strategy.build_columns(property) {
        return Ok(());
    }

    let transform = if property.is_part_of_identity && !strategy.suppress_primary_key_creation() {
        ColumnTransform::PrimaryKey
    } else if property.is_optional {
        ColumnTransform::Nullable
    } else {
        ColumnTransform::NotNull
    };
    let columns = create_columns(ctx, prop, strategy)?;
    add_to_scope(ctx, scope, columns, &strategy.leaf_columns(transform), tables);

    tables.get_mut(scope.table).add_reference_source(ReferenceSource {
        owner_path: scope.path.clone(),
        property: prop.id,
        referenced_entity: referenced.id,
    });
    Ok(())
}

/// Join table pairing the parent key with the referenced entity's key
fn build_reference_collection_table(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    referenced: &Entity,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let property = prop.property;
    let full_name = property.full_property_name();

    let mut join = new_join_table(scope, strategy, prop, TableExistenceReason::Collection);
    join.add_parent_primary_keys(&scope.primary_keys, ctx.version);

    // Merge paths start at the property; the parent-context descent re-roots them
    let mut content = strategy.for_new_table();
    if !property.merge_directives.is_empty() {
        content = content.skip_path(merge_skip_paths(property));
    }
    let content = content.append_parent_context_property(property);
    let columns: Vec<Column> = collect_primary_keys(ctx, referenced, &content)?
        .into_iter()
        .map(|column| column.prefixed_by(&full_name))
        .collect();
    join.add_columns(ColumnTransform::PrimaryKey.apply_all(columns), ctx.version);
    join.add_reference_source(ReferenceSource {
        owner_path: Vec::new(),
        property: prop.id,
        referenced_entity: referenced.id,
    });

    let index = tables.push(join);
    tables.link_to_parent(index, scope.parent_link.clone(), ForeignKeyReason::Collection);
    Ok(())
}

/// Join table holding a common's columns
///
/// An optional common contributes no key columns: the join table is keyed by
/// the parent key alone.
fn build_common(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let property = prop.property;
    let common = ctx.env.referenced_entity(prop.owner, property)?;

    let mut join = new_join_table(scope, strategy, prop, TableExistenceReason::Common);
    if join.description.is_empty() {
        join.description = common.documentation.clone();
    }

    let mut content = strategy.for_new_table();
    if property.is_optional {
        content = content.suppress_primary_key_creation_from_properties();
    }
    let common_keys = collect_primary_keys(ctx, common, &content)?
        .into_iter()
        .filter(|column| column.is_part_of_primary_key);

    let parent_keys_first = ctx.version.parent_primary_keys_first_in_common_tables();
    if parent_keys_first {
        join.add_parent_primary_keys(&scope.primary_keys, ctx.version);
    }

    let index = tables.push(join);
    let mut join_keys: Vec<Column> = scope.primary_keys.iter().map(Column::as_parent_key).collect();
    join_keys.extend(common_keys);
    let join_scope = Scope::root(tables, index, join_keys).descend(property.full_property_name());
    build_entity_tables(ctx, common, &join_scope, &content, tables)?;

    if !parent_keys_first {
        tables
            .get_mut(index)
            .add_parent_primary_keys(&scope.primary_keys, ctx.version);
    }
    tables.link_to_parent(index, scope.parent_link.clone(), ForeignKeyReason::Common);
    Ok(())
}

/// `<JoinTable>Extension` table adding a common extension's columns to a core join table
fn build_common_extension(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    scope: &Scope,
    strategy: &BuildStrategy,
    tables: &mut TableSet,
) -> BuildResult<()> {
    let property = prop.property;
    let extension = ctx.env.referenced_entity(prop.owner, property)?;

    let core_join_id = TableNaming::join_table(&scope.table_id, &scope.name_group, strategy, property).table_id;
    let core_namespace = match &scope.parent_link {
        LinkTarget::Stored(key) => key.namespace.clone(),
        LinkTarget::Local(index) => tables.get(*index).namespace.clone(),
    };
    let core_key = TableKey::new(core_namespace, core_join_id);
    let core_join = ctx.tables.get(&core_key).ok_or_else(|| BuildError::MissingTable {
        namespace: core_key.namespace.clone(),
        entity: prop.owner.meta_ed_name.clone(),
        table_id: core_key.table_id.clone(),
    })?;

    let naming = TableNaming::suffixed(&core_join.table_id, &core_join.name_group, "Extension");
    let mut table = Table::new(&extension.namespace, naming.table_id, TableExistenceReason::CommonExtension)
        .with_name_group(naming.name_group)
        .with_description(extension.documentation.clone());
    table.include_create_date_column = ctx.include_create_date_on_extension_tables;
    table.add_parent_primary_keys(&core_join.primary_key_columns(), ctx.version);

    let index = tables.push(table);
    let extension_scope = Scope::detached(index, &extension.namespace, core_join, core_key.clone());
    build_entity_tables(ctx, extension, &extension_scope, &strategy.for_new_table(), tables)?;

    if tables.get(index).has_own_columns() {
        tables.link_to_parent(index, LinkTarget::Stored(core_key), ForeignKeyReason::CommonExtension);
    } else {
        tables.discard(index);
    }
    Ok(())
}
