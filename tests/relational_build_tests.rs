//! End-to-end relational build tests

use metaed_ods_relational::builder::naming::display_name;
use metaed_ods_relational::config::{BuildConfig, BuildStage};
use metaed_ods_relational::error::BuildError;
use metaed_ods_relational::metamodel::{Entity, EntityId, EntityKind, EntityProperty, MetaEdEnvironment, PropertyKind};
use metaed_ods_relational::models::{ColumnDataType, ForeignKeyReason, Table, TableExistenceReason, TableRepository};
use metaed_ods_relational::pipeline::{PipelineError, RelationalPipeline, run_pipeline};
use metaed_ods_relational::validation::TableValidator;
use metaed_ods_relational::version::TechnologyVersion;

fn build(env: &MetaEdEnvironment) -> TableRepository {
    run_pipeline(BuildConfig::default(), env).unwrap().repository
}

fn column_ids(table: &Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.column_id.as_str()).collect()
}

fn school(env: &mut MetaEdEnvironment) -> EntityId {
    env.add_entity(
        Entity::new(EntityKind::DomainEntity, "EdFi", "School")
            .with_property(EntityProperty::new("SchoolId", PropertyKind::Integer).identity())
            .with_property(EntityProperty::new("NameOfInstitution", PropertyKind::string(75))),
    )
}

fn student(env: &mut MetaEdEnvironment) -> EntityId {
    env.add_entity(
        Entity::new(EntityKind::DomainEntity, "EdFi", "Student")
            .with_property(EntityProperty::new("StudentUniqueId", PropertyKind::string(32)).identity())
            .with_property(EntityProperty::new("BirthDate", PropertyKind::Date)),
    )
}

/// A model touching every table-producing path of the pipeline
fn district_environment() -> MetaEdEnvironment {
    let mut env = MetaEdEnvironment::new();
    let grade = env.add_entity(Entity::new(EntityKind::Descriptor, "EdFi", "GradeLevel"));
    let term = env.add_entity(
        Entity::new(EntityKind::Descriptor, "EdFi", "Term")
            .with_property(EntityProperty::new("TermCode", PropertyKind::string(10)).optional()),
    );
    let address = env.add_entity(
        Entity::new(EntityKind::Common, "EdFi", "Address")
            .with_property(EntityProperty::new("StreetNumberName", PropertyKind::string(150)).identity())
            .with_property(EntityProperty::new("City", PropertyKind::string(30)).identity())
            .with_property(EntityProperty::new("PostalCode", PropertyKind::string(17)).optional()),
    );
    let school = env.add_entity(
        Entity::new(EntityKind::DomainEntity, "EdFi", "School")
            .with_property(EntityProperty::new("SchoolId", PropertyKind::Integer).identity())
            .with_property(
                EntityProperty::new("GradeLevel", PropertyKind::Descriptor)
                    .required_collection()
                    .references(grade),
            )
            .with_property(
                EntityProperty::new("Address", PropertyKind::Common)
                    .optional_collection()
                    .references(address),
            ),
    );
    let session = env.add_entity(
        Entity::new(EntityKind::DomainEntity, "EdFi", "Session")
            .allowing_primary_key_updates()
            .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).identity().references(school))
            .with_property(EntityProperty::new("SessionName", PropertyKind::string(60)).identity())
            .with_property(EntityProperty::new("Term", PropertyKind::Descriptor).references(term)),
    );
    let student = student(&mut env);
    env.add_entity(
        Entity::new(EntityKind::DomainEntity, "EdFi", "Section")
            .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).identity().references(school))
            .with_property(
                EntityProperty::new("Session", PropertyKind::DomainEntity)
                    .identity()
                    .references(session)
                    .with_merge_directive("Session.School", "School"),
            )
            .with_property(EntityProperty::new("SectionIdentifier", PropertyKind::string(255)).identity())
            .with_property(
                EntityProperty::new("Student", PropertyKind::DomainEntity)
                    .optional_collection()
                    .references(student),
            ),
    );
    env.add_entity(
        Entity::new(EntityKind::DomainEntityExtension, "Sample", "School")
            .with_base_entity(school)
            .with_property(EntityProperty::new("MascotName", PropertyKind::string(30)).optional()),
    );
    env
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_association_keyed_by_both_references() {
        let mut env = MetaEdEnvironment::new();
        let school = school(&mut env);
        let student = student(&mut env);
        env.add_entity(
            Entity::new(EntityKind::Association, "EdFi", "StudentSchoolAssociation")
                .with_property(EntityProperty::new("Student", PropertyKind::DomainEntity).identity().references(student))
                .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).identity().references(school))
                .with_property(EntityProperty::new("EntryDate", PropertyKind::Date)),
        );
        let repo = build(&env);

        let association = repo.table("EdFi", "StudentSchoolAssociation").unwrap();
        let student_key = association.column("StudentUniqueId").unwrap();
        let school_key = association.column("SchoolId").unwrap();
        assert!(student_key.is_part_of_primary_key);
        assert!(school_key.is_part_of_primary_key);
        assert_eq!(school_key.data_type, ColumnDataType::Integer);
        assert_eq!(association.primary_keys().len(), 2);

        let mut targets: Vec<&str> = association
            .foreign_keys
            .iter()
            .map(|fk| fk.foreign_table_id.as_str())
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["School", "Student"]);
        assert!(association.foreign_keys.iter().all(|fk| fk.reason == ForeignKeyReason::Reference));
        assert!(association.foreign_keys.iter().all(|fk| !fk.with_delete_cascade));
    }

    #[test]
    fn test_common_collection_join_table_collapses_name() {
        let mut env = MetaEdEnvironment::new();
        let address = env.add_entity(
            Entity::new(EntityKind::Common, "EdFi", "StudentAddress")
                .with_property(EntityProperty::new("StreetNumberName", PropertyKind::string(150)).identity())
                .with_property(EntityProperty::new("City", PropertyKind::string(30)).identity()),
        );
        env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Student")
                .with_property(EntityProperty::new("StudentUniqueId", PropertyKind::string(32)).identity())
                .with_property(
                    EntityProperty::new("StudentAddress", PropertyKind::Common)
                        .optional_collection()
                        .references(address),
                ),
        );
        let repo = build(&env);

        let join = repo.table("EdFi", "StudentStudentAddress").unwrap();
        assert_eq!(display_name(&join.name_group), "StudentAddress");
        assert_eq!(join.existence_reason, TableExistenceReason::Common);
        assert_eq!(
            join.primary_key_ids(),
            vec!["StudentUniqueId", "City", "StreetNumberName"]
        );

        let fk = &join.foreign_keys[0];
        assert_eq!(fk.foreign_table_id, "Student");
        assert_eq!(fk.foreign_column_ids(), vec!["StudentUniqueId"]);
        assert!(fk.with_delete_cascade);
    }

    #[test]
    fn test_identity_descriptor_is_single_integer_key() {
        let mut env = MetaEdEnvironment::new();
        let grade = env.add_entity(Entity::new(EntityKind::Descriptor, "EdFi", "GradeLevel"));
        env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "GradeLevelPlacement")
                .with_property(EntityProperty::new("PlacementId", PropertyKind::Integer).identity())
                .with_property(EntityProperty::new("GradeLevel", PropertyKind::Descriptor).identity().references(grade)),
        );
        let repo = build(&env);

        let table = repo.table("EdFi", "GradeLevelPlacement").unwrap();
        let descriptor_columns: Vec<_> = table
            .columns
            .iter()
            .filter(|c| c.column_id.starts_with("GradeLevel"))
            .collect();
        assert_eq!(descriptor_columns.len(), 1);
        assert_eq!(descriptor_columns[0].column_id, "GradeLevelDescriptorId");
        assert_eq!(descriptor_columns[0].data_type, ColumnDataType::Integer);
        assert!(descriptor_columns[0].is_part_of_primary_key);

        let lookup = table
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Lookup)
            .unwrap();
        assert_eq!(lookup.foreign_table_id, "GradeLevelDescriptor");
        assert_eq!(lookup.foreign_column_ids(), vec!["GradeLevelDescriptorId"]);

        let mut tables: Vec<&str> = repo.all_tables().map(|t| t.table_id.as_str()).collect();
        tables.sort();
        assert_eq!(tables, vec!["Descriptor", "GradeLevelDescriptor", "GradeLevelPlacement"]);
    }
}

mod invariant_tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        let env = district_environment();
        let first = serde_json::to_string(&build(&env)).unwrap();
        let second = serde_json::to_string(&build(&env)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_foreign_keys_follow_foreign_primary_key_order() {
        let repo = build(&district_environment());
        let mut checked = 0;
        for table in repo.all_tables() {
            for fk in &table.foreign_keys {
                let foreign = repo
                    .table(&fk.foreign_table_namespace, &fk.foreign_table_id)
                    .unwrap();
                assert_eq!(
                    fk.foreign_column_ids(),
                    foreign.primary_key_ids(),
                    "{} -> {}",
                    table.table_id,
                    fk.foreign_table_id
                );
                checked += 1;
            }
        }
        assert!(checked > 5);
        assert!(TableValidator::new().validate(&repo).is_valid());
    }

    #[test]
    fn test_extension_without_columns_emits_no_table() {
        let mut env = MetaEdEnvironment::new();
        let school = school(&mut env);
        env.add_entity(Entity::new(EntityKind::DomainEntityExtension, "Sample", "School").with_base_entity(school));
        let repo = build(&env);

        assert!(repo.table("Sample", "SchoolExtension").is_none());
        assert!(repo.tables_in("Sample").is_empty());
        assert_eq!(repo.table_count(), 1);
    }

    #[test]
    fn test_extension_with_columns_links_to_base() {
        let repo = build(&district_environment());
        let extension = repo.table("Sample", "SchoolExtension").unwrap();
        assert_eq!(extension.primary_key_ids(), vec!["SchoolId"]);
        let fk = &extension.foreign_keys[0];
        assert_eq!(fk.reason, ForeignKeyReason::Extension);
        assert_eq!(fk.foreign_table_schema, "edfi");
        assert!(fk.with_delete_cascade);
    }

    #[test]
    fn test_merge_directive_collapses_shared_column() {
        let repo = build(&district_environment());
        let section = repo.table("EdFi", "Section").unwrap();

        let school_columns = column_ids(section)
            .into_iter()
            .filter(|id| *id == "SchoolId")
            .count();
        assert_eq!(school_columns, 1);

        let session_keys: Vec<_> = section
            .foreign_keys
            .iter()
            .filter(|fk| fk.foreign_table_id == "Session")
            .collect();
        assert_eq!(session_keys.len(), 1);
        assert_eq!(session_keys[0].parent_column_ids(), vec!["SchoolId", "SessionName"]);
        // Session allows key updates, so the reference cascades them
        assert!(session_keys[0].with_update_cascade);
    }

    #[test]
    fn test_nested_inline_commons_flatten_like_manual_inlining() {
        let mut nested = MetaEdEnvironment::new();
        let period = nested.add_entity(
            Entity::new(EntityKind::InlineCommon, "EdFi", "Period")
                .with_property(EntityProperty::new("BeginDate", PropertyKind::Date).identity())
                .with_property(EntityProperty::new("EndDate", PropertyKind::Date).optional()),
        );
        let enrollment = nested.add_entity(
            Entity::new(EntityKind::InlineCommon, "EdFi", "Enrollment")
                .with_property(EntityProperty::new("EntryCode", PropertyKind::string(20)))
                .with_property(EntityProperty::new("Period", PropertyKind::InlineCommon).references(period)),
        );
        nested.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Program")
                .with_property(EntityProperty::new("ProgramId", PropertyKind::Integer).identity())
                .with_property(EntityProperty::new("Enrollment", PropertyKind::InlineCommon).references(enrollment)),
        );

        let mut flat = MetaEdEnvironment::new();
        let enrollment = flat.add_entity(
            Entity::new(EntityKind::InlineCommon, "EdFi", "Enrollment")
                .with_property(EntityProperty::new("EntryCode", PropertyKind::string(20)))
                .with_property(EntityProperty::new("BeginDate", PropertyKind::Date).identity())
                .with_property(EntityProperty::new("EndDate", PropertyKind::Date).optional()),
        );
        flat.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Program")
                .with_property(EntityProperty::new("ProgramId", PropertyKind::Integer).identity())
                .with_property(EntityProperty::new("Enrollment", PropertyKind::InlineCommon).references(enrollment)),
        );

        let shape = |repo: &TableRepository| -> Vec<(String, bool, bool)> {
            repo.table("EdFi", "Program")
                .unwrap()
                .columns
                .iter()
                .map(|c| (c.column_id.clone(), c.is_nullable, c.is_part_of_primary_key))
                .collect()
        };
        assert_eq!(shape(&build(&nested)), shape(&build(&flat)));
    }

    #[test]
    fn test_optional_composites_make_leaf_columns_nullable() {
        let mut env = MetaEdEnvironment::new();
        let school = school(&mut env);
        let contact = env.add_entity(
            Entity::new(EntityKind::InlineCommon, "EdFi", "Contact")
                .with_property(EntityProperty::new("ContactName", PropertyKind::string(60)))
                .with_property(EntityProperty::new("Email", PropertyKind::string(128))),
        );
        let choice = env.add_entity(
            Entity::new(EntityKind::Choice, "EdFi", "Residence")
                .with_property(EntityProperty::new("City", PropertyKind::string(30)).identity())
                .with_property(EntityProperty::new("Country", PropertyKind::string(30))),
        );
        env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Staff")
                .with_property(EntityProperty::new("StaffId", PropertyKind::Integer).identity())
                .with_property(EntityProperty::new("Contact", PropertyKind::InlineCommon).optional().references(contact))
                .with_property(EntityProperty::new("Residence", PropertyKind::Choice).optional().references(choice))
                .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).optional().references(school)),
        );
        let repo = build(&env);

        let staff = repo.table("EdFi", "Staff").unwrap();
        for id in ["ContactName", "Email", "City", "Country", "SchoolId"] {
            let column = staff.column(id).unwrap();
            assert!(column.is_nullable, "{} should be nullable", id);
            assert!(!column.is_part_of_primary_key, "{} should not be a key", id);
        }
        assert_eq!(staff.primary_key_ids(), vec!["StaffId"]);
    }

    #[test]
    fn test_reference_inside_common_resolves_foreign_key() {
        let mut env = MetaEdEnvironment::new();
        let school = school(&mut env);
        let enrollment = env.add_entity(
            Entity::new(EntityKind::Common, "EdFi", "Enrollment")
                .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).identity().references(school))
                .with_property(EntityProperty::new("EntryDate", PropertyKind::Date)),
        );
        env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Learner")
                .with_property(EntityProperty::new("LearnerId", PropertyKind::Integer).identity())
                .with_property(
                    EntityProperty::new("Enrollment", PropertyKind::Common)
                        .optional_collection()
                        .references(enrollment),
                ),
        );
        let repo = build(&env);

        let join = repo.table("EdFi", "LearnerEnrollment").unwrap();
        assert_eq!(join.primary_key_ids(), vec!["LearnerId", "SchoolId"]);
        assert_eq!(join.column("SchoolId").unwrap().property_path, "Enrollment.School.SchoolId");
        assert_eq!(join.column("EntryDate").unwrap().property_path, "Enrollment.EntryDate");

        let to_school = join
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Reference)
            .unwrap();
        assert_eq!(to_school.foreign_table_id, "School");
        assert_eq!(to_school.parent_column_ids(), vec!["SchoolId"]);
    }

    #[test]
    fn test_subclass_table_references_base() {
        let mut env = MetaEdEnvironment::new();
        let base = env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "EducationOrganization")
                .as_abstract()
                .with_property(EntityProperty::new("EducationOrganizationId", PropertyKind::Integer).identity()),
        );
        env.add_entity(
            Entity::new(EntityKind::DomainEntitySubclass, "EdFi", "LocalEducationAgency")
                .with_base_entity(base)
                .with_property(
                    EntityProperty::new("LocalEducationAgencyId", PropertyKind::Integer)
                        .identity_rename("EducationOrganizationId"),
                ),
        );
        let report = run_pipeline(BuildConfig::default(), &env).unwrap();

        let lea = report.repository.table("EdFi", "LocalEducationAgency").unwrap();
        assert_eq!(lea.existence_reason, TableExistenceReason::Subclass);
        assert_eq!(lea.primary_key_ids(), vec!["LocalEducationAgencyId"]);
        let fk = &lea.foreign_keys[0];
        assert_eq!(fk.reason, ForeignKeyReason::Subclass);
        assert_eq!(fk.parent_column_ids(), vec!["LocalEducationAgencyId"]);
        assert_eq!(fk.foreign_column_ids(), vec!["EducationOrganizationId"]);
    }
}

mod collection_reference_tests {
    use super::*;

    fn graduation_plan_environment() -> MetaEdEnvironment {
        let mut env = MetaEdEnvironment::new();
        env.add_entity(Entity::new(EntityKind::SchoolYearEnumeration, "EdFi", "SchoolYear"));
        let plan_type = env.add_entity(Entity::new(EntityKind::Descriptor, "EdFi", "GraduationPlanType"));
        let education_organization = env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "EducationOrganization")
                .with_property(EntityProperty::new("EducationOrganizationId", PropertyKind::Integer).identity()),
        );
        let plan = env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "GraduationPlan")
                .with_property(
                    EntityProperty::new("GraduationPlanType", PropertyKind::Descriptor)
                        .identity()
                        .references(plan_type),
                )
                .with_property(
                    EntityProperty::new("EducationOrganization", PropertyKind::DomainEntity)
                        .identity()
                        .references(education_organization),
                )
                .with_property(EntityProperty::new("SchoolYear", PropertyKind::SchoolYearEnumeration).identity()),
        );
        let school = school(&mut env);
        let student = student(&mut env);
        env.add_entity(
            Entity::new(EntityKind::Association, "EdFi", "StudentSchoolAssociation")
                .with_property(EntityProperty::new("Student", PropertyKind::DomainEntity).identity().references(student))
                .with_property(EntityProperty::new("School", PropertyKind::DomainEntity).identity().references(school))
                .with_property(EntityProperty::new("EntryDate", PropertyKind::Date).identity())
                .with_property(
                    EntityProperty::new("GraduationPlan", PropertyKind::DomainEntity)
                        .with_role_name("Alternative")
                        .optional_collection()
                        .references(plan),
                ),
        );
        env
    }

    #[test]
    fn test_role_named_collection_reference_prefixes_key_columns() {
        let repo = build(&graduation_plan_environment());

        let join = repo
            .table("EdFi", "StudentSchoolAssociationAlternativeGraduationPlan")
            .unwrap();
        assert_eq!(
            column_ids(join),
            vec![
                "EntryDate",
                "SchoolId",
                "StudentUniqueId",
                "AlternativeEducationOrganizationId",
                "AlternativeGraduationPlanTypeDescriptorId",
                "AlternativeSchoolYear",
            ]
        );
        assert!(join.columns.iter().all(|c| c.is_part_of_primary_key));

        let to_parent = join
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Collection)
            .unwrap();
        assert_eq!(to_parent.foreign_table_id, "StudentSchoolAssociation");
        assert_eq!(to_parent.parent_column_ids(), vec!["EntryDate", "SchoolId", "StudentUniqueId"]);
        assert_eq!(to_parent.foreign_column_ids(), vec!["EntryDate", "SchoolId", "StudentUniqueId"]);
        assert!(to_parent.with_delete_cascade);

        let to_plan = join
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Reference)
            .unwrap();
        assert_eq!(to_plan.foreign_table_id, "GraduationPlan");
        assert_eq!(
            to_plan.parent_column_ids(),
            vec![
                "AlternativeEducationOrganizationId",
                "AlternativeGraduationPlanTypeDescriptorId",
                "AlternativeSchoolYear",
            ]
        );
        assert_eq!(
            to_plan.foreign_column_ids(),
            vec!["EducationOrganizationId", "GraduationPlanTypeDescriptorId", "SchoolYear"]
        );
        assert!(!to_plan.with_delete_cascade);
        assert!(TableValidator::new().validate(&repo).is_valid());
    }

    #[test]
    fn test_self_referencing_collection_keeps_both_keys() {
        let mut env = MetaEdEnvironment::new();
        // First entity added, so it receives id 0
        let course = EntityId(0);
        env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "Course")
                .with_property(EntityProperty::new("CourseCode", PropertyKind::string(60)).identity())
                .with_property(
                    EntityProperty::new("Course", PropertyKind::DomainEntity)
                        .with_role_name("Prerequisite")
                        .optional_collection()
                        .references(course),
                ),
        );
        let repo = build(&env);

        let join = repo.table("EdFi", "CoursePrerequisiteCourse").unwrap();
        assert_eq!(join.primary_key_ids(), vec!["CourseCode", "PrerequisiteCourseCode"]);

        let to_prerequisite = join
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Reference)
            .unwrap();
        assert_eq!(to_prerequisite.foreign_table_id, "Course");
        assert_eq!(to_prerequisite.parent_column_ids(), vec!["PrerequisiteCourseCode"]);
        assert_eq!(to_prerequisite.foreign_column_ids(), vec!["CourseCode"]);

        let to_parent = join
            .foreign_keys
            .iter()
            .find(|fk| fk.reason == ForeignKeyReason::Collection)
            .unwrap();
        assert_eq!(to_parent.parent_column_ids(), vec!["CourseCode"]);
    }
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_report_lists_every_stage_and_enhancer() {
        let report = run_pipeline(BuildConfig::default(), &district_environment()).unwrap();
        assert!(report.is_success());

        let stages: Vec<BuildStage> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, BuildStage::all());
        let enhancers: Vec<&str> = report
            .stages
            .iter()
            .flat_map(|s| &s.enhancers)
            .map(|e| e.enhancer.as_str())
            .collect();
        assert_eq!(enhancers.len(), 9);
        assert_eq!(enhancers.first(), Some(&"entity-tables"));
        assert_eq!(enhancers.last(), Some(&"foreign-keys"));
        assert_eq!(
            report.stages.iter().map(|s| s.tables_added()).sum::<usize>(),
            report.table_count()
        );
    }

    #[test]
    fn test_main_stage_only_builds_no_foreign_keys_between_entities() {
        let config = BuildConfig::default().with_stages(vec![BuildStage::MainTables]);
        let report = run_pipeline(config, &district_environment()).unwrap();
        let section = report.repository.table("EdFi", "Section").unwrap();
        assert!(section
            .foreign_keys
            .iter()
            .all(|fk| fk.reason != ForeignKeyReason::Reference));
        assert!(report.repository.table("Sample", "SchoolExtension").is_none());
    }

    #[test]
    fn test_missing_base_entity_names_stage_and_enhancer() {
        let mut env = MetaEdEnvironment::new();
        env.add_entity(Entity::new(EntityKind::DomainEntitySubclass, "EdFi", "Orphan"));
        let err = run_pipeline(BuildConfig::default(), &env).unwrap_err();

        assert_eq!(err.stage_name(), Some("derived-tables"));
        match err {
            PipelineError::StageFailure { enhancer, source, .. } => {
                assert_eq!(enhancer, "subclass-tables");
                assert!(matches!(source, BuildError::MissingBaseEntity { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_from_yaml_drives_legacy_build() {
        let yaml = r#"
targetTechnologyVersion: "3.4.0"
dataStandardVersion: "2.0.0"
coreNamespace: EdFi
"#;
        let config = BuildConfig::from_yaml_str(yaml).unwrap();
        let pipeline = RelationalPipeline::new(config).unwrap();
        assert_eq!(
            pipeline.config().target_technology_version,
            TechnologyVersion::new(3, 4, 0)
        );

        let report = pipeline.run(&district_environment()).unwrap();
        assert!(report.skipped_enhancers().is_empty());
    }
}

mod loading_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MODEL: &str = r#"{
  "entities": [
    {
      "kind": "domainEntity",
      "metaEdName": "School",
      "namespace": "EdFi",
      "properties": [
        { "metaEdName": "SchoolId", "kind": { "type": "integer" }, "isPartOfIdentity": true }
      ]
    },
    {
      "kind": "domainEntity",
      "metaEdName": "Session",
      "namespace": "EdFi",
      "properties": [
        { "metaEdName": "School", "kind": { "type": "domainEntity" }, "isPartOfIdentity": true, "referencedEntity": 0 },
        { "metaEdName": "SessionName", "kind": { "type": "string", "maxLength": 60 }, "isPartOfIdentity": true }
      ]
    }
  ]
}"#;

    #[test]
    fn test_build_from_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.json");
        fs::write(&path, MODEL).unwrap();

        let env = MetaEdEnvironment::from_json_file(&path).unwrap();
        let repo = build(&env);

        let session = repo.table("EdFi", "Session").unwrap();
        assert_eq!(session.primary_key_ids(), vec!["SchoolId", "SessionName"]);
        assert_eq!(session.foreign_keys[0].foreign_table_id, "School");
    }

    #[test]
    fn test_json_with_dangling_link_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.json");
        fs::write(&path, MODEL.replace("\"referencedEntity\": 0", "\"referencedEntity\": 9")).unwrap();

        let err = MetaEdEnvironment::from_json_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("only 2 entities exist"));
    }
}
