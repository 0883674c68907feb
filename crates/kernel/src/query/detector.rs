//! Field capability detection.
//!
//! Turns the declared fields of an entity (as produced by
//! `#[derive(Searchable)]`) into [`FieldDefinition`]s.

use sift_sdk::{
    DeclaredField, DeclaresFields, EntityType, FieldCapability, FieldDefinition, Searchable,
    ValueSourceType,
};
use tracing::{debug, info};

/// Detect the queryable fields of a searchable entity.
pub fn detect<E: Searchable>() -> Vec<FieldDefinition> {
    detect_fields::<E>(E::ENTITY_TYPE)
}

/// Detect the queryable fields of any field source, for `entity_type`.
///
/// Fields without a capability descriptor are skipped. Order follows the
/// declaration order, flattened parents included. Duplicates are kept.
pub fn detect_fields<E: DeclaresFields>(entity_type: EntityType) -> Vec<FieldDefinition> {
    let fields: Vec<FieldDefinition> = E::declared_fields()
        .into_iter()
        .filter_map(|declared| definition_for(entity_type, declared))
        .collect();

    info!(%entity_type, count = fields.len(), "detected searchable fields");
    fields
}

fn definition_for(entity_type: EntityType, declared: DeclaredField) -> Option<FieldDefinition> {
    let FieldCapability {
        name,
        display_name,
        field_type,
        searchable,
        filterable,
        sortable,
        value_source,
        enum_class,
        synonyms,
    } = declared.capability?;

    let name = name.map_or_else(|| lower_camel_case(declared.name), str::to_string);
    let display_name = display_name.map_or_else(|| name.clone(), str::to_string);
    let enum_class = match value_source {
        ValueSourceType::Enum => enum_class,
        ValueSourceType::Database => None,
    };

    debug!(
        %entity_type,
        field = %name,
        path = declared.name,
        ?field_type,
        "detected field"
    );

    Some(FieldDefinition {
        name,
        display_name,
        entity_path: declared.name.to_string(),
        field_type,
        searchable,
        filterable,
        sortable,
        entity_type,
        value_source_type: value_source,
        enum_class,
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    })
}

/// `exam_type` -> `examType`.
fn lower_camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = false;

    for c in ident.trim_start_matches('_').chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sift_sdk::{EnumClass, FieldType};

    struct Fixture;

    const KINDS: EnumClass = EnumClass {
        name: "Kind",
        variants: &["A", "B"],
    };

    impl DeclaresFields for Fixture {
        fn declared_fields() -> Vec<DeclaredField> {
            vec![
                DeclaredField {
                    name: "exam_type",
                    capability: Some(FieldCapability {
                        synonyms: &["exam"],
                        ..FieldCapability::DEFAULT
                    }),
                },
                DeclaredField {
                    name: "internal_notes",
                    capability: None,
                },
                DeclaredField {
                    name: "kind",
                    capability: Some(FieldCapability {
                        value_source: ValueSourceType::Enum,
                        enum_class: Some(KINDS),
                        display_name: Some("Kind"),
                        searchable: false,
                        ..FieldCapability::DEFAULT
                    }),
                },
                DeclaredField {
                    name: "held_on",
                    capability: Some(FieldCapability {
                        name: Some("year"),
                        field_type: FieldType::DateString,
                        enum_class: Some(KINDS),
                        ..FieldCapability::DEFAULT
                    }),
                },
            ]
        }
    }

    #[test]
    fn skips_fields_without_capability() {
        let fields = detect_fields::<Fixture>(EntityType::Question);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["examType", "kind", "year"]);
    }

    #[test]
    fn derives_defaults_from_field_name() {
        let fields = detect_fields::<Fixture>(EntityType::Question);
        let exam_type = &fields[0];

        assert_eq!(exam_type.display_name, "examType");
        assert_eq!(exam_type.entity_path, "exam_type");
        assert_eq!(exam_type.field_type, FieldType::String);
        assert_eq!(exam_type.entity_type, EntityType::Question);
        assert_eq!(exam_type.synonyms, vec!["exam"]);
        assert!(exam_type.searchable && exam_type.filterable && exam_type.sortable);
    }

    #[test]
    fn keeps_enum_class_only_for_enum_sources() {
        let fields = detect_fields::<Fixture>(EntityType::Session);

        assert_eq!(fields[1].enum_class, Some(KINDS));
        assert_eq!(fields[1].display_name, "Kind");
        assert!(!fields[1].searchable);

        assert_eq!(fields[2].value_source_type, ValueSourceType::Database);
        assert!(fields[2].enum_class.is_none());
        assert_eq!(fields[2].entity_path, "held_on");
    }

    #[test]
    fn lower_camel_case_conversion() {
        assert_eq!(lower_camel_case("exam_type"), "examType");
        assert_eq!(lower_camel_case("time_spent_seconds"), "timeSpentSeconds");
        assert_eq!(lower_camel_case("topic"), "topic");
        assert_eq!(lower_camel_case("_private_field"), "privateField");
    }
}
