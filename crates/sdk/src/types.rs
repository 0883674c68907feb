//! Field metadata types.
//!
//! Entities describe their queryable fields with `#[derive(Searchable)]`,
//! which produces a static list of [`DeclaredField`]s. The engine turns the
//! annotated ones into [`FieldDefinition`]s and registers them per
//! [`EntityType`].

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Closed set of entity kinds that own a field catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Question,
    Session,
}

impl EntityType {
    /// All entity types, in declaration order.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Question => "QUESTION",
            EntityType::Session => "SESSION",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison semantics of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    /// Free text carrying a date; year operators match on substrings.
    DateString,
    Boolean,
}

/// Where the known values of a field come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueSourceType {
    /// Distinct values queried from the store.
    #[default]
    Database,
    /// Member names of a closed enumeration.
    Enum,
}

/// A closed enumeration whose member names can be listed without a store.
///
/// Implemented by `#[derive(ClosedSet)]` on unit-only enums.
pub trait ClosedSet {
    /// Type name, used when serializing a field's enum class.
    const NAME: &'static str;
    /// Member names in declared order.
    const VARIANTS: &'static [&'static str];
}

/// Reference to a [`ClosedSet`], carried by ENUM-sourced fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumClass {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumClass {
    pub const fn of<T: ClosedSet>() -> Self {
        Self {
            name: T::NAME,
            variants: T::VARIANTS,
        }
    }

    /// Member names in declared order.
    pub fn values(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.to_string()).collect()
    }
}

impl Serialize for EnumClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Declarative capability descriptor attached to one entity field.
///
/// `None` for `name`/`display_name` means "derive from the field name".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCapability {
    pub name: Option<&'static str>,
    pub display_name: Option<&'static str>,
    pub field_type: FieldType,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub value_source: ValueSourceType,
    pub enum_class: Option<EnumClass>,
    pub synonyms: &'static [&'static str],
}

impl FieldCapability {
    pub const DEFAULT: Self = Self {
        name: None,
        display_name: None,
        field_type: FieldType::String,
        searchable: true,
        filterable: true,
        sortable: true,
        value_source: ValueSourceType::Database,
        enum_class: None,
        synonyms: &[],
    };
}

impl Default for FieldCapability {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One physical field of an entity, with its descriptor if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredField {
    /// Physical field (column) name.
    pub name: &'static str,
    pub capability: Option<FieldCapability>,
}

/// Types that can list their declared fields.
///
/// Flattened parent structs contribute their fields at the flatten position,
/// so the list is the entity's full field set.
pub trait DeclaresFields {
    fn declared_fields() -> Vec<DeclaredField>;
}

/// A queryable entity: a field source bound to an entity type and a table.
pub trait Searchable: DeclaresFields {
    const ENTITY_TYPE: EntityType;
    const TABLE: &'static str;
}

/// Resolved, typed catalog entry for one queryable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Canonical logical name.
    pub name: String,
    pub display_name: String,
    /// Physical attribute path, passed through to the store adapter.
    pub entity_path: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub entity_type: EntityType,
    pub value_source_type: ValueSourceType,
    pub enum_class: Option<EnumClass>,
    pub synonyms: Vec<String>,
}

impl FieldDefinition {
    /// A STRING field backed by the column of the same name, with every
    /// capability enabled and no synonyms.
    pub fn new(entity_type: EntityType, name: &str) -> Self {
        Self {
            name: name.into(),
            display_name: name.into(),
            entity_path: name.into(),
            field_type: FieldType::String,
            searchable: true,
            filterable: true,
            sortable: true,
            entity_type,
            value_source_type: ValueSourceType::Database,
            enum_class: None,
            synonyms: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn entity_path(mut self, path: &str) -> Self {
        self.entity_path = path.into();
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Source values from a closed enumeration instead of the store.
    pub fn enum_source(mut self, enum_class: EnumClass) -> Self {
        self.value_source_type = ValueSourceType::Enum;
        self.enum_class = Some(enum_class);
        self
    }

    pub fn synonym(mut self, synonym: &str) -> Self {
        self.synonyms.push(synonym.into());
        self
    }
}

/// Known values of one field, for populating filter UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinitionValue {
    pub name: String,
    pub values: Vec<String>,
}

impl FieldDefinitionValue {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

/// One page of results plus a "has more" flag, obtained without counting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice<T> {
    pub results: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub has_next: bool,
}

impl<T> Slice<T> {
    /// Build a slice from rows fetched with a limit of `size + 1`.
    ///
    /// The extra row only signals that a next page exists; it is dropped.
    pub fn from_overfetched(mut rows: Vec<T>, page: u64, size: u64) -> Self {
        let keep = usize::try_from(size).unwrap_or(usize::MAX);
        let has_next = rows.len() > keep;
        if has_next {
            rows.truncate(keep);
        }
        Self {
            results: rows,
            page,
            size,
            has_next,
        }
    }
}
