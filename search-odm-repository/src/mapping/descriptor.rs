//! Entity mapping descriptors.
//!
//! An [`EntityMapping`] is the translation table between an entity's logical
//! field names and the field names and types stored in the index. Mappings are
//! built explicitly with a [`MappingBuilder`] and validated once, when the
//! registry first resolves the entity type.

use std::collections::{HashMap, HashSet};

use crate::errors::OdmError;

/// Store-side fields that are never part of an entity mapping.
const META_FIELDS: &[&str] = &["_id", "_score", "_doc", "_index", "_routing", "_seq_no"];

/// Store field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Left to dynamic mapping; no type is declared in the index.
    Auto,
    Text,
    Keyword,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    GeoPoint,
    Nested,
    Object,
}

impl FieldType {
    /// The type name in the index mapping, `None` for [`FieldType::Auto`].
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            FieldType::Auto => None,
            FieldType::Text => Some("text"),
            FieldType::Keyword => Some("keyword"),
            FieldType::Integer => Some("integer"),
            FieldType::Long => Some("long"),
            FieldType::Float => Some("float"),
            FieldType::Double => Some("double"),
            FieldType::Boolean => Some("boolean"),
            FieldType::Date => Some("date"),
            FieldType::GeoPoint => Some("geo_point"),
            FieldType::Nested => Some("nested"),
            FieldType::Object => Some("object"),
        }
    }

    /// Whether arbitrary sub-paths below a field of this type are valid.
    pub fn has_properties(&self) -> bool {
        matches!(self, FieldType::Nested | FieldType::Object)
    }
}

/// A multi-field variant, indexed as `<field>.<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubField {
    pub suffix: String,
    pub field_type: FieldType,
    pub analyzer: Option<String>,
    pub stored: bool,
    pub fielddata: bool,
}

impl SubField {
    pub fn new(suffix: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            suffix: suffix.into(),
            field_type,
            analyzer: None,
            stored: false,
            fielddata: false,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    pub fn fielddata(mut self) -> Self {
        self.fielddata = true;
        self
    }
}

/// Mapping of one logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name on the entity side (the serde name).
    pub name: String,
    /// Field name in the stored document.
    pub store_name: String,
    pub field_type: FieldType,
    pub sub_fields: Vec<SubField>,
    pub stored: bool,
    /// `None` keeps the store default.
    pub doc_values: Option<bool>,
    pub fielddata: bool,
    pub analyzer: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            store_name: name.clone(),
            name,
            field_type,
            sub_fields: Vec::new(),
            stored: false,
            doc_values: None,
            fielddata: false,
            analyzer: None,
        }
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = store_name.into();
        self
    }

    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    pub fn with_doc_values(mut self, doc_values: bool) -> Self {
        self.doc_values = Some(doc_values);
        self
    }

    pub fn fielddata(mut self) -> Self {
        self.fielddata = true;
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn sub_field(mut self, sub_field: SubField) -> Self {
        self.sub_fields.push(sub_field);
        self
    }

    pub fn has_sub_field(&self, suffix: &str) -> bool {
        self.sub_fields.iter().any(|sub| sub.suffix == suffix)
    }
}

/// Validated mapping of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMapping {
    entity: String,
    index_name: String,
    shards: u32,
    replicas: u32,
    refresh_interval: Option<String>,
    fields: Vec<FieldDescriptor>,
    id: usize,
    version: Option<usize>,
    routing: Option<usize>,
    by_name: HashMap<String, usize>,
    by_store_name: HashMap<String, usize>,
}

impl EntityMapping {
    /// Name of the entity type, used in error messages.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn shards(&self) -> u32 {
        self.shards
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    pub fn refresh_interval(&self) -> Option<&str> {
        self.refresh_interval.as_deref()
    }

    /// All fields in declaration order, id and version fields included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn id_field(&self) -> &FieldDescriptor {
        &self.fields[self.id]
    }

    pub fn version_field(&self) -> Option<&FieldDescriptor> {
        self.version.map(|idx| &self.fields[idx])
    }

    pub fn routing_field(&self) -> Option<&FieldDescriptor> {
        self.routing.map(|idx| &self.fields[idx])
    }

    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|idx| &self.fields[*idx])
    }

    /// Look up a field by store name.
    pub fn field_by_store_name(&self, store_name: &str) -> Option<&FieldDescriptor> {
        self.by_store_name.get(store_name).map(|idx| &self.fields[*idx])
    }

    /// Translate a logical field path to its store path.
    ///
    /// Accepts plain logical names, `field.suffix` for declared sub-fields,
    /// any path below a nested or object field, and store meta fields.
    pub fn store_path(&self, path: &str) -> Result<String, OdmError> {
        if META_FIELDS.contains(&path) {
            return Ok(path.to_string());
        }
        if let Some(field) = self.field(path) {
            return Ok(field.store_name.clone());
        }

        for (idx, _) in path.match_indices('.') {
            let (head, rest) = (&path[..idx], &path[idx + 1..]);
            if let Some(field) = self.field(head) {
                if field.has_sub_field(rest) || field.field_type.has_properties() {
                    return Ok(format!("{}.{}", field.store_name, rest));
                }
                break;
            }
        }

        Err(OdmError::unknown_field(&self.entity, path))
    }

    /// Like [`store_path`](Self::store_path), but wildcard patterns are passed
    /// through unchanged.
    pub fn store_pattern(&self, pattern: &str) -> Result<String, OdmError> {
        if pattern.contains('*') {
            Ok(pattern.to_string())
        } else {
            self.store_path(pattern)
        }
    }
}

/// Builder for an [`EntityMapping`]. Nothing is checked until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    entity: String,
    index_name: String,
    shards: u32,
    replicas: u32,
    refresh_interval: Option<String>,
    fields: Vec<FieldDescriptor>,
    id_fields: Vec<String>,
    version_fields: Vec<String>,
    routing_fields: Vec<String>,
}

impl MappingBuilder {
    pub fn new(entity: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            index_name: index_name.into(),
            shards: 1,
            replicas: 1,
            refresh_interval: None,
            fields: Vec::new(),
            id_fields: Vec::new(),
            version_fields: Vec::new(),
            routing_fields: Vec::new(),
        }
    }

    pub fn shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn refresh_interval(mut self, refresh_interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(refresh_interval.into());
        self
    }

    /// Declare the id field.
    pub fn id_field(mut self, field: FieldDescriptor) -> Self {
        self.id_fields.push(field.name.clone());
        self.fields.push(field);
        self
    }

    /// Declare the version field used for optimistic concurrency.
    pub fn version_field(mut self, field: FieldDescriptor) -> Self {
        self.version_fields.push(field.name.clone());
        self.fields.push(field);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Route documents by the value of an already declared field.
    pub fn routing_field(mut self, name: impl Into<String>) -> Self {
        self.routing_fields.push(name.into());
        self
    }

    /// Validate and build the mapping.
    pub fn build(self) -> Result<EntityMapping, OdmError> {
        let entity = self.entity;
        let fail = |reason: String| OdmError::mapping(&entity, reason);

        if self.shards == 0 {
            return Err(fail("index must have at least one shard".to_string()));
        }

        let mut by_name = HashMap::new();
        let mut by_store_name = HashMap::new();
        for (idx, field) in self.fields.iter().enumerate() {
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(fail(format!("duplicate field '{}'", field.name)));
            }
            if by_store_name.insert(field.store_name.clone(), idx).is_some() {
                return Err(fail(format!("duplicate store name '{}'", field.store_name)));
            }
            let mut suffixes = HashSet::new();
            for sub in &field.sub_fields {
                if !suffixes.insert(sub.suffix.as_str()) {
                    return Err(fail(format!(
                        "duplicate sub-field suffix '{}' on '{}'",
                        sub.suffix, field.name
                    )));
                }
            }
        }

        let id = match self.id_fields.as_slice() {
            [] => return Err(fail("no id field declared".to_string())),
            [name] => by_name[name],
            names => return Err(fail(format!("multiple id fields declared: {}", names.join(", ")))),
        };

        let version = match self.version_fields.as_slice() {
            [] => None,
            [name] => Some(by_name[name]),
            names => {
                return Err(fail(format!(
                    "multiple version fields declared: {}",
                    names.join(", ")
                )))
            }
        };

        let routing = match self.routing_fields.as_slice() {
            [] => None,
            [name] => match by_name.get(name) {
                Some(idx) => Some(*idx),
                None => return Err(fail(format!("routing field '{}' is not declared", name))),
            },
            names => {
                return Err(fail(format!(
                    "multiple routing fields declared: {}",
                    names.join(", ")
                )))
            }
        };

        Ok(EntityMapping {
            entity,
            index_name: self.index_name,
            shards: self.shards,
            replicas: self.replicas,
            refresh_interval: self.refresh_interval,
            fields: self.fields,
            id,
            version,
            routing,
            by_name,
            by_store_name,
        })
    }
}
