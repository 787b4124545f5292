//! Conversion between entities and store documents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::OdmError;
use crate::mapping::{EntityMapping, FieldType};

/// A JSON document keyed by field names (logical or store, depending on side).
pub type Document = Map<String, Value>;

/// Renames fields between the logical (entity) side and the store side.
///
/// Entities are encoded with their `serde` implementations into JSON
/// documents; the repository's `Serializer` only turns those into bytes.
pub struct DocumentConverter<'a> {
    mapping: &'a EntityMapping,
}

impl<'a> DocumentConverter<'a> {
    pub fn new(mapping: &'a EntityMapping) -> Self {
        Self { mapping }
    }

    /// Serialize an entity into a store document.
    ///
    /// Null values are not written. A serialized field that the mapping does not
    /// declare is rejected.
    pub fn to_store_document<T: Serialize>(&self, entity: &T) -> Result<Document, OdmError> {
        let value = serde_json::to_value(entity).map_err(|e| {
            OdmError::serialization(format!("cannot serialize {}: {}", self.mapping.entity(), e))
        })?;
        let Value::Object(logical) = value else {
            return Err(OdmError::mapping(
                self.mapping.entity(),
                "entity must serialize to a JSON object",
            ));
        };

        let mut store = Document::new();
        for (name, value) in logical {
            if value.is_null() {
                continue;
            }
            let field = self
                .mapping
                .field(&name)
                .ok_or_else(|| OdmError::unknown_field(self.mapping.entity(), &name))?;
            store.insert(field.store_name.clone(), value);
        }
        Ok(store)
    }

    /// Rename store fields to logical names. Fields the mapping does not know
    /// are dropped.
    pub fn to_logical_document(&self, store: Document) -> Document {
        store
            .into_iter()
            .filter_map(|(store_name, value)| {
                self.mapping
                    .field_by_store_name(&store_name)
                    .map(|field| (field.name.clone(), value))
            })
            .collect()
    }

    /// Deserialize a store document into the entity type.
    pub fn to_entity<T: DeserializeOwned>(&self, store: Document) -> Result<T, OdmError> {
        let logical = self.to_logical_document(store);
        serde_json::from_value(Value::Object(logical)).map_err(|e| {
            OdmError::serialization(format!("cannot deserialize {}: {}", self.mapping.entity(), e))
        })
    }

    /// The id stored in the document, rendered as a string.
    pub fn id(&self, store: &Document) -> Option<String> {
        match store.get(&self.mapping.id_field().store_name)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn set_id(&self, store: &mut Document, id: &str) {
        let field = self.mapping.id_field();
        let value = match field.field_type {
            FieldType::Integer | FieldType::Long => id
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::from(id)),
            _ => Value::from(id),
        };
        store.insert(field.store_name.clone(), value);
    }

    /// The version stored in the document, if the mapping has a version field.
    pub fn version(&self, store: &Document) -> Option<i64> {
        let field = self.mapping.version_field()?;
        store.get(&field.store_name)?.as_i64()
    }

    /// Write the version; no-op without a version field.
    pub fn set_version(&self, store: &mut Document, version: i64) {
        if let Some(field) = self.mapping.version_field() {
            store.insert(field.store_name.clone(), Value::from(version));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDescriptor, MappingBuilder};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Article {
        id: Option<String>,
        title: Option<String>,
        version: Option<i64>,
    }

    fn mapping() -> EntityMapping {
        MappingBuilder::new("Article", "articles")
            .id_field(FieldDescriptor::new("id", FieldType::Keyword))
            .field(FieldDescriptor::new("title", FieldType::Text).with_store_name("article_title"))
            .version_field(FieldDescriptor::new("version", FieldType::Long))
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_store_document_renames_and_skips_nulls() {
        let mapping = mapping();
        let converter = DocumentConverter::new(&mapping);
        let article = Article {
            id: Some("1".to_string()),
            title: Some("hello".to_string()),
            version: None,
        };

        let store = converter.to_store_document(&article).unwrap();

        assert_eq!(Value::Object(store), json!({"id": "1", "article_title": "hello"}));
    }

    #[test]
    fn test_undeclared_field_is_rejected() {
        #[derive(Serialize)]
        struct Extra {
            id: String,
            unexpected: u32,
        }

        let mapping = mapping();
        let converter = DocumentConverter::new(&mapping);
        let result = converter.to_store_document(&Extra {
            id: "1".to_string(),
            unexpected: 3,
        });

        assert!(matches!(
            result,
            Err(OdmError::UnknownFieldError { field, .. }) if field == "unexpected"
        ));
    }

    #[test]
    fn test_to_entity_ignores_unmapped_store_fields() {
        let mapping = mapping();
        let converter = DocumentConverter::new(&mapping);
        let store = json!({"id": "1", "article_title": "hello", "added_later": true})
            .as_object()
            .cloned()
            .unwrap();

        let article: Article = converter.to_entity(store).unwrap();

        assert_eq!(
            article,
            Article {
                id: Some("1".to_string()),
                title: Some("hello".to_string()),
                version: None
            }
        );
    }

    #[test]
    fn test_id_and_version_accessors() {
        let mapping = mapping();
        let converter = DocumentConverter::new(&mapping);
        let mut store = Document::new();

        assert!(converter.id(&store).is_none());
        converter.set_id(&mut store, "42");
        converter.set_version(&mut store, 3);

        assert_eq!(converter.id(&store), Some("42".to_string()));
        assert_eq!(converter.version(&store), Some(3));
    }

    #[test]
    fn test_non_object_entity_is_mapping_error() {
        let mapping = mapping();
        let converter = DocumentConverter::new(&mapping);

        assert!(matches!(
            converter.to_store_document(&"just a string"),
            Err(OdmError::MappingError { .. })
        ));
    }
}
