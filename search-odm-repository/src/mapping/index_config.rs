//! Index settings and mappings generated from an entity mapping.
//!
//! The generated document is the body of a create-index request:
//!
//! - **settings**: shard and replica counts, optional refresh interval
//! - **mappings.properties**: one entry per store field with its type, storage
//!   flags, analyzer and multi-field variants

use serde_json::{json, Map, Value};

use crate::mapping::{EntityMapping, FieldDescriptor, SubField};

/// Build the create-index body for an entity mapping.
pub fn index_settings(mapping: &EntityMapping) -> Value {
    let mut settings = json!({
        "number_of_shards": mapping.shards(),
        "number_of_replicas": mapping.replicas()
    });
    if let Some(refresh_interval) = mapping.refresh_interval() {
        settings["refresh_interval"] = json!(refresh_interval);
    }

    json!({
        "settings": settings,
        "mappings": mapping_document(mapping)
    })
}

/// Build the `mappings` section for an entity mapping.
pub fn mapping_document(mapping: &EntityMapping) -> Value {
    let properties: Map<String, Value> = mapping
        .fields()
        .iter()
        .map(|field| (field.store_name.clone(), field_mapping(field)))
        .collect();

    json!({ "properties": properties })
}

fn field_mapping(field: &FieldDescriptor) -> Value {
    let mut mapping = Map::new();
    if let Some(field_type) = field.field_type.as_str() {
        mapping.insert("type".to_string(), json!(field_type));
    }
    if field.stored {
        mapping.insert("store".to_string(), json!(true));
    }
    if let Some(doc_values) = field.doc_values {
        mapping.insert("doc_values".to_string(), json!(doc_values));
    }
    if field.fielddata {
        mapping.insert("fielddata".to_string(), json!(true));
    }
    if let Some(analyzer) = &field.analyzer {
        mapping.insert("analyzer".to_string(), json!(analyzer));
    }
    if !field.sub_fields.is_empty() {
        let sub_fields: Map<String, Value> = field
            .sub_fields
            .iter()
            .map(|sub| (sub.suffix.clone(), sub_field_mapping(sub)))
            .collect();
        mapping.insert("fields".to_string(), Value::Object(sub_fields));
    }
    Value::Object(mapping)
}

fn sub_field_mapping(sub: &SubField) -> Value {
    let mut mapping = Map::new();
    if let Some(field_type) = sub.field_type.as_str() {
        mapping.insert("type".to_string(), json!(field_type));
    }
    if sub.stored {
        mapping.insert("store".to_string(), json!(true));
    }
    if sub.fielddata {
        mapping.insert("fielddata".to_string(), json!(true));
    }
    if let Some(analyzer) = &sub.analyzer {
        mapping.insert("analyzer".to_string(), json!(analyzer));
    }
    Value::Object(mapping)
}
