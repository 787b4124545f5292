//! Entity mappings and the registry caching them.

mod descriptor;
mod document;
mod index_config;
mod registry;

pub use descriptor::{EntityMapping, FieldDescriptor, FieldType, MappingBuilder, SubField};
pub use document::{Document, DocumentConverter};
pub use index_config::{index_settings, mapping_document};
pub use registry::{Entity, MappingRegistry};
