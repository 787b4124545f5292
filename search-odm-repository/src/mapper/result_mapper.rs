//! Result mapping.
//!
//! Converts raw store responses into typed hits. Every hit goes through the
//! entity mapping: store names are renamed back to logical names, the id is
//! taken from the source or the hit metadata, and the version field is filled
//! from `_version` when the source does not carry it.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use search_odm_shared::{Aggregations, PageCursor, SearchHit, SearchHits, TotalHitsRelation};

use crate::config::IncompleteHitPolicy;
use crate::errors::OdmError;
use crate::mapper::response::{RawGetResponse, RawHit, RawSearchResponse};
use crate::mapping::{Document, DocumentConverter, EntityMapping};

/// What the mapper needs to know about the request a page answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Hits requested; a page with this many hits may have a successor.
    pub page_size: u32,
    /// Keep-alive of the scroll context, when the page belongs to a scroll.
    pub scroll_time: Option<Duration>,
    /// The query caps its result count; such a result is a single page.
    pub limiting: bool,
}

/// Maps store responses for one entity type.
pub struct ResultMapper<'a> {
    mapping: &'a EntityMapping,
    policy: IncompleteHitPolicy,
}

impl<'a> ResultMapper<'a> {
    pub fn new(mapping: &'a EntityMapping, policy: IncompleteHitPolicy) -> Self {
        Self { mapping, policy }
    }

    /// Map a search or scroll response into a page of typed hits.
    ///
    /// A hit without an id either fails the page or is skipped, depending on
    /// the [`IncompleteHitPolicy`].
    pub fn map_search<T: DeserializeOwned>(
        &self,
        raw: RawSearchResponse,
        page: PageRequest,
    ) -> Result<SearchHits<T>, OdmError> {
        let (total_hits, relation) = match &raw.hits.total {
            Some(total) => (total.value(), total.relation()),
            None => (0, TotalHitsRelation::Off),
        };
        let returned = raw.hits.hits.len();
        let last_sort_values = raw.hits.hits.last().map(|hit| hit.sort.clone());

        let mut hits = Vec::with_capacity(returned);
        let mut skipped_hits = 0;
        for raw_hit in raw.hits.hits {
            match self.map_hit(raw_hit) {
                Ok(hit) => hits.push(hit),
                Err(err @ OdmError::IncompleteResultError(_))
                    if self.policy == IncompleteHitPolicy::Skip =>
                {
                    debug!(entity = self.mapping.entity(), error = %err, "Skipping incomplete hit");
                    skipped_hits += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let cursor = match (page.scroll_time, raw.scroll_id) {
            _ if page.limiting => None,
            (Some(keep_alive), Some(scroll_id)) if returned > 0 => Some(PageCursor::Scroll {
                scroll_id,
                keep_alive,
            }),
            (Some(_), _) => None,
            (None, _) => last_sort_values
                .filter(|values| !values.is_empty())
                .filter(|_| page.page_size > 0 && returned == page.page_size as usize)
                .map(PageCursor::SearchAfter),
        };

        debug!(
            entity = self.mapping.entity(),
            returned,
            skipped_hits,
            total_hits,
            has_cursor = cursor.is_some(),
            "Mapped search response"
        );

        Ok(SearchHits::new(
            total_hits,
            relation,
            raw.hits.max_score,
            hits,
            raw.aggregations.map(Aggregations::new),
        )
        .with_cursor(cursor)
        .with_skipped_hits(skipped_hits))
    }

    /// Map a get response. A document that was not found maps to `None`.
    pub fn map_document<T: DeserializeOwned>(
        &self,
        raw: RawGetResponse,
    ) -> Result<Option<T>, OdmError> {
        if !raw.found {
            return Ok(None);
        }
        let source = raw.source.ok_or_else(|| {
            OdmError::incomplete_result(format!(
                "document '{}' of {} was returned without _source",
                raw.id,
                self.mapping.entity()
            ))
        })?;

        let document = self.complete(source, Some(&raw.id), raw.version)?;
        DocumentConverter::new(self.mapping).to_entity(document).map(Some)
    }

    fn map_hit<T: DeserializeOwned>(&self, hit: RawHit) -> Result<SearchHit<T>, OdmError> {
        let source = match hit.source {
            Some(source) => source,
            None => unwrap_fields(hit.fields.unwrap_or_default()),
        };

        let document = self.complete(source, hit.id.as_deref(), hit.version)?;
        let converter = DocumentConverter::new(self.mapping);
        let id = converter.id(&document).ok_or_else(|| {
            OdmError::incomplete_result(format!("hit of {} has no id", self.mapping.entity()))
        })?;
        let content = converter.to_entity(document)?;

        Ok(SearchHit::new(
            hit.index,
            id,
            hit.score,
            hit.sort,
            hit.routing,
            hit.highlight,
            content,
        ))
    }

    /// Fill the id and version fields from hit metadata where the source lacks them.
    fn complete(
        &self,
        mut document: Document,
        meta_id: Option<&str>,
        meta_version: Option<i64>,
    ) -> Result<Document, OdmError> {
        let converter = DocumentConverter::new(self.mapping);

        if converter.id(&document).is_none() {
            let id = meta_id.ok_or_else(|| {
                OdmError::incomplete_result(format!(
                    "hit of {} has neither a source id nor _id",
                    self.mapping.entity()
                ))
            })?;
            converter.set_id(&mut document, id);
        }
        if let Some(version) = meta_version {
            if converter.version(&document).is_none() {
                converter.set_version(&mut document, version);
            }
        }
        Ok(document)
    }
}

/// Projected `fields` come back as arrays; single values are unwrapped.
fn unwrap_fields(fields: Map<String, Value>) -> Document {
    fields
        .into_iter()
        .map(|(name, value)| match value {
            Value::Array(mut values) if values.len() == 1 => (name, values.remove(0)),
            other => (name, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDescriptor, FieldType, MappingBuilder};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SampleEntity {
        id: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<String>,
        version: Option<i64>,
    }

    fn mapping() -> EntityMapping {
        MappingBuilder::new("SampleEntity", "test-index-sample")
            .id_field(FieldDescriptor::new("id", FieldType::Keyword))
            .field(FieldDescriptor::new("type", FieldType::Keyword))
            .field(
                FieldDescriptor::new("message", FieldType::Text)
                    .with_store_name("msg")
                    .stored()
                    .fielddata(),
            )
            .version_field(FieldDescriptor::new("version", FieldType::Long))
            .build()
            .unwrap()
    }

    fn response(body: Value) -> RawSearchResponse {
        serde_json::from_value(body).unwrap()
    }

    fn page(page_size: u32) -> PageRequest {
        PageRequest {
            page_size,
            scroll_time: None,
            limiting: false,
        }
    }

    #[test]
    fn test_save_then_search_round_trip() {
        let mapping = mapping();
        let entity = SampleEntity {
            id: Some("1".to_string()),
            kind: Some("a".to_string()),
            message: Some("hello".to_string()),
            version: None,
        };
        let stored = DocumentConverter::new(&mapping).to_store_document(&entity).unwrap();

        let raw = response(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "max_score": 1.0,
                "hits": [{
                    "_index": "test-index-sample", "_id": "1", "_score": 1.0, "_source": stored
                }]
            }
        }));

        let hits: SearchHits<SampleEntity> = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search(raw, page(10))
            .unwrap();

        assert_eq!(hits.total_hits(), 1);
        assert_eq!(hits.search_hits()[0].id(), "1");
        assert_eq!(hits.search_hits()[0].content(), &entity);
    }

    #[test]
    fn test_id_and_version_from_metadata() {
        let mapping = mapping();
        let raw = response(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{
                    "_index": "test-index-sample",
                    "_id": "generated",
                    "_version": 4,
                    "_source": { "msg": "hello", "unknown": 1 }
                }]
            }
        }));

        let hits: SearchHits<SampleEntity> = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search(raw, page(10))
            .unwrap();
        let content = hits.search_hits()[0].content();

        assert_eq!(content.id.as_deref(), Some("generated"));
        assert_eq!(content.version, Some(4));
        assert_eq!(content.message.as_deref(), Some("hello"));
    }

    #[test]
    fn test_missing_id_aborts_or_skips() {
        let mapping = mapping();
        let body = json!({
            "hits": {
                "total": { "value": 2, "relation": "eq" },
                "hits": [
                    { "_index": "test-index-sample", "_id": "1", "_source": { "msg": "kept" } },
                    { "_index": "test-index-sample", "_source": { "msg": "no id" } }
                ]
            }
        });

        let aborted = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search::<SampleEntity>(response(body.clone()), page(10));
        assert!(matches!(aborted, Err(OdmError::IncompleteResultError(_))));

        let skipped = ResultMapper::new(&mapping, IncompleteHitPolicy::Skip)
            .map_search::<SampleEntity>(response(body), page(10))
            .unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped.skipped_hits(), 1);
    }

    #[test]
    fn test_highlight_sort_and_routing_attached() {
        let mapping = mapping();
        let raw = response(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{
                    "_index": "test-index-sample",
                    "_id": "1",
                    "_routing": "id2",
                    "_source": { "id": "1", "msg": "hello world" },
                    "highlight": { "msg": ["<em>hello</em> world"] },
                    "sort": ["hello", 7]
                }]
            }
        }));

        let hits: SearchHits<SampleEntity> = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search(raw, page(10))
            .unwrap();
        let hit = &hits.search_hits()[0];

        assert_eq!(hit.routing(), Some("id2"));
        assert_eq!(hit.highlight_field("msg"), ["<em>hello</em> world".to_string()]);
        assert_eq!(hit.sort_values(), &[json!("hello"), json!(7)]);
    }

    #[test]
    fn test_fields_used_without_source() {
        let mapping = mapping();
        let raw = response(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{
                    "_index": "test-index-sample", "_id": "1", "fields": { "msg": ["projected"] }
                }]
            }
        }));

        let hits: SearchHits<SampleEntity> = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search(raw, page(10))
            .unwrap();

        assert_eq!(hits.search_hits()[0].content().message.as_deref(), Some("projected"));
    }

    #[test]
    fn test_search_after_cursor_only_on_full_page() {
        let mapping = mapping();
        let body = json!({
            "hits": {
                "total": { "value": 5, "relation": "eq" },
                "hits": [
                    { "_index": "i", "_id": "1", "_source": {}, "sort": [1] },
                    { "_index": "i", "_id": "2", "_source": {}, "sort": [2] }
                ]
            }
        });
        let mapper = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort);

        let full = mapper.map_search::<SampleEntity>(response(body.clone()), page(2)).unwrap();
        assert_eq!(full.cursor(), Some(&PageCursor::SearchAfter(vec![json!(2)])));

        let partial = mapper.map_search::<SampleEntity>(response(body), page(3)).unwrap();
        assert!(partial.cursor().is_none());
    }

    #[test]
    fn test_limiting_page_has_no_cursor() {
        let mapping = mapping();
        let mapper = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort);
        let body = json!({
            "_scroll_id": "scroll-1",
            "hits": {
                "hits": [
                    { "_index": "i", "_id": "1", "_source": {}, "sort": [1] },
                    { "_index": "i", "_id": "2", "_source": {}, "sort": [2] }
                ]
            }
        });

        let capped = PageRequest {
            limiting: true,
            ..page(2)
        };
        let hits = mapper.map_search::<SampleEntity>(response(body.clone()), capped).unwrap();
        assert_eq!(hits.search_hits().len(), 2);
        assert!(hits.cursor().is_none());

        let capped_scroll = PageRequest {
            scroll_time: Some(Duration::from_secs(60)),
            ..capped
        };
        let hits = mapper.map_search::<SampleEntity>(response(body), capped_scroll).unwrap();
        assert!(hits.cursor().is_none());
    }

    #[test]
    fn test_scroll_cursor_requires_hits() {
        let mapping = mapping();
        let mapper = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort);
        let scroll = PageRequest {
            page_size: 10,
            scroll_time: Some(Duration::from_secs(60)),
            limiting: false,
        };

        let with_hits = mapper
            .map_search::<SampleEntity>(
                response(json!({
                    "_scroll_id": "scroll-1",
                    "hits": { "hits": [{ "_index": "i", "_id": "1", "_source": {} }] }
                })),
                scroll,
            )
            .unwrap();
        assert_eq!(
            with_hits.cursor(),
            Some(&PageCursor::Scroll {
                scroll_id: "scroll-1".to_string(),
                keep_alive: Duration::from_secs(60)
            })
        );
        assert_eq!(with_hits.total_hits_relation(), TotalHitsRelation::Off);

        let exhausted = mapper
            .map_search::<SampleEntity>(
                response(json!({ "_scroll_id": "scroll-1", "hits": { "hits": [] } })),
                scroll,
            )
            .unwrap();
        assert!(exhausted.cursor().is_none());
    }

    #[test]
    fn test_aggregations_surface_as_map() {
        let mapping = mapping();
        let raw = response(json!({
            "hits": { "total": { "value": 3, "relation": "eq" }, "hits": [] },
            "aggregations": { "subjects": { "buckets": [{ "key": "a", "doc_count": 2 }] } }
        }));

        let hits = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort)
            .map_search::<SampleEntity>(raw, page(0))
            .unwrap();

        assert!(!hits.has_search_hits());
        let aggregations = hits.aggregations().unwrap();
        assert_eq!(aggregations.get("subjects").unwrap()["buckets"][0]["doc_count"], 2);
    }

    #[test]
    fn test_map_document() {
        let mapping = mapping();
        let mapper = ResultMapper::new(&mapping, IncompleteHitPolicy::Abort);

        let found: RawGetResponse = serde_json::from_value(json!({
            "_id": "7", "found": true, "_version": 2, "_source": { "msg": "hi" }
        }))
        .unwrap();
        let entity: SampleEntity = mapper.map_document(found).unwrap().unwrap();
        assert_eq!(entity.id.as_deref(), Some("7"));
        assert_eq!(entity.version, Some(2));

        let missing: RawGetResponse =
            serde_json::from_value(json!({ "_id": "8", "found": false })).unwrap();
        assert!(mapper.map_document::<SampleEntity>(missing).unwrap().is_none());
    }
}
