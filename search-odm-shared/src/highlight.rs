//! Highlight requests.

use serde::{Deserialize, Serialize};

/// Per-field highlight settings. Unset options inherit the query-level ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightField {
    pub name: String,
    pub fragment_size: Option<u32>,
    pub number_of_fragments: Option<u32>,
}

impl HighlightField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragment_size: None,
            number_of_fragments: None,
        }
    }

    pub fn with_fragment_size(mut self, fragment_size: u32) -> Self {
        self.fragment_size = Some(fragment_size);
        self
    }

    pub fn with_number_of_fragments(mut self, number_of_fragments: u32) -> Self {
        self.number_of_fragments = Some(number_of_fragments);
        self
    }
}

/// Highlighting requested for a search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightQuery {
    pub fields: Vec<HighlightField>,
    pub pre_tags: Vec<String>,
    pub post_tags: Vec<String>,
    pub fragment_size: Option<u32>,
    pub number_of_fragments: Option<u32>,
}

impl HighlightQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: HighlightField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_tags(mut self, pre_tag: impl Into<String>, post_tag: impl Into<String>) -> Self {
        self.pre_tags = vec![pre_tag.into()];
        self.post_tags = vec![post_tag.into()];
        self
    }

    pub fn with_fragment_size(mut self, fragment_size: u32) -> Self {
        self.fragment_size = Some(fragment_size);
        self
    }

    pub fn with_number_of_fragments(mut self, number_of_fragments: u32) -> Self {
        self.number_of_fragments = Some(number_of_fragments);
        self
    }
}
