use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::align::locate;

/// A labeled span of source text with free-form attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub extraction_class: String,
    pub extraction_text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_interval: Option<CharInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_status: Option<AlignmentStatus>,
}

impl Extraction {
    pub fn new<I, K, V>(class: &str, text: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            extraction_class: class.to_string(),
            extraction_text: text.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            char_interval: None,
            alignment_status: None,
        }
    }
}

/// Character offsets into the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharInterval {
    pub start_pos: usize,
    pub end_pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    MatchExact,
    MatchFuzzy,
}

/// A few-shot example: sample text plus the spans expected from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleData {
    pub text: String,
    pub extractions: Vec<Extraction>,
}

impl ExampleData {
    pub fn new(text: &str, extractions: Vec<Extraction>) -> Self {
        Self {
            text: text.to_string(),
            extractions,
        }
    }

    /// Spans must be verbatim, listed in order of appearance, and must not overlap.
    pub fn validate(&self) -> Result<()> {
        let mut cursor = 0;

        for extraction in &self.extractions {
            let needle = &extraction.extraction_text;
            if needle.is_empty() {
                bail!(
                    "empty extraction_text for class '{}'",
                    extraction.extraction_class
                );
            }

            match locate(&self.text, needle, cursor) {
                Some((_, end)) => cursor = end,
                None if self.text.contains(needle.as_str()) => bail!(
                    "extraction '{}' overlaps or precedes the previous span",
                    needle
                ),
                None => bail!("extraction '{}' does not appear verbatim in example text", needle),
            }
        }

        Ok(())
    }
}
