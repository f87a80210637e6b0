use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::prompt::ATTRIBUTE_SUFFIX;
use crate::schema::Extraction;

const INDEX_SUFFIX: &str = "_index";

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").expect("fence pattern is valid")
});

/// Take the body of the first Markdown code fence, or the whole text if there is none.
fn strip_fence(raw: &str) -> &str {
    FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw, |m| m.as_str())
        .trim()
}

fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(attribute_value)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

fn parse_attributes(value: Option<&Value>) -> Result<BTreeMap<String, String>> {
    match value {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .filter_map(|(k, v)| attribute_value(v).map(|v| (k.clone(), v)))
            .collect()),
        Some(other) => bail!("attributes must be an object, got {}", other),
    }
}

/// `<class>_attributes` and `<class>_index` are metadata only when `<class>` is also present.
fn is_metadata_key(item: &Map<String, Value>, key: &str) -> bool {
    [ATTRIBUTE_SUFFIX, INDEX_SUFFIX].iter().any(|suffix| {
        key.strip_suffix(suffix)
            .is_some_and(|class| !class.is_empty() && item.contains_key(class))
    })
}

fn parse_item(item: &Map<String, Value>, out: &mut Vec<Extraction>) -> Result<()> {
    for (key, value) in item {
        if is_metadata_key(item, key) {
            continue;
        }

        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => bail!("extraction '{}' has non-text value {}", key, other),
        };

        let attributes = parse_attributes(item.get(&format!("{}{}", key, ATTRIBUTE_SUFFIX)))
            .with_context(|| format!("invalid attributes for '{}'", key))?;

        out.push(Extraction {
            extraction_class: key.clone(),
            extraction_text: text,
            attributes,
            char_interval: None,
            alignment_status: None,
        });
    }
    Ok(())
}

/// Parse a model answer shaped like
/// `{"extractions": [{"<class>": "<text>", "<class>_attributes": {...}}]}`.
pub fn parse_extractions(raw: &str) -> Result<Vec<Extraction>> {
    let body = strip_fence(raw);
    let value: Value =
        serde_json::from_str(body).context("Model output is not valid JSON")?;

    let items = match value {
        Value::Object(mut map) => match map.remove("extractions") {
            Some(Value::Array(items)) => items,
            Some(other) => bail!("'extractions' must be an array, got {}", other),
            None => bail!("Model output has no 'extractions' key"),
        },
        Value::Array(items) => items,
        other => bail!("Unexpected model output: {}", other),
    };

    let mut extractions = Vec::with_capacity(items.len());
    for item in &items {
        match item {
            Value::Object(map) => parse_item(map, &mut extractions)?,
            other => bail!("extraction entry must be an object, got {}", other),
        }
    }

    Ok(extractions)
}
