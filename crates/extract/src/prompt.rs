use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

use crate::schema::{ExampleData, Extraction};

pub const ATTRIBUTE_SUFFIX: &str = "_attributes";

/// Instruction text plus few-shot examples. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    prompt_description: String,
    examples: Vec<ExampleData>,
}

impl ExtractionConfig {
    pub fn new(prompt_description: impl Into<String>, examples: Vec<ExampleData>) -> Self {
        Self {
            prompt_description: prompt_description.into(),
            examples,
        }
    }

    pub fn prompt_description(&self) -> &str {
        &self.prompt_description
    }

    pub fn examples(&self) -> &[ExampleData] {
        &self.examples
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt_description.trim().is_empty() {
            bail!("prompt description is empty");
        }
        if self.examples.is_empty() {
            bail!("at least one example is required");
        }
        for (i, example) in self.examples.iter().enumerate() {
            example
                .validate()
                .with_context(|| format!("invalid example #{}", i + 1))?;
        }
        Ok(())
    }
}

/// Wire format the model is asked to answer in.
fn format_answer(extractions: &[Extraction], fence_output: bool) -> String {
    let items: Vec<Value> = extractions
        .iter()
        .map(|e| {
            let mut item = Map::new();
            item.insert(
                e.extraction_class.clone(),
                Value::String(e.extraction_text.clone()),
            );
            item.insert(
                format!("{}{}", e.extraction_class, ATTRIBUTE_SUFFIX),
                json!(e.attributes),
            );
            Value::Object(item)
        })
        .collect();

    let body = serde_json::to_string_pretty(&json!({ "extractions": items }))
        .unwrap_or_else(|_| String::from("{}"));

    if fence_output {
        format!("```json\n{}\n```", body)
    } else {
        body
    }
}

pub fn build_extraction_prompt(
    config: &ExtractionConfig,
    text: &str,
    fence_output: bool,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(config.prompt_description().trim_end());
    prompt.push_str("\n\nExamples\n");

    for example in config.examples() {
        prompt.push_str(&format!(
            "Q: {}\nA: {}\n\n",
            example.text,
            format_answer(&example.extractions, fence_output)
        ));
    }

    prompt.push_str(&format!("Q: {}\nA: ", text));
    prompt
}
