//! Wire types for the Responses API.

use serde::{Deserialize, Serialize};

/// Request body: a single text prompt for one model.
#[derive(Debug, Serialize)]
pub(super) struct ResponsesRequestDto<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponsesResponseDto {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItemDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OutputItemDto {
    #[serde(default)]
    pub content: Vec<ContentPartDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentPartDto {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponsesResponseDto {
    /// First text part in the output, skipping reasoning and tool items.
    pub fn first_text(self) -> Option<String> {
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind.as_deref().is_none_or(|kind| kind == "output_text"))
            .find_map(|part| part.text)
    }
}
