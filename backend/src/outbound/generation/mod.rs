//! Language-model outbound adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `ContentGenerator` port against an OpenAI-compatible Responses API.

mod dto;
mod openai;

pub use openai::{OpenAiConfig, OpenAiContentGenerator};
