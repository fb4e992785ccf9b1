//! User-facing operations: summarize, optimize a transcript, ask a document
//!
//! Summarization runs the full fallback chain. Transcript optimization and
//! document Q&A go to the router's primary provider only and surface that
//! provider's failure directly.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AttemptFailure, FlowError, GenerationError};
use crate::providers::{FallbackRouter, GenerationRequest};

const SUMMARIZE_USER_CONTENT: &str = "Summarize the text based on the prompt.";

const OPTIMIZE_SYSTEM_PROMPT: &str = "You are an expert in providing actionable optimizations \
     for transcripts. Given the following transcript, generate a list of bullet-point \
     optimizations and action items. Respond only with JSON of the form \
     {\"optimizations\": [\"...\", \"...\"]}.";

const ASK_SYSTEM_PROMPT: &str = "You are a helpful document assistant. Use the content of the \
     document provided to answer the user's question. Respond only with JSON of the form \
     {\"answer\": \"...\"}.";

/// Matches a bullet (`-`, `*`, `•`) or numbered (`1.`, `2)`) list line
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").expect("Invalid list item regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub summary: String,
    /// Provider that produced the summary
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOutput {
    pub optimizations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskOutput {
    pub answer: String,
}

fn require(value: &str, message: &'static str) -> Result<(), FlowError> {
    if value.trim().is_empty() {
        return Err(FlowError::InvalidInput(message));
    }
    Ok(())
}

/// Build the summarization request for `text` guided by `guidance_prompt`
pub fn summarize_request(text: &str, guidance_prompt: &str) -> GenerationRequest {
    let system = format!(
        "You are a chatbot summarizing text. Create a slightly detailed and conversational \
         summary of the following text, guided by the prompt.\n\nPrompt: {guidance_prompt}\n\nText: {text}"
    );
    GenerationRequest::new(system, SUMMARIZE_USER_CONTENT)
}

pub fn optimize_request(transcript: &str) -> GenerationRequest {
    GenerationRequest::new(
        OPTIMIZE_SYSTEM_PROMPT,
        format!("Transcript: {transcript}\n\nOptimizations and Action Items:"),
    )
}

pub fn ask_request(document_content: &str, question: &str) -> GenerationRequest {
    GenerationRequest::new(
        ASK_SYSTEM_PROMPT,
        format!("Document Content: {document_content}\n\nQuestion: {question}\n\nAnswer:"),
    )
}

/// Summarize `text` through the fallback chain
pub async fn summarize(
    router: &FallbackRouter,
    text: &str,
    guidance_prompt: &str,
) -> Result<SummarizeOutput, FlowError> {
    require(text, "text to summarize is empty")?;

    let generation = router.invoke(&summarize_request(text, guidance_prompt)).await?;
    Ok(SummarizeOutput {
        summary: generation.text,
        provider: generation.provider,
    })
}

/// Produce bullet-point optimizations and action items for a transcript
pub async fn optimize_transcript(
    router: &FallbackRouter,
    transcript: &str,
) -> Result<OptimizeOutput, FlowError> {
    require(transcript, "transcript is empty")?;

    let (provider, text) = single_call(router, "optimize", &optimize_request(transcript)).await?;
    let optimizations = parse_optimizations(&text);
    if optimizations.is_empty() {
        warn!(provider = provider.as_str(), "No optimizations found in response");
        return Err(FlowError::OperationFailed {
            operation: "optimize",
            provider,
            failure: AttemptFailure::EmptyResult,
        });
    }

    info!(count = optimizations.len(), "Transcript optimized");
    Ok(OptimizeOutput { optimizations })
}

/// Answer a question about the given document text
pub async fn ask_document_question(
    router: &FallbackRouter,
    document_content: &str,
    question: &str,
) -> Result<AskOutput, FlowError> {
    require(document_content, "document is empty")?;
    require(question, "question is empty")?;

    let (provider, text) = single_call(router, "ask", &ask_request(document_content, question)).await?;
    let answer = parse_answer(&text);
    if answer.is_empty() {
        warn!(provider = provider.as_str(), "No answer found in response");
        return Err(FlowError::OperationFailed {
            operation: "ask",
            provider,
            failure: AttemptFailure::EmptyResult,
        });
    }
    Ok(AskOutput { answer })
}

async fn single_call(
    router: &FallbackRouter,
    operation: &'static str,
    request: &GenerationRequest,
) -> Result<(String, String), FlowError> {
    let provider = router
        .primary()
        .ok_or(GenerationError::NoProviderAvailable)?;
    let id = provider.identifier().to_string();

    info!(operation, provider = id.as_str(), "Running single-provider operation");
    match router.attempt(provider.as_ref(), request).await {
        Ok(text) => Ok((id, text)),
        Err(failure) => {
            warn!(operation, provider = id.as_str(), error = %failure, "Operation failed");
            Err(FlowError::OperationFailed {
                operation,
                provider: id,
                failure,
            })
        }
    }
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Language tag runs up to the first newline; a one-line fence may only carry `json`
    let body = match rest.split_once('\n') {
        Some((tag, body)) if !tag.contains(['{', '[']) => body,
        _ => rest
            .strip_prefix("json")
            .filter(|b| b.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '['))
            .unwrap_or(rest),
    };
    body.trim()
}

/// JSON `{"optimizations": [...]}` if present, otherwise list lines
pub fn parse_optimizations(text: &str) -> Vec<String> {
    let body = strip_code_fence(text);
    if let Ok(parsed) = serde_json::from_str::<OptimizeOutput>(body) {
        return parsed
            .optimizations
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    body.lines()
        .filter_map(|line| LIST_ITEM.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// JSON `{"answer": "..."}` if present, otherwise the trimmed text
pub fn parse_answer(text: &str) -> String {
    let body = strip_code_fence(text);
    match serde_json::from_str::<AskOutput>(body) {
        Ok(parsed) => parsed.answer.trim().to_string(),
        Err(_) => body.to_string(),
    }
}
