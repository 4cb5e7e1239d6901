//! Fetch-or-serve pipeline for PageInsights.
//!
//! This crate ties the renderer, extractor, summarizer and page store together:
//! - [`summarizer`]: generated summaries over the Gemini API
//! - [`pipeline`]: the cache-or-scrape orchestrator ([`PageService`])

pub mod pipeline;
pub mod summarizer;

pub use pipeline::{FetchOutcome, Fetched, PageService, SUMMARY_FALLBACK};
pub use summarizer::{GeminiSummarizer, Summarizer, summary_prompt};
