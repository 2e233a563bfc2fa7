//! Search augmentation: rewrites a prompt to carry web search results, or a
//! note that search was unavailable.

use std::fmt::Write as _;
use std::sync::Arc;

use gr_providers::util::truncate_chars;
use gr_providers::{SearchHit, SearchOutcome, WebSearch};

/// Longest provider error text quoted back into a prompt.
const MAX_ERROR_CHARS: usize = 200;

const NOT_CONFIGURED_NOTICE: &str = "Search is not configured by the bot owner.";

/// Which wording to use around the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentContext {
    Text,
    Image,
}

pub struct SearchAugmenter {
    search: Arc<dyn WebSearch>,
    num_results: u32,
}

impl SearchAugmenter {
    pub fn new(search: Arc<dyn WebSearch>, num_results: u32) -> Self {
        Self {
            search,
            num_results,
        }
    }

    /// Rewrite `query` according to what the search provider returned.
    /// A blank query comes back unchanged without a search.
    pub async fn augment(&self, query: &str, context: AugmentContext) -> String {
        if query.trim().is_empty() {
            return query.to_owned();
        }
        let outcome = self.search.search(query, self.num_results).await;
        tracing::debug!(?context, outcome = outcome_kind(&outcome), "search augmentation");
        render(query, context, &outcome)
    }
}

fn outcome_kind(outcome: &SearchOutcome) -> &'static str {
    match outcome {
        SearchOutcome::Hits(_) => "hits",
        SearchOutcome::NotConfigured => "not_configured",
        SearchOutcome::EmptyQuery => "empty_query",
        SearchOutcome::ProviderError(_) => "provider_error",
        SearchOutcome::NoResults => "no_results",
    }
}

/// Build the augmented prompt for a search outcome.
pub fn render(query: &str, context: AugmentContext, outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::EmptyQuery => query.to_owned(),
        SearchOutcome::Hits(hits) => {
            let listing = format_hits(hits);
            match context {
                AugmentContext::Text => format!(
                    "Web Search Results:\n{listing}\n\nBased on these results, please answer: {query}"
                ),
                AugmentContext::Image => format!(
                    "Web Search Results:\n{listing}\n\nBased on these search results and the image, please respond to: {query}"
                ),
            }
        }
        SearchOutcome::NoResults => match context {
            AugmentContext::Text => format!(
                "I searched for '{query}' but found no relevant results. Please answer based on your general knowledge: {query}"
            ),
            AugmentContext::Image => format!(
                "I searched for '{query}' (related to the image) but found no relevant results. Please respond based on the image and your general knowledge: {query}"
            ),
        },
        SearchOutcome::NotConfigured => unavailable(query, context, NOT_CONFIGURED_NOTICE),
        SearchOutcome::ProviderError(e) => {
            let notice = format!(
                "An error occurred while trying to search: {}",
                truncate_chars(e, MAX_ERROR_CHARS)
            );
            unavailable(query, context, &notice)
        }
    }
}

fn unavailable(query: &str, context: AugmentContext, notice: &str) -> String {
    match context {
        AugmentContext::Text => format!(
            "Regarding your request for '{query}': I encountered an issue with web search ('{notice}'). Please answer based on your general knowledge: {query}"
        ),
        AugmentContext::Image => format!(
            "Regarding your text '{query}' (related to the image): I encountered an issue with web search ('{notice}'). Please respond based on the image and your general knowledge: {query}"
        ),
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}. {}: {} (Source: {})", i + 1, hit.title, hit.snippet, hit.link);
    }
    out
}
