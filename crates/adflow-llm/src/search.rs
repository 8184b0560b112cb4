use adflow_core::tools::ToolSpec;
use serde::{Deserialize, Serialize};

/// A single web-search hit, as the backend reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The strategist's standing capability: the backend-side web-search tool,
/// used for current trends and sector research during strategy work.
pub fn web_search_tool() -> ToolSpec {
    ToolSpec::new(
        "web_search",
        "Search the web for current information: market trends, best practices, \
         sector data relevant to the campaign.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query"},
                "max_results": {"type": "integer", "default": 5}
            },
            "required": ["query"]
        }),
    )
}
