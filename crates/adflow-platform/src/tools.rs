use adflow_core::tools::ToolSpec;

/// Capabilities granted to the campaign-builder and ad-specialist workers
/// when a platform client is attached. Attachment is all-or-nothing across
/// the two workers.
pub fn platform_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "create_campaign",
            "Create a campaign on the ads platform. Returns the campaign id.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "objective": {"type": "string", "description": "REACH, TRAFFIC, CONVERSIONS, ..."},
                    "daily_budget": {"type": "number"},
                    "lifetime_budget": {"type": "number"},
                    "status": {"type": "string", "enum": ["ACTIVE", "PAUSED"]}
                },
                "required": ["name", "objective"]
            }),
        ),
        ToolSpec::new(
            "create_ad_set",
            "Create an ad set inside an existing campaign. Returns the ad set id.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "campaign_id": {"type": "string"},
                    "name": {"type": "string"},
                    "optimization_goal": {"type": "string"},
                    "targeting": {"type": "object"},
                    "daily_budget": {"type": "number"}
                },
                "required": ["campaign_id", "name", "optimization_goal", "targeting"]
            }),
        ),
        ToolSpec::new(
            "create_ad",
            "Create an ad inside an ad set from an existing creative. Returns the ad id.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "ad_set_id": {"type": "string"},
                    "name": {"type": "string"},
                    "creative_id": {"type": "string"}
                },
                "required": ["ad_set_id", "name", "creative_id"]
            }),
        ),
        ToolSpec::new(
            "create_creative",
            "Create an ad creative: title, body, call-to-action and destination URL.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "body": {"type": "string"},
                    "call_to_action": {"type": "string", "description": "LEARN_MORE, SHOP_NOW, ..."},
                    "destination_url": {"type": "string"},
                    "image_ref": {"type": "string"}
                },
                "required": ["title", "body", "call_to_action", "destination_url"]
            }),
        ),
        ToolSpec::new(
            "search_targeting_terms",
            "Search interest terms usable for audience targeting.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer", "default": 10}
                },
                "required": ["query"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_the_five_platform_capabilities() {
        let tools = platform_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "create_campaign",
                "create_ad_set",
                "create_ad",
                "create_creative",
                "search_targeting_terms",
            ]
        );
    }

    #[test]
    fn every_tool_has_a_schema() {
        for tool in platform_tools() {
            assert_eq!(tool.parameters_schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }
}
