//! Worker personas, stage instructions and canned guidance replies.

use adflow_core::briefing::Briefing;
use adflow_llm::search::web_search_tool;

use crate::worker::WorkerSpec;

/// A creative available to the ad-specification stage, summarized for the
/// prompt.
#[derive(Clone, Debug)]
pub struct CreativeAsset {
    pub kind: String,
    pub description: String,
}

pub fn strategist_spec(model: &str) -> WorkerSpec {
    WorkerSpec {
        role: "Digital Marketing Strategist".into(),
        goal: "Develop effective digital marketing strategies for Meta Ads campaigns".into(),
        persona: "You are a senior digital marketing strategist with more than ten years of \
                  experience running Facebook and Instagram Ads campaigns. You have worked with \
                  companies of every size and segment, reaching exceptional results through \
                  well-grounded strategies. You are data-driven, but you also understand the \
                  creative and human side of digital marketing."
            .into(),
        model: model.into(),
        temperature: 0.2,
        tools: vec![web_search_tool()],
        allow_delegation: true,
    }
}

pub fn campaign_builder_spec(model: &str) -> WorkerSpec {
    WorkerSpec {
        role: "Meta Ads Campaign Structure Specialist".into(),
        goal: "Configure optimized Meta Ads campaigns following platform best practices".into(),
        persona: "You are a technical Meta Ads specialist with deep experience configuring and \
                  optimizing campaigns. You know every resource, format, setting and technical \
                  requirement of the platform, and how to structure campaigns, ad sets and ads \
                  to reach the best possible results for any objective."
            .into(),
        model: model.into(),
        temperature: 0.2,
        tools: vec![],
        allow_delegation: true,
    }
}

pub fn ad_specialist_spec(model: &str) -> WorkerSpec {
    WorkerSpec {
        role: "Meta Ads Creative Specialist".into(),
        goal: "Evaluate creatives and produce ad specifications that maximize performance".into(),
        persona: "You are a Meta Ads creative specialist with years of experience optimizing ad \
                  creatives. You understand ad formats, technical requirements and recommended \
                  practices for every objective. You can judge the performance potential of \
                  images and videos, and you write persuasive copy that delivers results."
            .into(),
        model: model.into(),
        // Slightly more creative freedom for ad copy.
        temperature: 0.4,
        tools: vec![],
        allow_delegation: true,
    }
}

/// Instructions for the strategy stage: analyze the briefing, produce a
/// complete marketing strategy.
pub fn strategy_instructions(briefing: &Briefing) -> String {
    format!(
        "Analyze the briefing below and develop a complete marketing strategy for a Meta Ads \
         campaign (Facebook and Instagram).\n\n\
         BRIEFING:\n{}\n\n\
         Develop a detailed strategy covering:\n\
         1. Recommended overall approach\n\
         2. Suggested campaign structure\n\
         3. Recommended audience segmentation\n\
         4. Budget and bidding strategy\n\
         5. Priority channels and placements\n\
         6. Creative recommendations\n\
         7. KPIs to monitor\n\n\
         If needed, search the web for current trends, best practices or sector information \
         relevant to the campaign.",
        briefing.render_block()
    )
}

/// Instructions for the technical-structure stage.
///
/// When the strategy text is supplied the stage runs standalone and the text
/// is inlined; inside the full-campaign pipeline it is `None` and the
/// strategy arrives as a declared upstream dependency instead.
pub fn structure_instructions(briefing: &Briefing, strategy: Option<&str>) -> String {
    let lead = match strategy {
        Some(strategy) => format!(
            "Based on the strategy and briefing below, produce a complete technical structure \
             for implementation on Meta Ads.\n\nCAMPAIGN STRATEGY:\n{strategy}\n"
        ),
        None => "Based on the campaign strategy developed by the Digital Marketing Strategist, \
                 produce a complete technical structure for implementation on Meta Ads.\n"
            .to_string(),
    };
    format!(
        "{lead}\n\
         BRIEFING:\n{}\n\n\
         Provide the complete technical structure including:\n\
         1. The specific Meta Ads campaign objective\n\
         2. The full campaign structure (campaign, ad sets, ads)\n\
         3. Detailed settings for each level:\n\
            - Campaign: objective, buying type, budget, schedule\n\
            - Ad sets: audience, placements, optimizations, bids\n\
            - Ads: formats, image/video requirements, copy\n\
         4. Specific targeting for each ad set\n\
         5. Tracking and conversion settings\n\n\
         Deliver the structure in a detailed, technical format, as it would be implemented on \
         the Meta Ads platform, with every concrete setting.",
        briefing.render_block()
    )
}

/// Instructions for the ad-specification stage.
///
/// Standalone callers inline the upstream texts; the full-campaign pipeline
/// passes `None` for both and wires them as dependencies.
pub fn ad_spec_instructions(
    assets: &[CreativeAsset],
    strategy: Option<&str>,
    structure: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "Based on the campaign strategy and technical structure, evaluate the available \
         creatives and produce detailed specifications for the ads.\n\n",
    );

    if let Some(strategy) = strategy {
        prompt.push_str(&format!("CAMPAIGN STRATEGY:\n{strategy}\n\n"));
    }
    if let Some(structure) = structure {
        prompt.push_str(&format!("TECHNICAL STRUCTURE:\n{structure}\n\n"));
    }

    prompt.push_str("AVAILABLE CREATIVES:\n");
    if assets.is_empty() {
        prompt.push_str("No creatives provided. Produce generic specifications.\n");
    } else {
        for (i, asset) in assets.iter().enumerate() {
            prompt.push_str(&format!("Creative {}: {} - {}\n", i + 1, asset.kind, asset.description));
        }
    }

    prompt.push_str(
        "\nProvide detailed technical specifications for each ad, including:\n\
         1. Recommended format\n\
         2. Technical specifications\n\
         3. Suggested copy\n\
         4. Recommended call-to-action",
    );
    prompt
}

/// Instructions for a standalone creative review.
pub fn creative_review_instructions(description: &str, format: &str, objective: &str) -> String {
    format!(
        "Evaluate the creative described below for a Meta Ads campaign:\n\n\
         CREATIVE DESCRIPTION:\n{description}\n\n\
         FORMAT: {format}\n\n\
         CAMPAIGN OBJECTIVE: {objective}\n\n\
         Provide a detailed evaluation of this creative, including:\n\
         1. Fit with the campaign objective (1 to 10)\n\
         2. Strengths\n\
         3. Areas needing improvement\n\
         4. Compliance with Meta Ads policies\n\
         5. Expected performance potential\n\
         6. Specific optimization recommendations\n\
         7. Variant suggestions for testing\n\n\
         Be specific and technical, considering the visual, textual and strategic aspects of \
         the creative."
    )
}

const GUIDANCE_BRIEFING: &str = "Let's put your briefing together. Please provide:\n\n\
    1. Campaign objective\n\
    2. Target audience\n\
    3. Budget\n\
    4. Campaign duration\n\
    5. Key metrics to track\n\
    6. Prior experience with paid ads";

const GUIDANCE_CREATIVE: &str = "To review your creative I need:\n\n\
    1. A detailed description of the creative\n\
    2. Its format (image, video, carousel, ...)\n\
    3. The campaign objective";

const GUIDANCE_MENU: &str = "How can I help with your paid traffic campaign today? I can help with:\n\n\
    - Putting together a briefing\n\
    - Campaign strategy\n\
    - Creative review\n\
    - Campaign structure";

/// Canned reply for a plain chat message, chosen by keyword.
pub fn guidance_reply(content: &str) -> &'static str {
    let lower = content.to_lowercase();
    if lower.contains("briefing") {
        GUIDANCE_BRIEFING
    } else if lower.contains("creative") && (lower.contains("review") || lower.contains("analyze")) {
        GUIDANCE_CREATIVE
    } else {
        GUIDANCE_MENU
    }
}
