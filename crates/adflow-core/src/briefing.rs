use serde::{Deserialize, Serialize};

/// The structured client input feeding the strategy stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Briefing {
    pub campaign_name: String,
    pub objective: String,
    pub target_audience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    /// Duration in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatives_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_metrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const NOT_SPECIFIED: &str = "Not specified";

impl Briefing {
    /// Render the labeled briefing block spliced into stage prompts.
    /// Absent optional fields render as "Not specified".
    pub fn render_block(&self) -> String {
        let mut lines = vec![
            format!("Campaign objective: {}", self.objective),
            format!("Target audience: {}", self.target_audience),
            format!(
                "Budget: {}",
                self.budget
                    .map(|b| format!("{b:.2}"))
                    .unwrap_or_else(|| NOT_SPECIFIED.to_string())
            ),
            format!(
                "Duration: {}",
                self.duration_days
                    .map(|d| format!("{d} days"))
                    .unwrap_or_else(|| NOT_SPECIFIED.to_string())
            ),
            format!(
                "Creatives status: {}",
                self.creatives_status.as_deref().unwrap_or(NOT_SPECIFIED)
            ),
            format!(
                "Key metrics: {}",
                self.key_metrics.as_deref().unwrap_or(NOT_SPECIFIED)
            ),
            format!(
                "Prior experience: {}",
                self.prior_experience.as_deref().unwrap_or(NOT_SPECIFIED)
            ),
        ];
        if let Some(notes) = &self.notes {
            lines.push(format!("Notes: {notes}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Briefing {
        serde_json::from_value(serde_json::json!({
            "campaign_name": "Spring Launch",
            "objective": "conversions",
            "target_audience": "women 25-34",
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_with_defaults() {
        let briefing = minimal();
        assert_eq!(briefing.campaign_name, "Spring Launch");
        assert!(briefing.budget.is_none());
        assert!(briefing.duration_days.is_none());
    }

    #[test]
    fn render_block_fills_placeholders() {
        let block = minimal().render_block();
        assert!(block.contains("Campaign objective: conversions"));
        assert!(block.contains("Target audience: women 25-34"));
        assert!(block.contains("Budget: Not specified"));
        assert!(block.contains("Duration: Not specified"));
        assert!(!block.contains("Notes:"));
    }

    #[test]
    fn render_block_includes_set_fields() {
        let mut briefing = minimal();
        briefing.budget = Some(50.0);
        briefing.duration_days = Some(7);
        briefing.notes = Some("prefer video placements".into());

        let block = briefing.render_block();
        assert!(block.contains("Budget: 50.00"));
        assert!(block.contains("Duration: 7 days"));
        assert!(block.contains("Notes: prefer video placements"));
    }

    #[test]
    fn missing_required_field_fails() {
        let result: Result<Briefing, _> = serde_json::from_value(serde_json::json!({
            "campaign_name": "x",
            "objective": "traffic",
        }));
        assert!(result.is_err());
    }
}
