use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::PlatformError;

const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v19.0";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials for the ads platform, attached lazily per session.
#[derive(Clone, Debug, Deserialize)]
pub struct PlatformCredentials {
    pub app_id: String,
    pub app_secret: SecretString,
    pub access_token: SecretString,
    pub account_id: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Active,
    Paused,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Archived => "ARCHIVED",
        }
    }
}

/// Campaign-level money. The platform wants integer cents.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Daily(f64),
    Lifetime(f64),
}

impl Budget {
    fn cents(amount: f64) -> i64 {
        (amount * 100.0) as i64
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignSpec {
    pub name: String,
    /// Platform objective, e.g. REACH, TRAFFIC, CONVERSIONS.
    pub objective: String,
    pub budget: Budget,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default = "default_status")]
    pub status: CampaignStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdSetSpec {
    pub name: String,
    /// Optimization goal, e.g. REACH, LINK_CLICKS.
    pub optimization_goal: String,
    pub targeting: serde_json::Value,
    pub budget: Budget,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default = "default_status")]
    pub status: CampaignStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreativeSpec {
    pub title: String,
    pub body: String,
    /// Call-to-action, e.g. LEARN_MORE, SHOP_NOW.
    pub call_to_action: String,
    pub destination_url: String,
    /// Hash of a previously uploaded image, if any.
    #[serde(default)]
    pub image_ref: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetingTerm {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub audience_size: Option<u64>,
}

fn default_status() -> CampaignStatus {
    CampaignStatus::Paused
}

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

fn apply_budget(params: &mut serde_json::Value, budget: Budget) {
    match budget {
        Budget::Daily(amount) => params["daily_budget"] = Budget::cents(amount).into(),
        Budget::Lifetime(amount) => params["lifetime_budget"] = Budget::cents(amount).into(),
    }
}

fn apply_schedule(params: &mut serde_json::Value, schedule: &Schedule) {
    if let Some(start) = schedule.start {
        params["start_time"] = start.format(TIME_FORMAT).to_string().into();
    }
    if let Some(end) = schedule.end {
        params["end_time"] = end.format(TIME_FORMAT).to_string().into();
    }
}

pub(crate) fn campaign_params(spec: &CampaignSpec) -> serde_json::Value {
    let mut params = serde_json::json!({
        "name": spec.name,
        "objective": spec.objective,
        "status": spec.status.as_str(),
        "special_ad_categories": [],
    });
    apply_budget(&mut params, spec.budget);
    apply_schedule(&mut params, &spec.schedule);
    params
}

pub(crate) fn ad_set_params(campaign_id: &str, spec: &AdSetSpec) -> serde_json::Value {
    let mut params = serde_json::json!({
        "name": spec.name,
        "campaign_id": campaign_id,
        "optimization_goal": spec.optimization_goal,
        "billing_event": "IMPRESSIONS",
        "status": spec.status.as_str(),
        "targeting": spec.targeting,
    });
    apply_budget(&mut params, spec.budget);
    apply_schedule(&mut params, &spec.schedule);
    params
}

pub(crate) fn creative_params(spec: &CreativeSpec) -> serde_json::Value {
    let mut link_data = serde_json::json!({
        "message": spec.body,
        "link": spec.destination_url,
        "name": spec.title,
        "call_to_action": {"type": spec.call_to_action},
    });
    if let Some(image_ref) = &spec.image_ref {
        link_data["image_hash"] = image_ref.clone().into();
    }

    serde_json::json!({
        "name": format!("Creative - {}", truncate(&spec.title, 20)),
        "object_story_spec": {
            "link_data": link_data,
        },
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Extract the created object id or the upstream error message from a Graph
/// API reply body.
fn extract_id(body: &serde_json::Value) -> Result<String, PlatformError> {
    if let Some(id) = body.get("id").and_then(|v| v.as_str()) {
        return Ok(id.to_string());
    }
    Err(upstream_error(body))
}

fn upstream_error(body: &serde_json::Value) -> PlatformError {
    let message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("malformed platform response");
    PlatformError::new(message)
}

/// Ads-platform client over the Graph API.
///
/// Creates and reads remote campaign objects on behalf of one session's
/// orchestrator; every operation surfaces the upstream error unchanged.
pub struct MetaAdsClient {
    client: Client,
    credentials: PlatformCredentials,
    base_url: String,
}

impl MetaAdsClient {
    pub fn new(credentials: PlatformCredentials) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            credentials,
            base_url: DEFAULT_GRAPH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.credentials.account_id
    }

    fn account_url(&self, edge: &str) -> String {
        format!("{}/act_{}/{}", self.base_url, self.credentials.account_id, edge)
    }

    async fn post(
        &self,
        url: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError> {
        let resp = self
            .client
            .post(url)
            .query(&[("access_token", self.credentials.access_token.expose_secret())])
            .json(params)
            .send()
            .await?;
        let body: serde_json::Value = resp.json().await?;
        Ok(body)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, PlatformError> {
        let resp = self
            .client
            .get(url)
            .query(&[("access_token", self.credentials.access_token.expose_secret().to_string())])
            .query(query)
            .send()
            .await?;
        let body: serde_json::Value = resp.json().await?;
        Ok(body)
    }

    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn create_campaign(&self, spec: &CampaignSpec) -> Result<String, PlatformError> {
        let body = self
            .post(&self.account_url("campaigns"), &campaign_params(spec))
            .await?;
        let id = extract_id(&body)?;
        tracing::info!(campaign_id = %id, "campaign created");
        Ok(id)
    }

    #[instrument(skip(self, spec), fields(campaign_id = %campaign_id))]
    pub async fn create_ad_set(
        &self,
        campaign_id: &str,
        spec: &AdSetSpec,
    ) -> Result<String, PlatformError> {
        let body = self
            .post(&self.account_url("adsets"), &ad_set_params(campaign_id, spec))
            .await?;
        let id = extract_id(&body)?;
        tracing::info!(ad_set_id = %id, "ad set created");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn create_ad(
        &self,
        ad_set_id: &str,
        name: &str,
        creative_id: &str,
    ) -> Result<String, PlatformError> {
        let params = serde_json::json!({
            "name": name,
            "adset_id": ad_set_id,
            "creative": {"creative_id": creative_id},
            "status": CampaignStatus::Paused.as_str(),
        });
        let body = self.post(&self.account_url("ads"), &params).await?;
        let id = extract_id(&body)?;
        tracing::info!(ad_id = %id, "ad created");
        Ok(id)
    }

    #[instrument(skip(self, spec), fields(title = %spec.title))]
    pub async fn create_creative(&self, spec: &CreativeSpec) -> Result<String, PlatformError> {
        let body = self
            .post(&self.account_url("adcreatives"), &creative_params(spec))
            .await?;
        let id = extract_id(&body)?;
        tracing::info!(creative_id = %id, "creative created");
        Ok(id)
    }

    /// Fetch performance metrics for a campaign over a date range.
    pub async fn fetch_metrics(
        &self,
        campaign_id: &str,
        range: DateRange,
        fields: &[&str],
    ) -> Result<serde_json::Value, PlatformError> {
        let url = format!("{}/{}/insights", self.base_url, campaign_id);
        let time_range = serde_json::json!({
            "since": range.since.format("%Y-%m-%d").to_string(),
            "until": range.until.format("%Y-%m-%d").to_string(),
        });
        let body = self
            .get(
                &url,
                &[
                    ("time_range", time_range.to_string()),
                    ("fields", fields.join(",")),
                ],
            )
            .await?;

        if body.get("error").is_some() {
            return Err(upstream_error(&body));
        }
        // Insights come back as a paged list; the first record is the rollup.
        Ok(body
            .get("data")
            .and_then(|d| d.get(0))
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }

    /// Search interest terms for targeting.
    pub async fn search_targeting_terms(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetingTerm>, PlatformError> {
        let url = format!("{}/search", self.base_url);
        let body = self
            .get(
                &url,
                &[
                    ("q", query.to_string()),
                    ("type", "adinterest".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        if body.get("error").is_some() {
            return Err(upstream_error(&body));
        }
        let terms = body
            .get("data")
            .and_then(|d| d.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        Ok(terms)
    }

    /// Update a campaign's status. Returns false when the platform refuses.
    pub async fn set_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<bool, PlatformError> {
        let url = format!("{}/{}", self.base_url, campaign_id);
        let params = serde_json::json!({"status": status.as_str()});
        let body = self.post(&url, &params).await?;

        if body.get("error").is_some() {
            tracing::warn!(campaign_id, status = status.as_str(), "status update refused");
            return Ok(false);
        }
        Ok(body.get("success").and_then(|s| s.as_bool()).unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_spec() -> CampaignSpec {
        CampaignSpec {
            name: "Spring Launch".into(),
            objective: "CONVERSIONS".into(),
            budget: Budget::Daily(50.0),
            schedule: Schedule::default(),
            status: CampaignStatus::Paused,
        }
    }

    #[test]
    fn campaign_params_convert_budget_to_cents() {
        let params = campaign_params(&campaign_spec());
        assert_eq!(params["daily_budget"], 5000);
        assert!(params.get("lifetime_budget").is_none());
    }

    #[test]
    fn campaign_params_lifetime_budget() {
        let mut spec = campaign_spec();
        spec.budget = Budget::Lifetime(350.5);
        let params = campaign_params(&spec);
        assert_eq!(params["lifetime_budget"], 35050);
        assert!(params.get("daily_budget").is_none());
    }

    #[test]
    fn campaign_params_default_to_paused() {
        let params = campaign_params(&campaign_spec());
        assert_eq!(params["status"], "PAUSED");
        assert_eq!(params["objective"], "CONVERSIONS");
        assert!(params["special_ad_categories"].as_array().unwrap().is_empty());
    }

    #[test]
    fn campaign_params_include_schedule() {
        let mut spec = campaign_spec();
        spec.schedule.start = Some("2026-03-01T00:00:00Z".parse().unwrap());
        spec.schedule.end = Some("2026-03-08T00:00:00Z".parse().unwrap());
        let params = campaign_params(&spec);
        assert!(params["start_time"].as_str().unwrap().starts_with("2026-03-01"));
        assert!(params["end_time"].as_str().unwrap().starts_with("2026-03-08"));
    }

    #[test]
    fn ad_set_params_carry_campaign_and_billing() {
        let spec = AdSetSpec {
            name: "Women 25-34".into(),
            optimization_goal: "OFFSITE_CONVERSIONS".into(),
            targeting: serde_json::json!({"age_min": 25, "age_max": 34, "genders": [1]}),
            budget: Budget::Daily(25.0),
            schedule: Schedule::default(),
            status: CampaignStatus::Paused,
        };
        let params = ad_set_params("camp_1", &spec);
        assert_eq!(params["campaign_id"], "camp_1");
        assert_eq!(params["billing_event"], "IMPRESSIONS");
        assert_eq!(params["daily_budget"], 2500);
        assert_eq!(params["targeting"]["age_min"], 25);
    }

    #[test]
    fn creative_params_build_story_spec() {
        let spec = CreativeSpec {
            title: "Get 20% off your first order".into(),
            body: "Limited time offer".into(),
            call_to_action: "SHOP_NOW".into(),
            destination_url: "https://shop.example.com".into(),
            image_ref: Some("abc123".into()),
        };
        let params = creative_params(&spec);
        let link_data = &params["object_story_spec"]["link_data"];
        assert_eq!(link_data["message"], "Limited time offer");
        assert_eq!(link_data["call_to_action"]["type"], "SHOP_NOW");
        assert_eq!(link_data["image_hash"], "abc123");
        assert_eq!(params["name"], "Creative - Get 20% off your fi");
    }

    #[test]
    fn creative_params_omit_missing_image() {
        let spec = CreativeSpec {
            title: "Title".into(),
            body: "Body".into(),
            call_to_action: "LEARN_MORE".into(),
            destination_url: "https://example.com".into(),
            image_ref: None,
        };
        let params = creative_params(&spec);
        assert!(params["object_story_spec"]["link_data"].get("image_hash").is_none());
    }

    #[test]
    fn extract_id_reads_id() {
        let body = serde_json::json!({"id": "120210000000"});
        assert_eq!(extract_id(&body).unwrap(), "120210000000");
    }

    #[test]
    fn extract_id_surfaces_upstream_message() {
        let body = serde_json::json!({"error": {"message": "(#100) Missing parameter", "code": 100}});
        let err = extract_id(&body).unwrap_err();
        assert!(err.to_string().contains("(#100) Missing parameter"));
    }

    #[test]
    fn status_strings() {
        assert_eq!(CampaignStatus::Active.as_str(), "ACTIVE");
        assert_eq!(CampaignStatus::Paused.as_str(), "PAUSED");
        assert_eq!(CampaignStatus::Archived.as_str(), "ARCHIVED");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("exactly twenty chars!", 20), "exactly twenty chars");
    }
}
