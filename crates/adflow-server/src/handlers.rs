//! HTTP handlers: the thin transport/validation shim over the engine.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use adflow_core::briefing::Briefing;
use adflow_core::history::{HistoryEntry, Role};
use adflow_core::ids::{SessionId, TaskId};
use adflow_engine::error::EngineError;
use adflow_engine::prompts::{self, CreativeAsset};
use adflow_engine::{TaskOutput, TaskSnapshot};
use adflow_platform::PlatformCredentials;
use adflow_store::Session;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Briefing,
    Creative,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub response_id: TaskId,
    pub content: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreativeSubmission {
    description: String,
    format: String,
    #[serde(default)]
    objective: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub asset_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_spec_text: Option<String>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectPlatformRequest {
    pub session_id: String,
    pub credentials: PlatformCredentials,
}

#[derive(Debug, Serialize)]
pub struct ConnectPlatformResponse {
    pub attached: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/session
pub async fn create_session(State(state): State<Arc<AppState>>) -> Json<CreateSessionResponse> {
    let session = state.registry.create();
    Json(CreateSessionResponse { session_id: session.id.clone() })
}

/// POST /api/v1/message
///
/// Appends the user entry, schedules the matching orchestrator operation off
/// the request path, and replies immediately with a pollable response id.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session_id = SessionId::from_raw(&body.session_id);
    let session = state.registry.require(&session_id)?;

    session.history.append(Role::User, &body.content);

    let response_id = match body.kind {
        MessageKind::Briefing => {
            let briefing: Briefing = serde_json::from_str(&body.content)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid briefing: {e}")))?;
            submit_reply(&state, session, move |session, cancel| async move {
                let run = session.orchestrator.develop_strategy(&briefing, &cancel).await;
                run.into_result()
                    .map(|outputs| {
                        format!(
                            "Strategy developed successfully.\n\n{}",
                            outputs.last().map(String::as_str).unwrap_or("")
                        )
                    })
                    .map_err(EngineError::from)
            })
        }
        MessageKind::Creative => {
            let creative: CreativeSubmission = serde_json::from_str(&body.content)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid creative: {e}")))?;
            submit_reply(&state, session, move |session, cancel| async move {
                let objective = creative.objective.as_deref().unwrap_or("Not specified");
                let run = session
                    .orchestrator
                    .review_creative(&creative.description, &creative.format, objective, &cancel)
                    .await;
                run.into_result()
                    .map(|outputs| {
                        format!(
                            "Creative review complete.\n\n{}",
                            outputs.last().map(String::as_str).unwrap_or("")
                        )
                    })
                    .map_err(EngineError::from)
            })
        }
        MessageKind::Text => {
            let reply = prompts::guidance_reply(&body.content);
            submit_reply(&state, session, move |_session, _cancel| async move {
                Ok(reply.to_string())
            })
        }
    };

    Ok(Json(MessageResponse {
        response_id,
        content: String::new(),
        is_complete: false,
        error: None,
    }))
}

/// Schedule a reply-producing operation; on success the assistant reply is
/// appended to the session history before the cell completes.
fn submit_reply<F, Fut>(state: &AppState, session: Arc<Session>, operation: F) -> TaskId
where
    F: FnOnce(Arc<Session>, CancellationToken) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<String, EngineError>> + Send + 'static,
{
    state.tasks.submit(move |cancel| async move {
        let reply = operation(Arc::clone(&session), cancel).await?;
        session.history.append(Role::Assistant, &reply);
        Ok(TaskOutput::Text(reply))
    })
}

/// GET /api/v1/message/{response_id}
pub async fn poll_message(
    State(state): State<Arc<AppState>>,
    Path(response_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = TaskId::from_raw(&response_id);
    let snapshot = state
        .tasks
        .poll(&id)
        .ok_or_else(|| ApiError::ResponseNotFound(response_id))?;

    Ok(Json(MessageResponse {
        response_id: id,
        content: snapshot.content().to_string(),
        is_complete: snapshot.is_complete,
        error: snapshot.error,
    }))
}

/// POST /api/v1/upload (multipart: file, session_id, file_type)
pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut file_type: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("failed to read file: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            "session_id" => {
                session_id = field.text().await.ok();
            }
            "file_type" => {
                file_type = field.text().await.ok();
            }
            _ => {}
        }
    }

    let session_id = session_id
        .ok_or_else(|| ApiError::InvalidRequest("missing field: session_id".into()))?;
    let file_type =
        file_type.ok_or_else(|| ApiError::InvalidRequest("missing field: file_type".into()))?;
    let bytes = file_bytes.ok_or_else(|| ApiError::InvalidRequest("missing field: file".into()))?;
    let filename = filename.unwrap_or_else(|| "upload".to_string());

    let session_id = SessionId::from_raw(session_id);
    let _session = state.registry.require(&session_id)?;

    let asset = state.assets.put(&session_id, &file_type, &filename, &bytes)?;
    Ok(Json(UploadResponse { asset_ref: asset.path }))
}

/// POST /api/v1/campaign?session_id=…
///
/// Runs the full pipeline — strategy, technical structure, ad
/// specifications — as one background run.
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CampaignQuery>,
    Json(briefing): Json<Briefing>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let session_id = SessionId::from_raw(&query.session_id);
    let session = state.registry.require(&session_id)?;

    let assets: Vec<CreativeAsset> = state
        .assets
        .list(&session_id)
        .into_iter()
        .map(|asset| CreativeAsset {
            kind: asset.kind,
            description: format!("File {}", asset.original_name),
        })
        .collect();

    let id = state.tasks.submit(move |cancel| async move {
        let run = session.orchestrator.run_campaign(&briefing, &assets, &cancel).await;
        let outputs = run.into_result().map_err(EngineError::from)?;
        session
            .history
            .append(Role::System, format!("Campaign created: {}", briefing.campaign_name));
        Ok(TaskOutput::StageOutputs(outputs))
    });

    Ok(Json(CampaignResponse {
        id,
        strategy_text: None,
        structure_text: None,
        ad_spec_text: None,
        is_complete: false,
        error: None,
    }))
}

/// GET /api/v1/campaign/{id}
pub async fn poll_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let id = TaskId::from_raw(&id);
    let snapshot = state
        .tasks
        .poll(&id)
        .ok_or_else(|| ApiError::ResponseNotFound(id.to_string()))?;

    Ok(Json(campaign_response(id, &snapshot)))
}

fn campaign_response(id: TaskId, snapshot: &TaskSnapshot) -> CampaignResponse {
    CampaignResponse {
        id,
        strategy_text: snapshot.stage_output(0).map(str::to_string),
        structure_text: snapshot.stage_output(1).map(str::to_string),
        ad_spec_text: snapshot.stage_output(2).map(str::to_string),
        is_complete: snapshot.is_complete,
        error: snapshot.error.clone(),
    }
}

/// POST /api/v1/platform/connect
pub async fn connect_platform(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectPlatformRequest>,
) -> Result<Json<ConnectPlatformResponse>, ApiError> {
    let session_id = SessionId::from_raw(&body.session_id);
    let session = state.registry.require(&session_id)?;

    session.orchestrator.attach_platform_client(body.credentials);
    Ok(Json(ConnectPlatformResponse { attached: true }))
}

/// GET /api/v1/history/{session_id}
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let session_id = SessionId::from_raw(&session_id);
    let session = state.registry.require(&session_id)?;
    Ok(Json(session.history.read_all()))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.registry.len(),
        "tasks": state.tasks.len(),
    }))
}
