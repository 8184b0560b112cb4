//! Per-session worker-set orchestration.
//!
//! One `Orchestrator` per session owns the three workers and runs
//! dependency-ordered pipelines against them. Pipeline runs on the same
//! session queue behind a single run lock, so concurrent submissions execute
//! in submission order instead of interleaving worker state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use adflow_core::backend::CompletionBackend;
use adflow_core::briefing::Briefing;
use adflow_platform::{MetaAdsClient, PlatformCredentials};

use crate::error::StageError;
use crate::pipeline::{Pipeline, PipelineRun, Stage, StageRole};
use crate::prompts::{self, CreativeAsset};
use crate::worker::Worker;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub model: String,
    /// Deadline for each stage's generation call.
    pub stage_deadline: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            stage_deadline: Duration::from_secs(120),
        }
    }
}

pub struct Orchestrator {
    strategist: Worker,
    campaign_builder: Worker,
    ad_specialist: Worker,
    platform: RwLock<Option<Arc<MetaAdsClient>>>,
    run_lock: tokio::sync::Mutex<()>,
    stage_deadline: Duration,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: OrchestratorConfig) -> Self {
        let strategist = Worker::new(Arc::clone(&backend), prompts::strategist_spec(&config.model))
            .expect("built-in strategist spec is valid");
        let campaign_builder =
            Worker::new(Arc::clone(&backend), prompts::campaign_builder_spec(&config.model))
                .expect("built-in campaign builder spec is valid");
        let ad_specialist =
            Worker::new(backend, prompts::ad_specialist_spec(&config.model))
                .expect("built-in ad specialist spec is valid");

        Self {
            strategist,
            campaign_builder,
            ad_specialist,
            platform: RwLock::new(None),
            run_lock: tokio::sync::Mutex::new(()),
            stage_deadline: config.stage_deadline,
        }
    }

    /// Attach the ads-platform client and grant its capabilities to the
    /// campaign-builder and ad-specialist workers. The grant is
    /// all-or-nothing across the two workers; re-attachment replaces the
    /// client and leaves the already-granted capabilities in place.
    pub fn attach_platform_client(&self, credentials: PlatformCredentials) {
        let client = Arc::new(MetaAdsClient::new(credentials));
        for tool in adflow_platform::platform_tools() {
            self.campaign_builder.add_tool(tool.clone());
            self.ad_specialist.add_tool(tool);
        }
        *self.platform.write() = Some(client);
        tracing::info!("ads platform client attached");
    }

    pub fn platform(&self) -> Option<Arc<MetaAdsClient>> {
        self.platform.read().clone()
    }

    pub fn has_platform(&self) -> bool {
        self.platform.read().is_some()
    }

    fn worker(&self, role: StageRole) -> &Worker {
        match role {
            StageRole::Strategist => &self.strategist,
            StageRole::CampaignBuilder => &self.campaign_builder,
            StageRole::AdSpecialist => &self.ad_specialist,
        }
    }

    /// Execute a pipeline strictly in declaration order.
    ///
    /// Each stage's prompt is rendered from its declared upstream outputs;
    /// the first stage failure halts the run, records the stage error, and
    /// leaves already-completed outputs readable. No partial retry, no skip.
    pub async fn run_pipeline(&self, pipeline: &Pipeline, cancel: &CancellationToken) -> PipelineRun {
        let _queued = self.run_lock.lock().await;

        let mut run = PipelineRun::new();
        for (index, stage) in pipeline.stages().iter().enumerate() {
            let prompt = pipeline.render_prompt(index, run.outputs());
            tracing::debug!(stage = index, role = %stage.role, "executing stage");

            match self
                .worker(stage.role)
                .execute(&prompt, self.stage_deadline, cancel)
                .await
            {
                Ok(text) => run.push_output(text),
                Err(source) => {
                    tracing::warn!(
                        stage = index,
                        role = %stage.role,
                        error = %source,
                        "stage failed, halting pipeline"
                    );
                    run.fail(StageError { stage: index, role: stage.role, source });
                    return run;
                }
            }
        }
        run.complete();
        run
    }

    /// Strategy only: one stage, strategist, inputs = raw briefing fields.
    pub async fn develop_strategy(&self, briefing: &Briefing, cancel: &CancellationToken) -> PipelineRun {
        let pipeline = Pipeline::new(vec![Stage::new(
            StageRole::Strategist,
            prompts::strategy_instructions(briefing),
        )])
        .expect("single stage has no dependencies");
        self.run_pipeline(&pipeline, cancel).await
    }

    /// Technical structure, standalone: the strategy text is inlined into
    /// the stage instructions.
    pub async fn design_structure(
        &self,
        briefing: &Briefing,
        strategy: &str,
        cancel: &CancellationToken,
    ) -> PipelineRun {
        let pipeline = Pipeline::new(vec![Stage::new(
            StageRole::CampaignBuilder,
            prompts::structure_instructions(briefing, Some(strategy)),
        )])
        .expect("single stage has no dependencies");
        self.run_pipeline(&pipeline, cancel).await
    }

    /// Ad specifications, standalone: both upstream texts are inlined.
    pub async fn specify_ads(
        &self,
        strategy: &str,
        structure: &str,
        assets: &[CreativeAsset],
        cancel: &CancellationToken,
    ) -> PipelineRun {
        let pipeline = Pipeline::new(vec![Stage::new(
            StageRole::AdSpecialist,
            prompts::ad_spec_instructions(assets, Some(strategy), Some(structure)),
        )])
        .expect("single stage has no dependencies");
        self.run_pipeline(&pipeline, cancel).await
    }

    /// The full campaign: strategy, technical structure and ad
    /// specifications as one run, so stages 2 and 3 consume true upstream
    /// outputs rather than re-derivations.
    pub async fn run_campaign(
        &self,
        briefing: &Briefing,
        assets: &[CreativeAsset],
        cancel: &CancellationToken,
    ) -> PipelineRun {
        let pipeline = Pipeline::new(vec![
            Stage::new(StageRole::Strategist, prompts::strategy_instructions(briefing)),
            Stage::new(
                StageRole::CampaignBuilder,
                prompts::structure_instructions(briefing, None),
            )
            .with_dependencies(vec![0]),
            Stage::new(
                StageRole::AdSpecialist,
                prompts::ad_spec_instructions(assets, None, None),
            )
            .with_dependencies(vec![0, 1]),
        ])
        .expect("dependencies follow declaration order");
        self.run_pipeline(&pipeline, cancel).await
    }

    /// Evaluate one creative: one stage, ad specialist.
    pub async fn review_creative(
        &self,
        description: &str,
        format: &str,
        objective: &str,
        cancel: &CancellationToken,
    ) -> PipelineRun {
        let pipeline = Pipeline::new(vec![Stage::new(
            StageRole::AdSpecialist,
            prompts::creative_review_instructions(description, format, objective),
        )])
        .expect("single stage has no dependencies");
        self.run_pipeline(&pipeline, cancel).await
    }
}
