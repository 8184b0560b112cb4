use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, StageError};

/// Which worker a stage targets.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    Strategist,
    CampaignBuilder,
    AdSpecialist,
}

impl StageRole {
    /// Heading under which this stage's output is spliced into downstream
    /// prompts.
    pub fn context_label(self) -> &'static str {
        match self {
            Self::Strategist => "CAMPAIGN STRATEGY",
            Self::CampaignBuilder => "TECHNICAL STRUCTURE",
            Self::AdSpecialist => "AD SPECIFICATIONS",
        }
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strategist => "strategist",
            Self::CampaignBuilder => "campaign_builder",
            Self::AdSpecialist => "ad_specialist",
        };
        f.write_str(name)
    }
}

/// One unit of pipeline work: static instructions, a target worker, and the
/// indices of upstream stages whose outputs feed this one.
#[derive(Clone, Debug)]
pub struct Stage {
    pub role: StageRole,
    pub instructions: String,
    pub depends_on: Vec<usize>,
}

impl Stage {
    pub fn new(role: StageRole, instructions: impl Into<String>) -> Self {
        Self {
            role,
            instructions: instructions.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, depends_on: Vec<usize>) -> Self {
        self.depends_on = depends_on;
        self
    }
}

/// An ordered sequence of stages, executed strictly in declaration order.
///
/// Dependencies are checked at construction: a stage may only consume
/// outputs of stages declared before it.
#[derive(Clone, Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Result<Self, EngineError> {
        for (index, stage) in stages.iter().enumerate() {
            for &dependency in &stage.depends_on {
                if dependency >= index {
                    return Err(EngineError::InvalidDependency { stage: index, dependency });
                }
            }
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render the prompt for one stage: its instructions followed by each
    /// declared upstream output, verbatim, under the upstream stage's
    /// context label.
    pub fn render_prompt(&self, index: usize, outputs: &[String]) -> String {
        let stage = &self.stages[index];
        let mut prompt = stage.instructions.clone();
        for &dependency in &stage.depends_on {
            prompt.push_str("\n\n");
            prompt.push_str(self.stages[dependency].role.context_label());
            prompt.push_str(":\n");
            prompt.push_str(&outputs[dependency]);
        }
        prompt
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Completed,
    Failed,
}

/// One execution of a pipeline. Outputs are appended in execution order and
/// stay readable after a failure; the error is the failing stage's,
/// unchanged.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    outputs: Vec<String>,
    state: RunState,
    error: Option<StageError>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            state: RunState::Running,
            error: None,
        }
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<&str> {
        self.outputs.get(index).map(String::as_str)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    pub(crate) fn push_output(&mut self, text: String) {
        self.outputs.push(text);
    }

    pub(crate) fn complete(&mut self) {
        self.state = RunState::Completed;
    }

    pub(crate) fn fail(&mut self, error: StageError) {
        self.state = RunState::Failed;
        self.error = Some(error);
    }

    /// Move the run into a task result: completed outputs, or the stage
    /// error for the task cell to record.
    pub fn into_result(self) -> Result<Vec<String>, StageError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.outputs),
        }
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adflow_core::errors::BackendError;

    #[test]
    fn rejects_forward_dependency() {
        let result = Pipeline::new(vec![
            Stage::new(StageRole::Strategist, "a").with_dependencies(vec![1]),
            Stage::new(StageRole::CampaignBuilder, "b"),
        ]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidDependency { stage: 0, dependency: 1 })
        ));
    }

    #[test]
    fn rejects_self_dependency() {
        let result = Pipeline::new(vec![
            Stage::new(StageRole::Strategist, "a"),
            Stage::new(StageRole::CampaignBuilder, "b").with_dependencies(vec![1]),
        ]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidDependency { stage: 1, dependency: 1 })
        ));
    }

    #[test]
    fn accepts_backward_dependencies() {
        let pipeline = Pipeline::new(vec![
            Stage::new(StageRole::Strategist, "a"),
            Stage::new(StageRole::CampaignBuilder, "b").with_dependencies(vec![0]),
            Stage::new(StageRole::AdSpecialist, "c").with_dependencies(vec![0, 1]),
        ])
        .unwrap();
        assert_eq!(pipeline.len(), 3);
    }

    #[test]
    fn render_splices_upstream_outputs_verbatim() {
        let pipeline = Pipeline::new(vec![
            Stage::new(StageRole::Strategist, "develop a strategy"),
            Stage::new(StageRole::CampaignBuilder, "build the structure").with_dependencies(vec![0]),
            Stage::new(StageRole::AdSpecialist, "specify the ads").with_dependencies(vec![0, 1]),
        ])
        .unwrap();

        let outputs = vec!["THE STRATEGY TEXT".to_string(), "THE STRUCTURE TEXT".to_string()];

        let second = pipeline.render_prompt(1, &outputs);
        assert!(second.starts_with("build the structure"));
        assert!(second.contains("CAMPAIGN STRATEGY:\nTHE STRATEGY TEXT"));

        let third = pipeline.render_prompt(2, &outputs);
        assert!(third.contains("CAMPAIGN STRATEGY:\nTHE STRATEGY TEXT"));
        assert!(third.contains("TECHNICAL STRUCTURE:\nTHE STRUCTURE TEXT"));
    }

    #[test]
    fn render_without_dependencies_is_instructions_only() {
        let pipeline =
            Pipeline::new(vec![Stage::new(StageRole::Strategist, "just the briefing")]).unwrap();
        assert_eq!(pipeline.render_prompt(0, &[]), "just the briefing");
    }

    #[test]
    fn run_keeps_outputs_after_failure() {
        let mut run = PipelineRun::new();
        run.push_output("stage zero output".into());
        run.fail(StageError {
            stage: 1,
            role: StageRole::CampaignBuilder,
            source: BackendError::Rejected("bad".into()),
        });

        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(run.outputs().len(), 1);
        assert_eq!(run.output(0), Some("stage zero output"));
        assert_eq!(run.error().unwrap().stage, 1);
    }

    #[test]
    fn into_result_splits_on_error() {
        let mut ok = PipelineRun::new();
        ok.push_output("a".into());
        ok.complete();
        assert_eq!(ok.into_result().unwrap(), vec!["a".to_string()]);

        let mut failed = PipelineRun::new();
        failed.fail(StageError {
            stage: 0,
            role: StageRole::Strategist,
            source: BackendError::Cancelled,
        });
        assert!(failed.into_result().is_err());
    }
}
