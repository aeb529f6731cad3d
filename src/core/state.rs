use serde::{Deserialize, Serialize};

/// A recurring character and the visual description that keeps its
/// appearance consistent across generated scenes. Produced once by the
/// analysis step and read-only afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CharacterInfo {
    pub name: String,
    pub description: String,
}

/// Lifecycle of a single scene's generation attempt.
///
/// Legal transitions: `Pending -> Generating -> {Completed, Error}`.
/// The terminal states absorb; a scene is never retried within a run.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Error,
}

impl SceneStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Error)
    }

    pub fn can_transition_to(self, next: SceneStatus) -> bool {
        matches!(
            (self, next),
            (SceneStatus::Pending, SceneStatus::Generating)
                | (SceneStatus::Generating, SceneStatus::Completed)
                | (SceneStatus::Generating, SceneStatus::Error)
        )
    }
}

/// One unit of narrative text mapped to exactly one generated image.
///
/// `id`, `original_text`, `refined_prompt` and `present_characters` are
/// assigned by analysis and never change. `status`, `image_url` and
/// `error` are driven by the workflow: `image_url` is populated if and
/// only if the scene is `Completed`, `error` if and only if it is `Error`.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScenePrompt {
    pub id: String,
    pub original_text: String,
    pub refined_prompt: String,
    #[serde(default)]
    pub present_characters: Vec<String>,
    #[serde(default)]
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenePrompt {
    /// Back to the initial state, dropping any previous outcome. Also used
    /// to override whatever status the analysis step may have set.
    pub fn reset(&mut self) {
        self.status = SceneStatus::Pending;
        self.image_url = None;
        self.error = None;
    }

    pub fn begin_generation(&mut self) {
        debug_assert!(self.status.can_transition_to(SceneStatus::Generating));
        self.status = SceneStatus::Generating;
    }

    pub fn complete(&mut self, payload: String) {
        debug_assert!(self.status.can_transition_to(SceneStatus::Completed));
        self.status = SceneStatus::Completed;
        self.image_url = Some(payload);
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        debug_assert!(self.status.can_transition_to(SceneStatus::Error));
        self.status = SceneStatus::Error;
        self.error = Some(message.into());
        self.image_url = None;
    }

    /// Completed with a usable payload; the bundler's selection criterion.
    pub fn has_image(&self) -> bool {
        self.status == SceneStatus::Completed
            && self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Everything the analysis step extracts from one story. Owned by the
/// workflow for the rest of the run; only the scenes' mutable fields
/// change after creation.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub characters: Vec<CharacterInfo>,
    pub visual_style: String,
    pub scenes: Vec<ScenePrompt>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationProgress {
    pub current: usize,
    pub total: usize,
}

/// Immutable view of a run after one scene transition. The workflow owns
/// the mutable scene list; observers only ever see these clones.
#[derive(Clone, Debug)]
pub struct RunSnapshot {
    pub progress: GenerationProgress,
    pub scenes: Vec<ScenePrompt>,
}
