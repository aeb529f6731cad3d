use crate::core::state::AnalysisResult;
use crate::services::llm::LlmClient;
use anyhow::{Context, Result};

const SYSTEM_PROMPT: &str =
    "You are a storyboard assistant for illustrated fiction. Return only valid JSON.";

/// Turns raw narrative text into an [`AnalysisResult`] through one LLM
/// call: character sheet, a single visual style, and the ordered scene
/// list the workflow will generate images for.
pub struct StoryAnalyzer {
    llm: Box<dyn LlmClient>,
}

impl StoryAnalyzer {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_prompt(text: &str) -> String {
        format!(
            "Read the following story and break it into a sequence of illustrated scenes.\n\
            \n\
            Return a JSON object with exactly this shape:\n\
            {{ \"characters\": [ {{ \"name\": \"...\", \"description\": \"...\" }} ], \
            \"visualStyle\": \"...\", \
            \"scenes\": [ {{ \"id\": \"...\", \"originalText\": \"...\", \"refinedPrompt\": \"...\", \"presentCharacters\": [\"...\"] }} ] }}\n\
            \n\
            Rules:\n\
            - \"characters\": every recurring character, each with a visual description \
            (age, build, hair, clothing) detailed enough to draw them the same way in every scene.\n\
            - \"visualStyle\": one style descriptor for the whole story.\n\
            - \"scenes\": the story in reading order. \"originalText\" is the verbatim excerpt the scene \
            comes from, \"refinedPrompt\" is a self-contained illustration instruction for that scene, \
            \"presentCharacters\" lists the names of characters in it.\n\
            - Each scene must describe a single drawable moment.\n\
            \n\
            Story:\n{}",
            text
        )
    }

    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let response = self
            .llm
            .chat(SYSTEM_PROMPT, &Self::build_prompt(text))
            .await?;

        let clean_json = strip_code_blocks(&response);
        let mut result: AnalysisResult = serde_json::from_str(&clean_json)
            .context(format!("Failed to parse analysis JSON: {}", clean_json))?;

        if result.scenes.is_empty() {
            anyhow::bail!("Analysis returned no scenes");
        }

        // The model sometimes echoes status fields back; every scene starts
        // pending regardless.
        for scene in &mut result.scenes {
            scene.reset();
        }

        Ok(result)
    }
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}
