use crate::core::state::{AnalysisResult, GenerationProgress, RunSnapshot};
use crate::services::analysis::StoryAnalyzer;
use crate::services::context::resolve_character_context;
use crate::services::image::{validate_aspect_ratio, ImageClient};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

/// Recorded on a scene when generation fails. The underlying cause goes
/// to the log only; sibling scenes are unaffected.
pub const GENERATION_FAILED_MESSAGE: &str = "Image generation failed";

/// Drives one full run: analysis, then one image request per scene in
/// strict list order. The manager owns the scene list for the duration of
/// the run; observers receive immutable snapshots over the event stream.
pub struct WorkflowManager {
    analyzer: StoryAnalyzer,
    image: Box<dyn ImageClient>,
    events: Option<mpsc::UnboundedSender<RunSnapshot>>,
}

impl WorkflowManager {
    pub fn new(analyzer: StoryAnalyzer, image: Box<dyn ImageClient>) -> Self {
        Self {
            analyzer,
            image,
            events: None,
        }
    }

    /// One snapshot per scene transition. The run never blocks on a
    /// consumer; a dropped receiver is silently tolerated.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RunSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn emit(&self, progress: GenerationProgress, result: &AnalysisResult) {
        if let Some(events) = &self.events {
            let _ = events.send(RunSnapshot {
                progress,
                scenes: result.scenes.clone(),
            });
        }
    }

    /// Runs the whole pipeline over one story. The returned value is the
    /// authoritative final state; every scene in it is terminal.
    pub async fn run(&mut self, raw_text: &str, aspect_ratio: &str) -> Result<AnalysisResult> {
        validate_aspect_ratio(aspect_ratio)?;
        if raw_text.trim().is_empty() {
            anyhow::bail!("Story text is empty");
        }

        // 1. Analyze. A failure here aborts the run before any scene work;
        //    there is no partial state to clean up.
        println!("Analyzing story...");
        let mut result = self
            .analyzer
            .analyze(raw_text)
            .await
            .context("Story analysis failed")?;

        // 2. Whatever status the analysis step set, every scene starts over.
        for scene in &mut result.scenes {
            scene.reset();
        }

        let mut progress = GenerationProgress {
            current: 0,
            total: result.scenes.len(),
        };
        self.emit(progress, &result);

        println!("Generating images ({} scenes)...", result.scenes.len());
        let pb = ProgressBar::new(result.scenes.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        // 3. Strictly sequential, in analysis order. One request in flight
        //    at a time; a failed scene must not take the rest of the batch
        //    down with it.
        for i in 0..result.scenes.len() {
            result.scenes[i].begin_generation();
            self.emit(progress, &result);

            let character_context =
                resolve_character_context(&result.scenes[i].present_characters, &result.characters);

            let outcome = self
                .image
                .generate(
                    &result.scenes[i].refined_prompt,
                    &character_context,
                    &result.visual_style,
                    aspect_ratio,
                )
                .await;

            let scene = &mut result.scenes[i];
            match outcome {
                Ok(payload) if !payload.is_empty() => scene.complete(payload),
                Ok(_) => {
                    log::warn!("Scene {} returned an empty image payload", scene.id);
                    scene.fail(GENERATION_FAILED_MESSAGE);
                }
                Err(err) => {
                    log::warn!("Scene {} generation failed: {:#}", scene.id, err);
                    scene.fail(GENERATION_FAILED_MESSAGE);
                }
            }

            progress.current += 1;
            pb.inc(1);
            self.emit(progress, &result);
        }

        pb.finish_with_message("Generation complete");
        Ok(result)
    }
}
