use anyhow::Result;
use novel2storyboard::core::config::Config;
use novel2storyboard::services::analysis::StoryAnalyzer;
use novel2storyboard::services::bundle::{bundle_completed_scenes, export_scene};
use novel2storyboard::services::image::{create_image_client, DEFAULT_ASPECT_RATIO};
use novel2storyboard::services::llm::create_llm;
use novel2storyboard::services::setup;
use novel2storyboard::services::workflow::WorkflowManager;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM and image settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Interactive Setup (Aspect Ratio Selection)
    setup::run_setup(&mut config)?;
    let aspect_ratio = config
        .image
        .aspect_ratio
        .clone()
        .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());

    // 3. Initialize Collaborators
    let llm = create_llm(&config)?;
    let image = create_image_client(&config)?;

    let mut manager = WorkflowManager::new(StoryAnalyzer::new(llm), image);

    // 4. One story file = one run.
    let mut stories = Vec::new();
    let mut dir = tokio::fs::read_dir(&config.input_folder).await?;
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "txt") {
            stories.push(path);
        }
    }
    stories.sort();

    if stories.is_empty() {
        println!("No .txt stories found in '{}'.", config.input_folder);
        return Ok(());
    }

    for path in stories {
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let stem = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        println!("Processing story: {}", filename);
        let raw_text = tokio::fs::read_to_string(&path).await?;

        let result = match manager.run(&raw_text, &aspect_ratio).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Story '{}' failed: {:#}", filename, e);
                continue;
            }
        };

        for scene in &result.scenes {
            if let Some(error) = &scene.error {
                log::warn!("Scene {}: {}", scene.id, error);
            }
        }

        // Individual scene images keep their original display index.
        let story_dir = Path::new(&config.output_folder).join(&stem);
        tokio::fs::create_dir_all(&story_dir).await?;

        for (i, scene) in result.scenes.iter().enumerate() {
            if !scene.has_image() {
                continue;
            }
            match export_scene(scene, i + 1) {
                Ok((name, bytes)) => tokio::fs::write(story_dir.join(name), bytes).await?,
                Err(e) => log::warn!("Skipping export of scene {}: {:#}", scene.id, e),
            }
        }

        if result.scenes.iter().any(|scene| scene.has_image()) {
            match bundle_completed_scenes(&result.scenes) {
                Ok(archive) => {
                    let bundle_path = Path::new(&config.output_folder)
                        .join(format!("{}-storyboard.tar.gz", stem));
                    tokio::fs::write(&bundle_path, archive).await?;
                    println!("Story complete: {:?}", bundle_path);
                }
                Err(e) => log::error!("Bundling '{}' failed: {:#}", filename, e),
            }
        } else {
            log::warn!("No scenes completed for '{}'; nothing to bundle.", filename);
        }
    }

    println!("All stories processed!");
    Ok(())
}
