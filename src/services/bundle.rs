use crate::core::state::ScenePrompt;
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;

pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Decodes an embedded image payload. Accepts a bare base64 string or a
/// `data:image/<ext>;base64,<data>` URL; the extension falls back to png.
pub fn decode_image_payload(payload: &str) -> Result<DecodedImage> {
    let (header, data) = match payload.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => (header, data),
        _ => ("", payload),
    };

    let extension = header
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split(';').next())
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
        .to_string();

    let bytes = STANDARD
        .decode(data.trim())
        .context("Failed to decode base64 image payload")?;
    if bytes.is_empty() {
        bail!("Image payload is empty");
    }

    Ok(DecodedImage { bytes, extension })
}

/// Packages every completed scene into one gzipped tar archive.
///
/// Entries are named `scene-<n>.<ext>` with `n` renumbered densely over
/// the completed subset, in scene-list order: a failed scene leaves no
/// gap in the archive names. Nothing is written for a run with zero
/// completed scenes; that is an error, not an empty archive.
pub fn bundle_completed_scenes(scenes: &[ScenePrompt]) -> Result<Vec<u8>> {
    let completed: Vec<&ScenePrompt> = scenes.iter().filter(|scene| scene.has_image()).collect();
    if completed.is_empty() {
        bail!("No completed scenes to bundle");
    }

    let mut archive = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (index, scene) in completed.iter().enumerate() {
        let payload = scene.image_url.as_deref().unwrap_or_default();
        let image = decode_image_payload(payload)
            .with_context(|| format!("Scene {} has an unreadable image payload", scene.id))?;

        // Zeroed header metadata keeps the archive byte-identical across
        // calls on the same scene list.
        let mut header = tar::Header::new_gnu();
        header.set_size(image.bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        let name = format!("scene-{}.{}", index + 1, image.extension);
        archive.append_data(&mut header, &name, image.bytes.as_slice())?;
    }

    let encoder = archive.into_inner()?;
    Ok(encoder.finish()?)
}

/// Filename and raw bytes for a single completed scene. Unlike the
/// bundle, the name keeps the scene's original 1-based display index.
pub fn export_scene(scene: &ScenePrompt, display_index: usize) -> Result<(String, Vec<u8>)> {
    if !scene.has_image() {
        bail!("Scene {} has no completed image to export", scene.id);
    }

    let image = decode_image_payload(scene.image_url.as_deref().unwrap_or_default())?;
    Ok((
        format!("scene-{}.{}", display_index, image.extension),
        image.bytes,
    ))
}
