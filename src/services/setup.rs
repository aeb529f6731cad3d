use crate::core::config::Config;
use crate::services::image::{DEFAULT_ASPECT_RATIO, SUPPORTED_ASPECT_RATIOS};
use anyhow::Result;
use inquire::Select;

/// One-time choices persisted back into config.yml. Currently only the
/// aspect ratio; unattended runs fall back to the default instead of
/// prompting.
pub fn run_setup(config: &mut Config) -> Result<()> {
    let mut needs_save = false;

    if config.image.aspect_ratio.is_none() {
        if config.unattended {
            config.image.aspect_ratio = Some(DEFAULT_ASPECT_RATIO.to_string());
        } else {
            let choice = Select::new(
                "Select the aspect ratio for generated scenes:",
                SUPPORTED_ASPECT_RATIOS.to_vec(),
            )
            .prompt()?;
            config.image.aspect_ratio = Some(choice.to_string());
        }
        needs_save = true;
    }

    if needs_save {
        config.save()?;
    }

    Ok(())
}
