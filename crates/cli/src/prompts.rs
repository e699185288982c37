//! Interactive prompts for values not given on the command line

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use sitepilot_core::validate_bucket_name;

/// Name of a bucket that already exists
pub fn prompt_existing_bucket() -> Result<String> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("S3 bucket name")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Bucket name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get bucket name: {}", e))?;

    Ok(name.trim().to_string())
}

/// Name for a bucket that may have to be created, checked against the naming rules
pub fn prompt_new_bucket() -> Result<String> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("New S3 bucket name (lowercase, no underscores)")
        .validate_with(|input: &String| -> Result<(), String> {
            validate_bucket_name(input.trim()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get bucket name: {}", e))?;

    Ok(name.trim().to_string())
}

/// Distribution to invalidate; empty means none
pub fn prompt_distribution_id() -> Result<Option<String>> {
    let id: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("CloudFront distribution id (empty to skip invalidation)")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get distribution id: {}", e))?;

    let id = id.trim();
    Ok((!id.is_empty()).then(|| id.to_string()))
}

/// Last chance before a run that creates billable resources
pub fn confirm_hosting(bucket: &str, region: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Lock '{}' ({}) private and create a CloudFront distribution in front of it?",
            bucket, region
        ))
        .default(true)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to confirm: {}", e))
}
