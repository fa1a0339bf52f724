//! status command - Classify the repository and print the snapshot

use anyhow::Result;

use super::Session;
use crate::cli::Context;
use crate::ui::output;

/// Detect and print the repository state.
pub async fn status(ctx: &Context, json: bool, no_fetch: bool) -> Result<()> {
    let session = Session::open(ctx).await?;
    let state = session.classifier(!no_fetch).detect().await;

    if json {
        let mut value = serde_json::to_value(&state)?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "fingerprint".to_string(),
                serde_json::Value::String(state.fingerprint().to_string()),
            );
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let verbosity = ctx.verbosity();
    output::print(
        format!("Repository: {}", session.git.work_dir().display()),
        verbosity,
    );
    output::print(output::format_state(&state), verbosity);
    if let Some(default_branch) = &state.platform.default_branch {
        let protected = match state.platform.branch_protected {
            Some(true) => ", protected",
            Some(false) => ", not protected",
            None => "",
        };
        output::print(
            format!("Hub default branch: {}{}", default_branch, protected),
            verbosity,
        );
    }
    Ok(())
}
