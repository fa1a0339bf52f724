//! fixes command - List suggested fixes

use anyhow::Result;

use super::Session;
use crate::cli::Context;
use crate::doctor::suggest_fixes;
use crate::ui::output;

/// Detect, then print the suggested fixes in priority order.
pub async fn fixes(ctx: &Context, json: bool) -> Result<()> {
    let session = Session::open(ctx).await?;
    let state = session.classifier(true).detect().await;
    let fixes = suggest_fixes(&state);

    if json {
        println!("{}", serde_json::to_string_pretty(&fixes)?);
        return Ok(());
    }

    let verbosity = ctx.verbosity();
    if fixes.is_empty() {
        output::print("Nothing to fix.", verbosity);
        return Ok(());
    }
    for fix in &fixes {
        output::print(output::format_fix(fix), verbosity);
    }
    Ok(())
}
