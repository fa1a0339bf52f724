//! fix command - Apply suggested fixes
//!
//! # Modes
//!
//! - `--auto`: every auto-fixable fix, in priority order, through
//!   [`Doctor::auto_fix`](crate::doctor::Doctor::auto_fix)
//! - `--scenario ID`: only fixes matching the given IDs (a bare `B2`
//!   selects every `B2:<branch>` fix)
//!
//! `--dry-run` validates against the freshly detected state and stops.

use anyhow::{bail, Context as _, Result};

use super::Session;
use crate::cli::Context;
use crate::doctor::{suggest_fixes, AutoFixReport, Fix};
use crate::ui::output::{self, Verbosity};

/// Apply fixes selected by `auto` or `scenarios`.
pub async fn fix(ctx: &Context, auto: bool, scenarios: &[String], dry_run: bool) -> Result<()> {
    let session = Session::open(ctx).await?;
    let state = session.classifier(true).detect().await;
    let fixes = suggest_fixes(&state);
    let doctor = session.doctor();
    let verbosity = ctx.verbosity();

    let selected = if auto {
        fixes.iter().filter(|f| f.auto_fixable()).cloned().collect()
    } else {
        select(&fixes, scenarios)?
    };

    if selected.is_empty() {
        output::print("Nothing to fix.", verbosity);
        return Ok(());
    }

    if dry_run {
        let mut invalid = 0;
        for fix in &selected {
            match doctor.validate_fix(fix, &state).await {
                Ok(()) => output::print(format!("would apply: {}", describe(fix)), verbosity),
                Err(e) => {
                    invalid += 1;
                    output::warn(format!("{}: {}", fix.scenario(), e), verbosity);
                }
            }
        }
        if invalid > 0 {
            bail!("{} fix(es) would fail validation", invalid);
        }
        return Ok(());
    }

    if auto {
        let report = doctor.auto_fix(&state, &fixes).await;
        return finish(&report, verbosity);
    }

    for fix in &selected {
        doctor
            .apply_fix(fix, &state)
            .await
            .with_context(|| format!("fix for {} failed", fix.scenario()))?;
        output::print(format!("applied: {}", describe(fix)), verbosity);
    }
    Ok(())
}

/// Fixes with an operation matching any of `ids`, in priority order.
fn select(fixes: &[Fix], ids: &[String]) -> Result<Vec<Fix>> {
    let mut selected: Vec<Fix> = Vec::new();
    for id in ids {
        let matching: Vec<&Fix> = fixes.iter().filter(|f| f.matches_scenario(id)).collect();
        if matching.is_empty() {
            bail!("no suggested fix for scenario '{}'", id);
        }
        let actionable: Vec<&Fix> = matching
            .iter()
            .copied()
            .filter(|f| f.operation().is_some())
            .collect();
        if actionable.is_empty() {
            let hint = matching
                .iter()
                .find_map(|f| f.command())
                .map(|c| format!("; run `{}` by hand", c))
                .unwrap_or_default();
            bail!("{} cannot be fixed automatically{}", id, hint);
        }
        for fix in actionable {
            if !selected.contains(fix) {
                selected.push(fix.clone());
            }
        }
    }
    selected.sort_by_key(Fix::priority);
    Ok(selected)
}

fn finish(report: &AutoFixReport, verbosity: Verbosity) -> Result<()> {
    for fix in &report.applied {
        output::print(format!("applied: {}", describe(fix)), verbosity);
    }
    for fix in &report.skipped {
        output::print(
            format!("needs attention: {} {}", fix.scenario(), fix.description()),
            verbosity,
        );
    }
    let Some(failed) = &report.failed else {
        return Ok(());
    };
    for fix in &report.not_attempted {
        output::print(format!("not attempted: {}", describe(fix)), verbosity);
    }
    for role in &failed.retry_pending {
        output::warn(
            format!("push to {} failed; it will be suggested again", role),
            verbosity,
        );
    }
    bail!("fix for {} failed: {}", failed.fix.scenario(), failed.error)
}

fn describe(fix: &Fix) -> String {
    match fix.operation() {
        Some(op) => format!("{} ({})", fix.description(), op.describe()),
        None => fix.description().to_string(),
    }
}
