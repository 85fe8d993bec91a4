use crate::utils;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use tenantflow_cloud::{ProvisionPlan, Reconciler, ResourceApi};

pub async fn load_plan(path: &Path) -> anyhow::Result<ProvisionPlan> {
    ProvisionPlan::load(path)
        .await
        .with_context(|| format!("プランファイルを読み込めません: {}", path.display()))
}

pub async fn handle<A: ResourceApi>(
    reconciler: &Reconciler<A>,
    mut plan: ProvisionPlan,
) -> anyhow::Result<()> {
    if plan.is_empty() {
        println!("{}", "適用するステップがありません".yellow());
        return Ok(());
    }

    let variables = utils::context_variables(reconciler.context());
    for step in &mut plan.steps {
        utils::expand_params(&mut step.params, &variables);
    }

    println!(
        "{} {}件のステップを適用します",
        "▶".blue(),
        plan.steps.len()
    );
    println!();

    let result = reconciler.apply(&plan).await;

    for step in &result.succeeded {
        println!(
            "  {} {} ({}, {}回確認)",
            "✓".green(),
            step.step_id.cyan(),
            step.message,
            step.attempts
        );
    }
    for step in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            step.step_id.cyan(),
            step.error.as_deref().unwrap_or("unknown error")
        );
    }
    for step_id in &result.skipped {
        println!("  {} {} (スキップ)", "-".dimmed(), step_id);
    }

    println!();
    println!(
        "{} ({}ms)",
        result.summary().to_string().bold(),
        result.duration_ms
    );

    if !result.is_success() {
        anyhow::bail!("プランの適用に失敗しました");
    }
    Ok(())
}
