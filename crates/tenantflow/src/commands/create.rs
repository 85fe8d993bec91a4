use crate::utils;
use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use tenantflow_cloud::{PollOutcome, Reconciler, ResourceApi, ResourceKind, ResourceRequest};

pub async fn handle<A: ResourceApi>(
    reconciler: &Reconciler<A>,
    kind: ResourceKind,
    mut params: Value,
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> anyhow::Result<()> {
    utils::expand_params(&mut params, &utils::context_variables(reconciler.context()));
    let request = ResourceRequest::new(kind, params);

    let policy = reconciler
        .table()
        .get(kind)
        .map(|spec| spec.policy)
        .with_context(|| format!("{} の待機設定がありません", kind))?
        .overridden(interval_ms, max_attempts)?;

    println!(
        "{} {} {} を作成中...",
        "▶".blue(),
        kind,
        request.display_key().cyan()
    );

    let outcome = reconciler.create_and_wait_with(&request, policy).await?;

    match outcome {
        PollOutcome::Ready { response, attempts } => {
            println!(
                "{} {} {} の準備が完了しました ({}回確認)",
                "✓".green(),
                kind,
                request.display_key().cyan(),
                attempts
            );
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        PollOutcome::AlreadyExists => {
            println!(
                "{} {} {} は既に存在するためスキップしました",
                "⚠".yellow(),
                kind,
                request.display_key().cyan()
            );
        }
        outcome => {
            // 失敗・タイムアウトはエラーとして返す
            outcome.into_provisioned(&request)?;
        }
    }

    Ok(())
}
