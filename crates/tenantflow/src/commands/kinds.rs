use colored::Colorize;
use tenantflow_cloud::{ProbeTable, StatusToken};

fn join_tokens(tokens: &[StatusToken]) -> String {
    if tokens.is_empty() {
        return "-".to_string();
    }
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn handle(table: &ProbeTable) {
    println!("{}", "対応リソース種別:".bold());
    println!();

    for (kind, spec) in table.iter() {
        let operation = kind.operation();
        let name = format!("{:<13}", kind.as_str());

        match operation.describe {
            Some(describe) if !spec.is_create_only() => {
                println!(
                    "  {} {} {} → {}",
                    name.cyan(),
                    operation.service,
                    operation.create,
                    describe
                );
                println!(
                    "  {:<13} 成功: {}  失敗: {}  間隔: {}ms × {}回",
                    "",
                    join_tokens(&spec.success).green(),
                    join_tokens(&spec.failure).red(),
                    spec.policy.interval.as_millis(),
                    spec.policy.max_attempts
                );
            }
            _ => {
                println!(
                    "  {} {} {} {}",
                    name.cyan(),
                    operation.service,
                    operation.create,
                    "(作成のみ)".dimmed()
                );
            }
        }
    }
}
