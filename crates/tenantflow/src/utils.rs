use anyhow::Context;
use colored::Colorize;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tenantflow_cloud::{
    AccountContext, ProbeTable, Reconciler, ResourceApi, ResourceKind, StatusToken,
};
use tenantflow_cloud_aws::{AwsCli, AwsResourceApi};
use tenantflow_config::{Settings, TokenValue};

static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*env\.(\w+)\s*\}\}").expect("valid env pattern"));

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid variable pattern"));

/// 設定ファイル・環境変数・CLIフラグを合成
pub fn load_settings(account_id: Option<String>, region: Option<String>) -> anyhow::Result<Settings> {
    let settings = Settings::discover()?.with_flags(account_id, region);
    tracing::debug!(
        "Settings: account={:?} region={:?} overrides={}",
        settings.account_id,
        settings.region,
        settings.overrides.len()
    );
    Ok(settings)
}

pub fn account_context(settings: &Settings) -> anyhow::Result<AccountContext> {
    let context = AccountContext::new(settings.require_account_id()?, settings.require_region()?);
    Ok(match &settings.admin_id {
        Some(admin) => context.with_admin(admin),
        None => context,
    })
}

fn status_token(value: &TokenValue) -> StatusToken {
    match value {
        TokenValue::Code(code) => StatusToken::Code(*code),
        TokenValue::Text(text) => StatusToken::Text(Cow::Owned(text.clone())),
    }
}

/// 標準のディスパッチテーブルに設定ファイルの上書きを適用
pub fn probe_table(settings: &Settings) -> anyhow::Result<ProbeTable> {
    let mut table = ProbeTable::standard();

    for (name, kind_override) in &settings.overrides {
        let kind: ResourceKind = name
            .parse()
            .with_context(|| format!("overrides.{} が不正です", name))?;

        if kind_override.interval_ms.is_some() || kind_override.max_attempts.is_some() {
            let current = table
                .get(kind)
                .map(|spec| spec.policy)
                .with_context(|| format!("{} の待機設定がありません", kind))?;
            let policy = current
                .overridden(kind_override.interval_ms, kind_override.max_attempts)
                .with_context(|| format!("overrides.{} が不正です", name))?;
            table.set_policy(kind, policy);
        }

        table.set_tokens(
            kind,
            kind_override.success.iter().map(status_token).collect(),
            kind_override.failure.iter().map(status_token).collect(),
        );
    }

    Ok(table)
}

/// AWS プロバイダーを準備し、認証を確認
pub async fn connect(
    settings: &Settings,
    profile: Option<&str>,
) -> anyhow::Result<Reconciler<AwsResourceApi>> {
    let context = account_context(settings)?;
    let table = probe_table(settings)?;
    let api = match profile {
        Some(profile) => AwsResourceApi::with_cli(
            AwsCli::new(Some(context.region.clone())).with_profile(profile),
        ),
        None => AwsResourceApi::new(context.region.clone()),
    };

    let auth = api.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "AWS の認証に失敗しました: {}",
            auth.error.unwrap_or_default()
        );
    }
    if let Some(info) = &auth.account_info {
        tracing::debug!("Authenticated as {}", info);
    }

    Ok(Reconciler::with_table(api, table, context))
}

/// 作成パラメータを読み込む (`-` は標準入力)
pub async fn read_params(source: &str) -> anyhow::Result<Value> {
    let (content, is_yaml) = if source == "-" {
        let content = tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
            .await?
            .context("標準入力を読み込めません")?;
        (content, false)
    } else {
        let path = Path::new(source);
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("パラメータファイルを読み込めません: {}", source))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        (content, is_yaml)
    };

    let params: Value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("パラメータを解析できません: {}", source))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("パラメータを解析できません: {}", source))?
    };

    if !params.is_object() {
        anyhow::bail!("パラメータはオブジェクトである必要があります: {}", source);
    }
    Ok(params)
}

/// アカウント情報から展開用の変数を作る
pub fn context_variables(context: &AccountContext) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("account_id".to_string(), context.account_id.clone());
    variables.insert("region".to_string(), context.region.clone());
    if let Some(admin) = &context.admin_id {
        variables.insert("admin_id".to_string(), admin.clone());
    }
    if let Some(arn) = context.admin_arn() {
        variables.insert("admin_arn".to_string(), arn);
    }
    variables
}

/// パラメータ内のすべての文字列で変数を展開
pub fn expand_params(params: &mut Value, variables: &HashMap<String, String>) {
    match params {
        Value::String(s) => {
            let expanded = expand_variables(s, variables);
            *s = expanded;
        }
        Value::Array(items) => {
            for item in items {
                expand_params(item, variables);
            }
        }
        Value::Object(map) => {
            for value in map.values_mut() {
                expand_params(value, variables);
            }
        }
        _ => {}
    }
}

/// 変数を展開する ({{ VAR_NAME }} 形式)
pub fn expand_variables(value: &str, variables: &HashMap<String, String>) -> String {
    // まず {{ env.XXX }} パターンを展開（ローカル環境変数から取得）
    let result = ENV_PATTERN.replace_all(value, |caps: &regex::Captures| {
        let env_var_name = &caps[1];
        match std::env::var(env_var_name) {
            Ok(val) => val,
            Err(_) => {
                eprintln!("    ⚠ 環境変数 {} が見つかりません", env_var_name.yellow());
                caps[0].to_string() // 展開失敗時は元のまま
            }
        }
    });

    // 次にアカウント情報の変数を展開
    VAR_PATTERN
        .replace_all(&result, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match variables.get(var_name) {
                Some(val) => val.clone(),
                None => {
                    eprintln!("    ⚠ 変数 {} が未定義です", var_name.yellow());
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tenantflow_config::KindOverride;

    fn context() -> AccountContext {
        AccountContext::new("123456789012", "ap-southeast-1").with_admin("ops-admin")
    }

    #[test]
    fn test_expand_variables_basic() {
        let variables = context_variables(&context());

        assert_eq!(
            expand_variables("arn:aws:quicksight:{{ region }}:{{account_id}}:namespace/acme", &variables),
            "arn:aws:quicksight:ap-southeast-1:123456789012:namespace/acme"
        );
        assert_eq!(
            expand_variables("{{ admin_arn }}", &variables),
            "arn:aws:quicksight:ap-southeast-1:123456789012:user/default/ops-admin"
        );
        assert_eq!(
            expand_variables("No variables here", &variables),
            "No variables here"
        );
    }

    #[test]
    fn test_expand_variables_env_pattern() {
        let variables = HashMap::new();

        temp_env::with_var("TENANTFLOW_TEST_DATASET", Some("emissions"), || {
            assert_eq!(
                expand_variables("{{ env.TENANTFLOW_TEST_DATASET }}-dataset", &variables),
                "emissions-dataset"
            );
        });
    }

    #[test]
    fn test_expand_variables_undefined_kept() {
        let variables = HashMap::new();
        assert_eq!(expand_variables("{{ tenant }}", &variables), "{{ tenant }}");
    }

    #[test]
    fn test_expand_params_nested() {
        let mut params = json!({
            "AwsAccountId": "{{ account_id }}",
            "DashboardId": "acme-dashboard",
            "Permissions": [
                { "Principal": "{{ admin_arn }}", "Actions": ["quicksight:DescribeDashboard"] }
            ],
            "VersionNumber": 1
        });

        expand_params(&mut params, &context_variables(&context()));

        assert_eq!(params["AwsAccountId"], "123456789012");
        assert_eq!(
            params["Permissions"][0]["Principal"],
            "arn:aws:quicksight:ap-southeast-1:123456789012:user/default/ops-admin"
        );
        assert_eq!(params["VersionNumber"], 1);
    }

    #[test]
    fn test_account_context_requires_values() {
        let settings = Settings {
            region: Some("ap-southeast-1".to_string()),
            ..Default::default()
        };
        assert!(account_context(&settings).is_err());

        let settings = Settings {
            account_id: Some("123456789012".to_string()),
            region: Some("ap-southeast-1".to_string()),
            admin_id: Some("ops-admin".to_string()),
            ..Default::default()
        };
        assert_eq!(account_context(&settings).unwrap(), context());
    }

    #[test]
    fn test_probe_table_overrides() {
        let mut settings = Settings::default();
        settings.overrides.insert(
            "data-set".to_string(),
            KindOverride {
                interval_ms: Some(250),
                max_attempts: Some(8),
                ..Default::default()
            },
        );
        settings.overrides.insert(
            "dashboard".to_string(),
            KindOverride {
                success: vec![
                    TokenValue::Text("CREATION_SUCCESSFUL".to_string()),
                    TokenValue::Text("UPDATE_SUCCESSFUL".to_string()),
                ],
                ..Default::default()
            },
        );

        let table = probe_table(&settings).unwrap();

        let data_set = table.get(ResourceKind::DataSet).unwrap();
        assert_eq!(data_set.policy.interval, Duration::from_millis(250));
        assert_eq!(data_set.policy.max_attempts, 8);

        let dashboard = table.get(ResourceKind::Dashboard).unwrap();
        assert_eq!(dashboard.success.len(), 2);
        assert_eq!(
            dashboard.failure,
            vec![
                StatusToken::text("CREATION_FAILED"),
                StatusToken::text("NON_RETRYABLE_FAILURE")
            ]
        );
    }

    #[test]
    fn test_probe_table_rejects_bad_overrides() {
        let mut settings = Settings::default();
        settings
            .overrides
            .insert("widget".to_string(), KindOverride::default());
        assert!(probe_table(&settings).is_err());

        let mut settings = Settings::default();
        settings.overrides.insert(
            "iam-role".to_string(),
            KindOverride {
                max_attempts: Some(0),
                ..Default::default()
            },
        );
        assert!(probe_table(&settings).is_err());
    }
}
