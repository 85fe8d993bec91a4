pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "TENANTFLOW_CONFIG_PATH";

pub const ACCOUNT_ID_ENV: &str = "AWS_ACC_ID";
pub const REGION_ENV: &str = "REGION";
pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const ADMIN_ID_ENV: &str = "QUICKSIGHT_ADMIN_ID";

const CANDIDATES: [&str; 4] = [
    "tenantflow.local.yaml",
    ".tenantflow.local.yaml",
    "tenantflow.yaml",
    ".tenantflow.yaml",
];

/// プロジェクトの設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 TENANTFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: tenantflow.local.yaml, .tenantflow.local.yaml, tenantflow.yaml, .tenantflow.yaml
/// 3. ./.tenantflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/tenantflow/tenantflow.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.tenantflow/ ディレクトリで検索
    let project_dir = current_dir.join(".tenantflow");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("tenantflow").join("tenantflow.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// ステータストークン (数値または文字列)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Code(i64),
    Text(String),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Code(code) => write!(f, "{}", code),
            TokenValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// リソース種別ごとの上書き設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindOverride {
    pub interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    /// 空の場合は標準の成功トークンを使う
    pub success: Vec<TokenValue>,
    /// 空の場合は標準の失敗トークンを使う
    pub failure: Vec<TokenValue>,
}

/// tenantflow の設定
///
/// 優先順位: CLI フラグ > 環境変数 > 設定ファイル
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub admin_id: Option<String>,
    /// キーはリソース種別 (例: `data-set`, `iam-role`)
    pub overrides: BTreeMap<String, KindOverride>,
}

impl Settings {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::parse(content, "<inline>")
    }

    /// 設定ファイルを読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, path: &str) -> Result<Self> {
        // 空ファイルは既定値として扱う
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// 設定ファイルを探して読み込み、環境変数で上書きする
    ///
    /// 設定ファイルが無い場合は環境変数のみを使う
    pub fn discover() -> Result<Self> {
        let settings = match find_config_file() {
            Ok(path) => Self::load(&path)?,
            Err(ConfigError::ConfigFileNotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        Ok(settings.with_env())
    }

    /// 環境変数で上書き
    pub fn with_env(mut self) -> Self {
        if let Some(account_id) = env_value(ACCOUNT_ID_ENV) {
            self.account_id = Some(account_id);
        }
        if let Some(region) = env_value(REGION_ENV).or_else(|| env_value(AWS_REGION_ENV)) {
            self.region = Some(region);
        }
        if let Some(admin_id) = env_value(ADMIN_ID_ENV) {
            self.admin_id = Some(admin_id);
        }
        self
    }

    /// CLI フラグで上書き
    pub fn with_flags(mut self, account_id: Option<String>, region: Option<String>) -> Self {
        if account_id.is_some() {
            self.account_id = account_id;
        }
        if region.is_some() {
            self.region = region;
        }
        self
    }

    pub fn require_account_id(&self) -> Result<&str> {
        self.account_id
            .as_deref()
            .ok_or(ConfigError::MissingValue {
                name: "account_id",
                hint: "--account-id または AWS_ACC_ID",
            })
    }

    pub fn require_region(&self) -> Result<&str> {
        self.region.as_deref().ok_or(ConfigError::MissingValue {
            name: "region",
            hint: "--region または REGION / AWS_REGION",
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
