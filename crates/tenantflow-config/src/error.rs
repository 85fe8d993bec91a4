use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: tenantflow.local.yaml, .tenantflow.local.yaml, tenantflow.yaml, .tenantflow.yaml\n\
        - ./.tenantflow/ ディレクトリ\n\
        - ~/.config/tenantflow/tenantflow.yaml\n\
        または TENANTFLOW_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("設定ファイルの解析に失敗しました ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("必須の設定 {name} がありません ({hint})")]
    MissingValue {
        name: &'static str,
        hint: &'static str,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
