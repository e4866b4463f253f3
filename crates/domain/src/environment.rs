//! # Environment（デプロイ環境名プロバイダ）
//!
//! 件名整形でのプロセス環境変数の直接参照を置き換え、
//! テストで環境名を注入可能にするための抽象化。
//!
//! 件名を整形するたびに読み直すため、実装側でキャッシュしてはならない。

/// 環境変数のデフォルト名
pub const DEFAULT_ENV_VAR: &str = "APP_ENV";

/// デプロイ環境名を提供するトレイト
pub trait EnvironmentProvider: Send + Sync {
    /// 環境名を返す（未設定の場合は `None`）
    fn deployment_env(&self) -> Option<String>;
}

/// プロセスの環境変数を読む実装
#[derive(Debug, Clone)]
pub struct ProcessEnvironment {
    var_name: String,
}

impl ProcessEnvironment {
    /// 任意の環境変数名で作成する
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }

    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl Default for ProcessEnvironment {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_VAR)
    }
}

impl EnvironmentProvider for ProcessEnvironment {
    fn deployment_env(&self) -> Option<String> {
        std::env::var(&self.var_name).ok()
    }
}

/// 固定の環境名を返すテスト用実装
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    value: Option<String>,
}

impl FixedEnvironment {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }

    /// 環境名を設定した状態で作成する
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()))
    }

    /// 環境名が未設定の状態で作成する
    pub fn unset() -> Self {
        Self::new(None)
    }
}

impl EnvironmentProvider for FixedEnvironment {
    fn deployment_env(&self) -> Option<String> {
        self.value.clone()
    }
}
