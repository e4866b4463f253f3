//! # Observability 基盤
//!
//! シンクを組み込むプロセス向けのトレーシング初期化。
//!
//! 送信失敗の `SpanTrace` に `mail_delivery` スパンを記録するには
//! `tracing_error::ErrorLayer` が登録されている必要がある。
//! [`build_subscriber`] はフィルタ・出力層・`ErrorLayer` をまとめた subscriber を返し、
//! [`init_tracing`] はそれをグローバルに登録する。
//!
//! | 環境変数 | 用途 |
//! |---------|------|
//! | `LOG_FORMAT` | `json` / `pretty`（大文字小文字を区別しない。未設定・不正値は `pretty`） |
//! | `RUST_LOG` | フィルタ（未設定なら [`DEFAULT_FILTER`]） |

use strum::EnumString;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,logmail=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// 1 行 1 イベントの JSON（`event.kind` などのドット記法フィールドがそのままキーになる）
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// 環境変数 `LOG_FORMAT` から読み取る
    pub fn from_env() -> Self {
        Self::from_value(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    /// 設定値から読み取る（未設定・不正値は `Pretty`）
    pub fn from_value(value: Option<&str>) -> Self {
        value
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub log_format:     LogFormat,
    /// `RUST_LOG` が未設定のときに使うフィルタ
    pub default_filter: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(LogFormat::default())
    }
}

impl TracingConfig {
    pub fn new(log_format: LogFormat) -> Self {
        Self {
            log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// `LOG_FORMAT` から出力形式を決める
    pub fn from_env() -> Self {
        Self::new(LogFormat::from_env())
    }
}

/// フィルタ・出力層・`ErrorLayer` を登録した subscriber を組み立てる
///
/// テストでは `tracing::subscriber::set_default` でスレッド単位に登録できる。
#[cfg(feature = "observability")]
pub fn build_subscriber(config: &TracingConfig) -> impl tracing::Subscriber + Send + Sync + 'static {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
}

/// subscriber をグローバルに登録する
///
/// 既に登録済みの場合はエラーを返す（panic しない）。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    build_subscriber(config).try_init()
}
