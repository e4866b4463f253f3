//! # ログレコード
//!
//! シンクへの入力となる構造化ログ。bunyan 形式の JSON 行からデシリアライズできる。
//!
//! ## 寛容な扱い
//!
//! `app` / `hostname` / `pid` / `time` は本来必須だが、欠けていてもエラーにはしない。
//! 整形時には [`ABSENT`] として表示される。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// 欠落フィールドの表示値
pub const ABSENT: &str = "-";

/// ログレコード
///
/// 外部で生成され、シンクからは読み取り専用で扱う。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRecord {
    /// ログレベル（整数コード）
    #[serde(default)]
    pub level:    i64,
    /// アプリケーション名（bunyan の `name` も受け付ける）
    #[serde(default, alias = "name")]
    pub app:      Option<String>,
    /// ホスト名
    #[serde(default)]
    pub hostname: Option<String>,
    /// プロセス ID
    #[serde(default)]
    pub pid:      Option<u32>,
    /// 記録時刻
    #[serde(default)]
    pub time:     Option<DateTime<Utc>>,
    /// メッセージ
    #[serde(default)]
    pub msg:      Option<String>,
    /// エラー情報
    #[serde(default)]
    pub err:      Option<ErrorInfo>,
    /// 呼び出し元情報などの任意の構造化値
    #[serde(default)]
    pub src:      Option<serde_json::Value>,
}

impl LogRecord {
    /// 現在のプロセスと時刻でレコードを作成する
    pub fn new(level: Level, app: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            level: level.code(),
            app: Some(app.into()),
            hostname: Some(hostname.into()),
            pid: Some(std::process::id()),
            time: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// JSON 1 行からレコードを読み込む
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_err(mut self, err: ErrorInfo) -> Self {
        self.err = Some(err);
        self
    }

    pub fn with_src(mut self, src: serde_json::Value) -> Self {
        self.src = Some(src);
        self
    }
}

/// エラー情報
///
/// 文字列表現は `name: message` 形式。`stack` は本文で別の行として出力される。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub name:    Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack:   Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// 任意のエラーから作成する
    ///
    /// `source()` の連鎖は 1 行 1 要因で `stack` に格納する。
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let causes: Vec<String> = std::iter::successors(error.source(), |e| e.source())
            .map(|cause| format!("caused by: {cause}"))
            .collect();

        Self {
            name:    None,
            message: Some(error.to_string()),
            stack:   (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.message) {
            (Some(name), Some(message)) => write!(f, "{name}: {message}"),
            (None, Some(message)) => f.write_str(message),
            (Some(name), None) => f.write_str(name),
            (None, None) => f.write_str("Error"),
        }
    }
}
