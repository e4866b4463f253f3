//! # 件名・本文の整形
//!
//! ログレコードからメールの件名と本文を生成する。
//!
//! ## 設計方針
//!
//! - **全域関数**: どのようなレコードに対しても失敗せず、欠落フィールドは [`ABSENT`] で埋める
//! - **環境名は毎回読む**: 件名の環境タグは [`EnvironmentProvider`] から呼び出しごとに取得する
//! - **差し替え可能**: シンクは [`MessageFormatter`] 経由で整形するため、インスタンス単位で置き換えられる
//!
//! ## 本文の行順
//!
//! ```text
//! * app: <app>
//! * hostname: <hostname>
//! * pid: <pid>
//! * time: <time>
//! * msg: <msg>              （msg があり空でない場合のみ）
//! * err: <err>              （err がある場合のみ）
//! * err.stack: <err.stack>  （err があり stack が空でない場合のみ）
//! * src: <src>              （src が null・false・0・空文字列でない場合のみ）
//! ```

use std::{fmt::Display, sync::Arc};

use serde_json::Value;

use crate::{
    environment::EnvironmentProvider,
    level::level_name,
    log_record::{ABSENT, LogRecord},
};

/// 環境名が未設定のときの環境タグ
pub const NO_ENV_TAG: &str = "NOENV";

/// `src` を構造表示するときの最大ネスト深さ
pub const MAX_INSPECT_DEPTH: usize = 100;

/// 件名を整形する
///
/// `[<ENV_TAG>-<LEVEL_NAME>] <app> on <hostname>` 形式。
pub fn format_subject(record: &LogRecord, environment: &dyn EnvironmentProvider) -> String {
    let env_tag = environment
        .deployment_env()
        .filter(|env| !env.is_empty())
        .map(|env| env.to_uppercase())
        .unwrap_or_else(|| NO_ENV_TAG.to_string());

    format!(
        "[{env_tag}-{}] {} on {}",
        level_name(record.level),
        or_absent(record.app.as_ref()),
        or_absent(record.hostname.as_ref()),
    )
}

/// 本文を整形する
pub fn format_body(record: &LogRecord) -> String {
    let mut rows = vec![
        format!("* app: {}", or_absent(record.app.as_ref())),
        format!("* hostname: {}", or_absent(record.hostname.as_ref())),
        format!("* pid: {}", or_absent(record.pid.as_ref())),
        format!("* time: {}", or_absent(record.time.as_ref())),
    ];

    if let Some(msg) = record.msg.as_deref().filter(|msg| !msg.is_empty()) {
        rows.push(format!("* msg: {msg}"));
    }

    if let Some(err) = &record.err {
        rows.push(format!("* err: {err}"));

        if let Some(stack) = err.stack.as_deref().filter(|stack| !stack.is_empty()) {
            rows.push(format!("* err.stack: {stack}"));
        }
    }

    if let Some(src) = record.src.as_ref().filter(|src| is_present(src)) {
        rows.push(format!("* src: {}", inspect(src)));
    }

    rows.join("\n")
}

/// 構造化値を入れ子が分かる形で 1 行に表示する
///
/// [`MAX_INSPECT_DEPTH`] を超える入れ子は `[Object]` / `[Array]` に置き換える。
/// オブジェクトのキーは辞書順に並べる。
pub fn inspect(value: &Value) -> String {
    inspect_with_depth(value, MAX_INSPECT_DEPTH)
}

/// 最大深さを指定して構造化値を表示する
pub fn inspect_with_depth(value: &Value, max_depth: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0, max_depth);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize, max_depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(&b.to_string()),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&format!("{s:?}")),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(_) if depth >= max_depth => out.push_str("[Array]"),
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth + 1, max_depth);
            }
            out.push_str(" ]");
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(_) if depth >= max_depth => out.push_str("[Object]"),
        Value::Object(map) => {
            // キーは辞書順
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push_str("{ ");
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_plain_key(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&format!("{key:?}"));
                }
                out.push_str(": ");
                write_value(out, item, depth + 1, max_depth);
            }
            out.push_str(" }");
        }
    }
}

/// `null`・`false`・`0`・空文字列は値なしとみなす
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn or_absent<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| ABSENT.to_string(), ToString::to_string)
}

/// 件名・本文の整形トレイト
///
/// シンクはこのトレイト経由で整形するため、インスタンス単位で整形方法を差し替えられる。
pub trait MessageFormatter: Send + Sync {
    fn format_subject(&self, record: &LogRecord) -> String;

    fn format_body(&self, record: &LogRecord) -> String;
}

/// 標準の整形実装
///
/// [`format_subject`] / [`format_body`] に委譲する。
#[derive(Clone)]
pub struct DefaultFormatter {
    environment: Arc<dyn EnvironmentProvider>,
}

impl DefaultFormatter {
    pub fn new(environment: impl EnvironmentProvider + 'static) -> Self {
        Self {
            environment: Arc::new(environment),
        }
    }

    /// 共有済みの環境プロバイダから作成する
    pub fn from_shared(environment: Arc<dyn EnvironmentProvider>) -> Self {
        Self { environment }
    }
}

impl MessageFormatter for DefaultFormatter {
    fn format_subject(&self, record: &LogRecord) -> String {
        format_subject(record, self.environment.as_ref())
    }

    fn format_body(&self, record: &LogRecord) -> String {
        format_body(record)
    }
}
