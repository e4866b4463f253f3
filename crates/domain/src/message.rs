//! # メールメッセージ
//!
//! 呼び出し側が与えるベーステンプレート（[`MessageTemplate`]）と、
//! ログレコード 1 件ごとに生成される送信メッセージ（[`OutgoingMessage`]）を定義する。
//!
//! ## マージ規則
//!
//! - `subject`: テンプレートに空でない値があればそれを使い、なければ整形結果を使う
//! - `text`: 常に整形結果で上書きする（テンプレートの値は使わない）
//! - その他のフィールドと `extra` はそのまま複製する
//!
//! テンプレート自体は変更せず、書き込みのたびに新しいメッセージを組み立てる。

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{format::MessageFormatter, log_record::LogRecord};

/// メールテンプレート
///
/// シンク 1 インスタンスにつき 1 つ与えられ、以後変更されない。
/// 名前付きフィールドに該当しないキーは `extra` に保持され、トランスポートへそのまま渡る。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    /// 送信元アドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from:     Option<String>,
    /// 宛先（配列またはカンマ区切り文字列）
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub to:       Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub cc:       Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub bcc:      Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// 件名（未設定なら書き込みごとに整形する）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject:  Option<String>,
    /// 本文（書き込み時に必ず上書きされる）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text:     Option<String>,
    /// 追加ヘッダー
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers:  BTreeMap<String, String>,
    /// トランスポート固有のパススルー項目
    #[serde(flatten)]
    pub extra:    serde_json::Map<String, serde_json::Value>,
}

impl MessageTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// 事前設定された件名を返す
    ///
    /// 空文字列は未設定として扱う。
    pub fn preset_subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }
}

/// 送信メッセージ
///
/// 書き込み 1 回につき 1 つ生成され、送信試行後に破棄される。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub from:     Option<String>,
    pub to:       Vec<String>,
    pub cc:       Vec<String>,
    pub bcc:      Vec<String>,
    pub reply_to: Option<String>,
    pub subject:  String,
    pub text:     String,
    pub headers:  BTreeMap<String, String>,
    pub extra:    serde_json::Map<String, serde_json::Value>,
}

impl OutgoingMessage {
    /// テンプレートとログレコードから送信メッセージを組み立てる
    pub fn compose(
        template: &MessageTemplate,
        record: &LogRecord,
        formatter: &dyn MessageFormatter,
    ) -> Self {
        let subject = match template.preset_subject() {
            Some(subject) => subject.to_string(),
            None => formatter.format_subject(record),
        };

        Self {
            from: template.from.clone(),
            to: template.to.clone(),
            cc: template.cc.clone(),
            bcc: template.bcc.clone(),
            reply_to: template.reply_to.clone(),
            subject,
            text: formatter.format_body(record),
            headers: template.headers.clone(),
            extra: template.extra.clone(),
        }
    }

    /// パススルー項目のうち文字列値のものを取り出す
    ///
    /// 空文字列は未設定として扱う。
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// カンマ区切りのアドレス列を分割する
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(list) => split_addresses(&list),
        OneOrMany::Many(addresses) => addresses,
    })
}
