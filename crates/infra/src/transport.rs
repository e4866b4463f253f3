//! # メールトランスポート
//!
//! 送信メッセージを実際に配送するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MailTransport`] でメール送信と資源解放を抽象化
//! - **5 つの実装**: sendmail（デフォルト）、SMTP、SES、ファイル出力、スタブ
//! - **レジストリ**: [`TransportConfig`] の `type` 判別子を [`TransportKind`] に解決し、
//!   [`create_transport`] で実装を構築する
//!
//! ## 種別とオプション
//!
//! | 種別 | オプション | 受領情報 |
//! |------|-----------|---------|
//! | `sendmail` | `path` | なし |
//! | `smtp` | `host`, `port`, `auth { user, pass }`, `timeoutSecs` | SMTP 応答 |
//! | `ses` | `region`, `accessKeyId`, `secretAccessKey`, `endpointUrl` | メッセージ ID |
//! | `file` | `dir` | メッセージ ID（ファイル名） |
//! | `stub` | `fail` | なし |

mod file;
mod message;
mod sendmail;
mod ses;
mod smtp;
mod stub;

use std::sync::Arc;

use async_trait::async_trait;
pub use file::{FileMailTransport, FileOptions};
use logmail_domain::OutgoingMessage;
pub use message::{build_message, extra_key};
pub use sendmail::{SendmailMailTransport, SendmailOptions};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
pub use ses::{SesMailTransport, SesOptions};
pub use smtp::{SmtpAuth, SmtpMailTransport, SmtpOptions};
use strum::IntoStaticStr;
pub use stub::{StubMailTransport, StubOptions};

use crate::error::TransportError;

/// メール送信トレイト
///
/// シンクはこのトレイト越しにメールを配送する。
/// 1 回の `deliver` は成功（受領情報）か失敗（エラー）のどちらか一方で必ず完了する。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// トランスポート種別
    fn kind(&self) -> TransportKind;

    /// メッセージを配送する
    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError>;

    /// 保持している資源を解放する
    ///
    /// 複数回呼び出しても安全であること。接続はハンドルの破棄時に閉じられるため、
    /// デフォルト実装は何もしない。
    fn release(&self) {}
}

/// トランスポート種別
///
/// `type` 判別子は ASCII の大文字小文字を区別せずに解決する。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportKind {
    /// ローカルの sendmail コマンド
    #[default]
    Sendmail,
    /// SMTP リレー
    Smtp,
    /// Amazon SES v2
    Ses,
    /// `.eml` ファイル出力
    File,
    /// 送信しない（成功または失敗を固定で返す）
    Stub,
}

/// 配送の受領情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// 配送したトランスポート
    pub transport:  TransportKind,
    /// トランスポートが割り当てたメッセージ ID
    pub message_id: Option<String>,
    /// トランスポートの応答（SMTP 応答行など）
    pub response:   Option<String>,
}

impl DeliveryReceipt {
    pub fn new(transport: TransportKind) -> Self {
        Self {
            transport,
            message_id: None,
            response: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

/// トランスポート設定
///
/// `type` 判別子とトランスポート固有のオプションからなる。
/// シンク 1 インスタンスにつき 1 つ与えられ、以後変更されない。
///
/// ```json
/// { "type": "SMTP", "host": "localhost", "port": 1025 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// トランスポート種別（未指定なら sendmail）
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind:    Option<String>,
    /// トランスポート固有のオプション
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl TransportConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind:    Some(kind.into()),
            options: serde_json::Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// `type` 判別子を種別に解決する
    ///
    /// 未指定または空文字列の場合は [`TransportKind::Sendmail`] を返す。
    pub fn resolve_kind(&self) -> Result<TransportKind, TransportError> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") => Ok(TransportKind::default()),
            Some(kind) => kind
                .parse()
                .map_err(|_| TransportError::unknown_transport(kind)),
        }
    }

    /// オプションを種別ごとの型にパースする
    pub fn parse_options<T: DeserializeOwned>(&self, kind: TransportKind) -> Result<T, TransportError> {
        serde_json::from_value(serde_json::Value::Object(self.options.clone()))
            .map_err(|e| TransportError::invalid_options(kind, e))
    }
}

/// 設定からトランスポートを構築する
///
/// 未知の種別・不正なオプションは同期的にエラーを返す。
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
    let kind = config.resolve_kind()?;

    let transport: Arc<dyn MailTransport> = match kind {
        TransportKind::Sendmail => {
            Arc::new(SendmailMailTransport::from_options(config.parse_options(kind)?))
        }
        TransportKind::Smtp => Arc::new(SmtpMailTransport::from_options(config.parse_options(kind)?)?),
        TransportKind::Ses => Arc::new(SesMailTransport::from_options(config.parse_options(kind)?)?),
        TransportKind::File => Arc::new(FileMailTransport::from_options(config.parse_options(kind)?)?),
        TransportKind::Stub => Arc::new(StubMailTransport::from_options(config.parse_options(kind)?)),
    };

    tracing::debug!(transport = %kind, "メールトランスポートを構築しました");
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::error::TransportErrorKind;

    #[rstest]
    #[case("sendmail", TransportKind::Sendmail)]
    #[case("SENDMAIL", TransportKind::Sendmail)]
    #[case("smtp", TransportKind::Smtp)]
    #[case("SMTP", TransportKind::Smtp)]
    #[case("Ses", TransportKind::Ses)]
    #[case("file", TransportKind::File)]
    #[case("sTuB", TransportKind::Stub)]
    fn test_種別は大文字小文字を区別せずに解決する(
        #[case] input: &str,
        #[case] expected: TransportKind,
    ) {
        assert_eq!(TransportConfig::new(input).resolve_kind().unwrap(), expected);
    }

    #[test]
    fn test_種別未指定ならsendmailを使う() {
        assert_eq!(
            TransportConfig::default().resolve_kind().unwrap(),
            TransportKind::Sendmail
        );
        assert_eq!(
            TransportConfig::new("").resolve_kind().unwrap(),
            TransportKind::Sendmail
        );
    }

    #[test]
    fn test_未知の種別はエラー() {
        let err = TransportConfig::new("pigeon").resolve_kind().unwrap_err();

        assert!(matches!(
            err.kind(),
            TransportErrorKind::UnknownTransport(kind) if kind == "pigeon"
        ));
    }

    #[test]
    fn test_種別の文字列表現はsnake_case() {
        assert_eq!(TransportKind::Sendmail.to_string(), "sendmail");
        assert_eq!(TransportKind::from_str("FILE").unwrap(), TransportKind::File);
    }

    #[test]
    fn test_設定をjsonから読み込める() {
        let config: TransportConfig =
            serde_json::from_value(json!({"type": "SMTP", "host": "mail.local", "port": 2525}))
                .unwrap();

        assert_eq!(config.kind.as_deref(), Some("SMTP"));
        assert_eq!(config.options.get("host"), Some(&json!("mail.local")));
        assert!(!config.options.contains_key("type"));
    }

    #[test]
    fn test_create_transportは種別に応じた実装を返す() {
        let transport = create_transport(&TransportConfig::new("stub")).unwrap();
        assert_eq!(transport.kind(), TransportKind::Stub);

        let transport = create_transport(
            &TransportConfig::new("smtp")
                .with_option("host", "localhost")
                .with_option("port", 1025),
        )
        .unwrap();
        assert_eq!(transport.kind(), TransportKind::Smtp);

        let transport = create_transport(&TransportConfig::default()).unwrap();
        assert_eq!(transport.kind(), TransportKind::Sendmail);
    }

    #[test]
    fn test_create_transportは未知の種別で構築エラーを返す() {
        let result = create_transport(&TransportConfig::new("carrier-pigeon"));

        let err = result.err().unwrap();
        assert!(err.is_construction());
    }

    #[test]
    fn test_create_transportは不正なオプションで構築エラーを返す() {
        let result = create_transport(&TransportConfig::new("smtp").with_option("port", "not-a-port"));

        let err = result.err().unwrap();
        assert!(matches!(
            err.kind(),
            TransportErrorKind::InvalidOptions { transport, .. } if transport == "smtp"
        ));
    }

    #[test]
    fn test_未知のオプションキーは構築エラー() {
        let result = create_transport(&TransportConfig::new("stub").with_option("fial", true));

        assert!(result.err().unwrap().is_construction());
    }

    #[test]
    fn test_delivery_receiptのビルダー() {
        let receipt = DeliveryReceipt::new(TransportKind::Smtp)
            .with_message_id("abc")
            .with_response("250 OK");

        assert_eq!(receipt.message_id.as_deref(), Some("abc"));
        assert_eq!(receipt.response.as_deref(), Some("250 OK"));
    }
}
