//! SMTP トランスポート実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! TLS なしで接続するため、Mailpit などのローカル SMTP や社内リレー向け。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use logmail_domain::OutgoingMessage;
use serde::Deserialize;

use super::{DeliveryReceipt, MailTransport, TransportKind, build_message};
use crate::error::TransportError;

/// SMTP トランスポートのオプション
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SmtpOptions {
    /// SMTP サーバーのホスト名
    #[serde(default = "default_host")]
    pub host:         String,
    /// SMTP サーバーのポート番号
    #[serde(default = "default_port")]
    pub port:         u16,
    /// 認証情報
    #[serde(default)]
    pub auth:         Option<SmtpAuth>,
    /// コマンドごとのタイムアウト（秒）
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// SMTP 認証情報
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    25
}

impl Default for SmtpOptions {
    fn default() -> Self {
        Self {
            host:         default_host(),
            port:         default_port(),
            auth:         None,
            timeout_secs: None,
        }
    }
}

/// SMTP トランスポート
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host:      String,
    port:      u16,
}

impl SmtpMailTransport {
    /// オプションから SMTP トランスポートを作成する
    ///
    /// 接続は最初の送信時に確立される。
    pub fn from_options(options: SmtpOptions) -> Result<Self, TransportError> {
        if options.host.trim().is_empty() {
            return Err(TransportError::invalid_options(
                TransportKind::Smtp,
                "host が空です",
            ));
        }

        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&options.host)
            .port(options.port);

        if let Some(auth) = options.auth {
            builder = builder.credentials(Credentials::new(auth.user, auth.pass));
        }
        if let Some(secs) = options.timeout_secs {
            builder = builder.timeout(Some(Duration::from_secs(secs)));
        }

        Ok(Self {
            transport: builder.build(),
            host:      options.host,
            port:      options.port,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Smtp
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        let email = build_message(message)?;

        let response = self.transport.send(email).await?;

        let response_line = format!(
            "{} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        );
        Ok(DeliveryReceipt::new(TransportKind::Smtp).with_response(response_line))
    }

    /// 解放の記録のみ行う
    ///
    /// lettre の接続は最後の `Arc` が破棄された時点で閉じられる。
    /// 配送中のタスクが残っていれば、その完了後に閉じる。
    fn release(&self) {
        tracing::debug!(
            host = %self.host,
            port = self.port,
            "SMTP トランスポートを解放"
        );
    }
}
