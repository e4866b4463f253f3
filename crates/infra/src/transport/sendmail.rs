//! sendmail トランスポート実装
//!
//! lettre の `AsyncSendmailTransport` を使用し、ローカルの sendmail コマンドに
//! メッセージを渡す。種別が未指定のときのデフォルト。

use async_trait::async_trait;
use lettre::{AsyncSendmailTransport, AsyncTransport, Tokio1Executor};
use logmail_domain::OutgoingMessage;
use serde::Deserialize;

use super::{DeliveryReceipt, MailTransport, TransportKind, build_message};
use crate::error::TransportError;

/// sendmail トランスポートのオプション
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendmailOptions {
    /// sendmail コマンドのパス（未指定なら `sendmail`）
    #[serde(default)]
    pub path: Option<String>,
}

/// sendmail トランスポート
pub struct SendmailMailTransport {
    transport: AsyncSendmailTransport<Tokio1Executor>,
}

impl SendmailMailTransport {
    /// オプションから sendmail トランスポートを作成する
    ///
    /// コマンドの存在は送信時まで確認しない。
    pub fn from_options(options: SendmailOptions) -> Self {
        let transport = match options.path {
            Some(path) => AsyncSendmailTransport::<Tokio1Executor>::new_with_command(path),
            None => AsyncSendmailTransport::<Tokio1Executor>::new(),
        };

        Self { transport }
    }
}

#[async_trait]
impl MailTransport for SendmailMailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sendmail
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        let email = build_message(message)?;

        self.transport.send(email).await?;

        Ok(DeliveryReceipt::new(TransportKind::Sendmail))
    }
}
