//! スタブトランスポート実装
//!
//! メールを実際に送信せず、固定の結果（成功または失敗）を返す。
//! 通知を無効化したい環境やシンクの動作確認に使用する。

use async_trait::async_trait;
use lettre::{AsyncTransport, transport::stub::AsyncStubTransport};
use logmail_domain::OutgoingMessage;
use serde::Deserialize;

use super::{DeliveryReceipt, MailTransport, TransportKind, build_message};
use crate::error::TransportError;

/// スタブトランスポートのオプション
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StubOptions {
    /// `true` なら常に送信失敗を返す
    #[serde(default)]
    pub fail: bool,
}

/// スタブトランスポート
pub struct StubMailTransport {
    transport: AsyncStubTransport,
}

impl StubMailTransport {
    pub fn from_options(options: StubOptions) -> Self {
        let transport = if options.fail {
            AsyncStubTransport::new_error()
        } else {
            AsyncStubTransport::new_ok()
        };

        Self { transport }
    }

    /// 受け付けたメッセージ数
    pub async fn accepted(&self) -> usize {
        self.transport.messages().await.len()
    }
}

#[async_trait]
impl MailTransport for StubMailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stub
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        let email = build_message(message)?;

        self.transport.send(email).await?;

        tracing::info!(
            to = ?message.to,
            subject = %message.subject,
            "Stub: メール送信をスキップ"
        );
        Ok(DeliveryReceipt::new(TransportKind::Stub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;

    fn outgoing() -> OutgoingMessage {
        OutgoingMessage {
            from: Some("alerts@example.com".to_string()),
            to: vec!["ops@example.com".to_string()],
            subject: "テスト件名".to_string(),
            text: "テスト".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn 成功モードでは受領情報を返す() {
        let transport = StubMailTransport::from_options(StubOptions::default());

        let receipt = transport.deliver(&outgoing()).await.unwrap();

        assert_eq!(receipt.transport, TransportKind::Stub);
        assert_eq!(transport.accepted().await, 1);
    }

    #[tokio::test]
    async fn 失敗モードではスタブエラーを返す() {
        let transport = StubMailTransport::from_options(StubOptions { fail: true });

        let err = transport.deliver(&outgoing()).await.err().unwrap();

        assert!(matches!(err.kind(), TransportErrorKind::Stub(_)));
    }
}
