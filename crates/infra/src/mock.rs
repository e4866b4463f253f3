//! # テスト用モックトランスポート
//!
//! シンクのテストで使用するインメモリのトランスポート。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! logmail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use logmail_domain::OutgoingMessage;

use crate::{
    error::TransportError,
    transport::{DeliveryReceipt, MailTransport, TransportKind},
};

// ===== MockTransport =====

/// 送信したメッセージを記録するモック
///
/// `fail` を指定すると記録したうえで常に失敗を返す。
#[derive(Clone, Default)]
pub struct MockTransport {
    sent:     Arc<Mutex<Vec<OutgoingMessage>>>,
    released: Arc<AtomicUsize>,
    fail:     Option<String>,
    delay:    Option<Duration>,
}

impl MockTransport {
    /// 常に成功するモック
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に失敗するモック
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail: Some(reason.into()),
            ..Self::default()
        }
    }

    /// 配送完了までの遅延を設定する
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 配送を試みたメッセージ
    pub fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// `release()` が呼ばれた回数
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stub
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        let sequence = sent.len();
        drop(sent);

        match &self.fail {
            Some(reason) => Err(TransportError::unexpected(reason.clone())),
            None => Ok(DeliveryReceipt::new(TransportKind::Stub)
                .with_message_id(format!("mock-{sequence}"))
                .with_response("250 accepted")),
        }
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
