//! # 送信結果イベント
//!
//! 書き込み 1 回につき、[`SinkEvent::MailSent`] か [`SinkEvent::Error`] の
//! どちらか一方がちょうど 1 回、すべての購読者に通知される。
//!
//! 購読者ごとに上限なしのチャネルを持つため、受信が遅れてもイベントは失われない。
//! 受信側を破棄した購読者は次の通知時に取り除かれる。

use std::sync::{Arc, Mutex, PoisonError};

use logmail_infra::{DeliveryReceipt, TransportError};
use strum::IntoStaticStr;
use tokio::sync::mpsc;

/// シンクが通知するイベント
///
/// 購読者ごとに複製して配信するため `Clone` を実装する。
/// エラーは `Clone` できないので `Arc` で共有する。
#[derive(Debug, Clone, IntoStaticStr)]
pub enum SinkEvent {
    /// 配送に失敗した
    #[strum(serialize = "error")]
    Error(Arc<TransportError>),
    /// 配送に成功した
    #[strum(serialize = "mailSent")]
    MailSent(DeliveryReceipt),
}

impl SinkEvent {
    /// イベント名（`error` / `mailSent`）
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// 失敗イベントならエラーを返す
    pub fn error(&self) -> Option<&TransportError> {
        match self {
            Self::Error(error) => Some(error),
            Self::MailSent(_) => None,
        }
    }

    /// 成功イベントなら受領情報を返す
    pub fn receipt(&self) -> Option<&DeliveryReceipt> {
        match self {
            Self::MailSent(receipt) => Some(receipt),
            Self::Error(_) => None,
        }
    }
}

/// イベントの受信側
pub type EventReceiver = mpsc::UnboundedReceiver<SinkEvent>;

/// 購読者の一覧とイベントの配信
#[derive(Debug, Default)]
pub(crate) struct EventHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SinkEvent>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// 全購読者に配信し、受け取った購読者の数を返す
    pub(crate) fn publish(&self, event: &SinkEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<SinkEvent>>> {
        // 配信中に panic しても一覧自体は壊れない
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use logmail_infra::TransportKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn イベント名はerrorとmailsent() {
        let sent = SinkEvent::MailSent(DeliveryReceipt::new(TransportKind::Stub));
        let failed = SinkEvent::Error(Arc::new(TransportError::released()));

        assert_eq!(sent.name(), "mailSent");
        assert_eq!(failed.name(), "error");
    }

    #[test]
    fn 失敗イベントからエラーを取り出せる() {
        let event = SinkEvent::Error(Arc::new(TransportError::unexpected("boom")));

        assert!(event.is_error());
        assert!(event.receipt().is_none());
        assert_eq!(event.error().map(ToString::to_string).as_deref(), Some("予期しないエラー: boom"));
    }

    #[test]
    fn 全購読者に同じイベントを配信する() {
        let hub = EventHub::default();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let reached = hub.publish(&SinkEvent::Error(Arc::new(TransportError::released())));

        assert_eq!(reached, 2);
        assert!(first.try_recv().unwrap().is_error());
        assert!(second.try_recv().unwrap().is_error());
    }

    #[test]
    fn 破棄された受信側は取り除く() {
        let hub = EventHub::default();
        let kept = hub.subscribe();
        drop(hub.subscribe());

        let reached = hub.publish(&SinkEvent::MailSent(DeliveryReceipt::new(TransportKind::Stub)));

        assert_eq!(reached, 1);
        drop(kept);
        assert_eq!(hub.publish(&SinkEvent::MailSent(DeliveryReceipt::new(TransportKind::Stub))), 0);
    }

    #[test]
    fn 購読者がいなければ0を返す() {
        let hub = EventHub::default();

        assert_eq!(hub.publish(&SinkEvent::Error(Arc::new(TransportError::released()))), 0);
    }
}
