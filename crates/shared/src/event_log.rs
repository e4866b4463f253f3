//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! 既存の `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。呼び出し側のクレートは `tracing` に依存すること。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.transport`: 送信に使用したトランスポート種別
/// - `mail.subject`: 送信したメールの件名
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const MAIL: &str = "mail";
    }

    /// イベントアクション
    pub mod action {
        pub const MAIL_SENT: &str = "mail.sent";
        pub const MAIL_FAILED: &str = "mail.failed";
        pub const SINK_OPENED: &str = "sink.opened";
        pub const SINK_CLOSED: &str = "sink.closed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// メールトランスポート（SMTP、sendmail、SES 等）
        pub const TRANSPORT: &str = "transport";
    }

    /// エラー種別
    pub mod kind {
        pub const DELIVERY: &str = "delivery";
        /// 購読者がいない状態で発生した送信失敗
        pub const UNHANDLED_DELIVERY: &str = "unhandled_delivery";
        pub const RELEASED: &str = "released";
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::{error, event};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines(&self) -> Vec<Value> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn json_subscriber(captured: &Captured) -> impl tracing::Subscriber + Send + Sync {
        let writer = captured.clone();
        tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(move || writer.clone())
            .finish()
    }

    #[test]
    fn test_log_business_eventマクロが展開できる() {
        // subscriber 未設定でも呼び出せること（出力は破棄される）
        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_SENT,
            event.result = event::result::SUCCESS,
            "テストイベント"
        );
    }

    #[test]
    fn test_ビジネスイベントはマーカー付きのフラットなキーで出力される() {
        let captured = Captured::default();

        tracing::subscriber::with_default(json_subscriber(&captured), || {
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_FAILED,
                event.result = event::result::FAILURE,
                error.category = error::category::TRANSPORT,
                error.kind = error::kind::RELEASED,
                "メール送信に失敗"
            );
        });

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["event.kind"], "business_event");
        assert_eq!(line["event.action"], "mail.failed");
        assert_eq!(line["event.result"], "failure");
        assert_eq!(line["error.category"], "transport");
        assert_eq!(line["error.kind"], "released");
    }
}
