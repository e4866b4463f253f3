//! # LogMail
//!
//! 構造化ログレコードをメールに整形し、設定可能なトランスポートで送信する書き込み先（シンク）。
//!
//! ## 処理の流れ
//!
//! ```text
//! LogRecord ─→ 件名・本文の整形 ─→ テンプレートとマージ ─→ MailTransport::deliver
//!                                                           │
//!                                   SinkEvent::MailSent ←───┤（成功）
//!                                   SinkEvent::Error    ←───┘（失敗）
//! ```
//!
//! ## 設計方針
//!
//! - **1 レコード 1 メール**: 書き込みごとに新しい送信メッセージを組み立てる
//! - **非同期の結果通知**: 送信結果は戻り値ではなく [`SinkEvent`] として通知する
//! - **構築時の検証**: トランスポートの種別・オプションの誤りは構築時にエラーを返す
//!
//! ## モジュール構成
//!
//! - [`sink`] - [`LogMailSink`] 本体とビルダー
//! - [`event`] - 送信結果の通知イベント
//! - [`config`] - 環境変数からの設定読み込み
//!
//! ## 使用例
//!
//! ```rust,no_run
//! use logmail::{LogMailSink, SinkEvent};
//! use logmail_domain::{Level, LogRecord, MessageTemplate};
//! use logmail_infra::TransportConfig;
//!
//! # async fn run() -> Result<(), logmail_infra::TransportError> {
//! let template = MessageTemplate::new()
//!     .with_from("alerts@example.com")
//!     .with_to("oncall@example.com");
//! let transport = TransportConfig::new("smtp").with_option("host", "localhost");
//!
//! let mut sink = LogMailSink::new(template, transport)?;
//! let mut events = sink.subscribe();
//!
//! sink.write(&LogRecord::new(Level::Error, "billing", "web-1").with_msg("charge failed"));
//!
//! if let Some(SinkEvent::Error(error)) = events.recv().await {
//!     eprintln!("送信失敗: {error}");
//! }
//! sink.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod event;
pub mod sink;

pub use config::{ConfigError, SinkConfig};
pub use event::{EventReceiver, SinkEvent};
pub use sink::{LogMailSink, LogMailSinkBuilder};
