//! # LogMail ドメイン層
//!
//! ログレコードをメールへ変換するための純粋なモデルと整形ロジックを定義する。
//!
//! ## 設計方針
//!
//! - **I/O を持たない**: メール送信やプロセス環境へのアクセスはトレイトの背後に隠す
//! - **全域関数**: 整形関数はどのようなログレコードに対しても失敗しない
//! - **型付きマージ**: メールテンプレートは名前付きフィールド + パススルー用マップで表現する
//!
//! ## 依存関係の方向
//!
//! ```text
//! logmail → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`level`] - ログレベル表と名前解決
//! - [`log_record`] - 入力となるログレコード
//! - [`message`] - メールテンプレートと送信メッセージ
//! - [`environment`] - デプロイ環境名のプロバイダ
//! - [`format`] - 件名・本文の整形
//!
//! ## 使用例
//!
//! ```rust
//! use logmail_domain::{
//!     environment::FixedEnvironment,
//!     format::format_subject,
//!     log_record::LogRecord,
//! };
//!
//! let record = LogRecord {
//!     level: 50,
//!     app: Some("billing".to_string()),
//!     hostname: Some("web-1".to_string()),
//!     ..Default::default()
//! };
//!
//! let subject = format_subject(&record, &FixedEnvironment::named("production"));
//! assert_eq!(subject, "[PRODUCTION-ERROR] billing on web-1");
//! ```

pub mod environment;
pub mod format;
pub mod level;
pub mod log_record;
pub mod message;

pub use environment::{DEFAULT_ENV_VAR, EnvironmentProvider, FixedEnvironment, ProcessEnvironment};
pub use format::{DefaultFormatter, MessageFormatter, format_body, format_subject};
pub use level::{Level, level_name};
pub use log_record::{ErrorInfo, LogRecord};
pub use message::{MessageTemplate, OutgoingMessage};
