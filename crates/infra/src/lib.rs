//! # LogMail インフラ層
//!
//! メール送信を担当するトランスポートの抽象化と具体実装を提供する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MailTransport`] でメール送信と資源解放を抽象化
//! - **レジストリ**: 設定の `type` 判別子（大文字小文字を区別しない）から
//!   [`transport::create_transport`] が実装を選ぶ。未指定なら sendmail
//! - **構築時の検証**: 未知の種別や不正なオプションは構築時に同期的にエラーを返す
//!
//! ## 依存関係
//!
//! ```text
//! logmail → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`transport`] - トランスポートトレイト、設定、レジストリ、各実装
//! - [`error`] - トランスポートエラー定義
//! - `mock` - テスト用トランスポート（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use logmail_infra::transport::{TransportConfig, create_transport};
//!
//! let config = TransportConfig::new("SMTP")
//!     .with_option("host", "localhost")
//!     .with_option("port", 1025);
//! let transport = create_transport(&config)?;
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod transport;

pub use error::{TransportError, TransportErrorKind};
pub use transport::{
    DeliveryReceipt,
    MailTransport,
    TransportConfig,
    TransportKind,
    create_transport,
};
