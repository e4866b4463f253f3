//! # トランスポートエラー定義
//!
//! トランスポートの構築とメール送信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: lettre の各エラー型をラップ
//! - **構築エラーと送信エラーの区別**: [`TransportError::is_construction`] で判定できる
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`TransportError`]: エラー種別（[`TransportErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`TransportErrorKind`]: エラーの具体的な種別（UnknownTransport, Smtp, Released 等）

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// トランスポートで発生するエラー
///
/// エラー種別（[`TransportErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](TransportError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     TransportErrorKind::UnknownTransport(kind) => { /* 設定の見直し */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct TransportError {
    kind:       TransportErrorKind,
    span_trace: SpanTrace,
}

/// トランスポートエラーの種別
#[derive(Debug, Error)]
pub enum TransportErrorKind {
    /// 未知のトランスポート種別
    ///
    /// `type` 判別子がレジストリに登録されていない場合。構築時に発生する。
    #[error("未知のトランスポート種別です: {0:?}（sendmail, smtp, ses, file, stub のいずれか）")]
    UnknownTransport(String),

    /// トランスポートオプションが不正
    ///
    /// 型の不一致、未知のキー、必須項目の欠落など。構築時に発生する。
    #[error("{transport} トランスポートの設定が不正です: {reason}")]
    InvalidOptions {
        /// トランスポート種別
        transport: String,
        /// 不正の内容
        reason:    String,
    },

    /// メールアドレスが不正
    #[error("メールアドレスが不正です: {0}")]
    Address(#[source] lettre::address::AddressError),

    /// メッセージの構築に失敗
    ///
    /// 送信元や宛先の欠落など、lettre がメッセージを組み立てられない場合。
    #[error("メッセージの構築に失敗: {0}")]
    Message(#[source] lettre::error::Error),

    /// メッセージの内容が不正
    ///
    /// ヘッダー名の不正など、lettre を介さずに検出したもの。
    #[error("メッセージの内容が不正です: {0}")]
    InvalidMessage(String),

    /// SMTP 送信エラー
    #[error("SMTP 送信失敗: {0}")]
    Smtp(#[source] lettre::transport::smtp::Error),

    /// sendmail 実行エラー
    #[error("sendmail 送信失敗: {0}")]
    Sendmail(#[source] lettre::transport::sendmail::Error),

    /// ファイル出力エラー
    #[error("ファイル出力失敗: {0}")]
    File(#[source] lettre::transport::file::Error),

    /// スタブトランスポートが失敗を返した
    #[error("スタブ送信失敗: {0}")]
    Stub(#[source] lettre::transport::stub::Error),

    /// SES エラー
    ///
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("SES 送信失敗: {0}")]
    Ses(String),

    /// トランスポートは解放済み
    ///
    /// `close()` 後のシンクへの書き込みで発生する。
    #[error("トランスポートは解放済みです")]
    Released,

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== TransportError のメソッド =====

impl TransportError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 構築時のエラー（未知の種別・不正なオプション）かどうか
    pub fn is_construction(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::UnknownTransport(_) | TransportErrorKind::InvalidOptions { .. }
        )
    }

    /// TransportError を分解して TransportErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (TransportErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    // ===== Convenience constructors =====

    fn capture(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    /// 未知のトランスポート種別エラーを生成する
    pub fn unknown_transport(kind: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::UnknownTransport(kind.into()))
    }

    /// 不正なオプションエラーを生成する
    pub fn invalid_options(transport: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::capture(TransportErrorKind::InvalidOptions {
            transport: transport.to_string(),
            reason:    reason.to_string(),
        })
    }

    /// 不正なメッセージエラーを生成する
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::InvalidMessage(msg.into()))
    }

    /// SES エラーを生成する
    pub fn ses(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::Ses(msg.into()))
    }

    /// 解放済みエラーを生成する
    pub fn released() -> Self {
        Self::capture(TransportErrorKind::Released)
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::capture(TransportErrorKind::Unexpected(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<lettre::address::AddressError> for TransportError {
    fn from(source: lettre::address::AddressError) -> Self {
        Self::capture(TransportErrorKind::Address(source))
    }
}

impl From<lettre::error::Error> for TransportError {
    fn from(source: lettre::error::Error) -> Self {
        Self::capture(TransportErrorKind::Message(source))
    }
}

impl From<lettre::transport::smtp::Error> for TransportError {
    fn from(source: lettre::transport::smtp::Error) -> Self {
        Self::capture(TransportErrorKind::Smtp(source))
    }
}

impl From<lettre::transport::sendmail::Error> for TransportError {
    fn from(source: lettre::transport::sendmail::Error) -> Self {
        Self::capture(TransportErrorKind::Sendmail(source))
    }
}

impl From<lettre::transport::file::Error> for TransportError {
    fn from(source: lettre::transport::file::Error) -> Self {
        Self::capture(TransportErrorKind::File(source))
    }
}

impl From<lettre::transport::stub::Error> for TransportError {
    fn from(source: lettre::transport::stub::Error) -> Self {
        Self::capture(TransportErrorKind::Stub(source))
    }
}
