//! ファイル出力トランスポート実装
//!
//! lettre の `AsyncFileTransport` を使用し、メッセージを指定ディレクトリに
//! `<message-id>.eml` として保存する。ローカル検証や監査用途向け。

use std::path::PathBuf;

use async_trait::async_trait;
use lettre::{AsyncFileTransport, AsyncTransport, Tokio1Executor};
use logmail_domain::OutgoingMessage;
use serde::Deserialize;

use super::{DeliveryReceipt, MailTransport, TransportKind, build_message};
use crate::error::TransportError;

/// ファイル出力トランスポートのオプション
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileOptions {
    /// 出力先ディレクトリ（存在すること）
    pub dir: PathBuf,
}

/// ファイル出力トランスポート
pub struct FileMailTransport {
    transport: AsyncFileTransport<Tokio1Executor>,
    dir:       PathBuf,
}

impl FileMailTransport {
    /// オプションからファイル出力トランスポートを作成する
    ///
    /// 出力先がディレクトリでなければ構築エラーを返す。
    pub fn from_options(options: FileOptions) -> Result<Self, TransportError> {
        if !options.dir.is_dir() {
            return Err(TransportError::invalid_options(
                TransportKind::File,
                format!("出力先ディレクトリが存在しません: {}", options.dir.display()),
            ));
        }

        Ok(Self {
            transport: AsyncFileTransport::<Tokio1Executor>::new(&options.dir),
            dir:       options.dir,
        })
    }

    /// 出力先ディレクトリ
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl MailTransport for FileMailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::File
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        let email = build_message(message)?;

        let id = self.transport.send(email).await?;

        Ok(DeliveryReceipt::new(TransportKind::File).with_message_id(id))
    }
}
