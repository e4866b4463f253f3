//! SES トランスポート実装
//!
//! AWS SES v2 API を使用してメールを送信する。
//! クライアントは構築時にオプションから同期的に組み立てる。
//!
//! テンプレートのパススルー項目のうち `configurationSetName` を
//! SES の設定セット名として渡す。カスタムヘッダーは送らない。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
    operation::send_email::builders::SendEmailFluentBuilder,
    types::{Body, Content, Destination, EmailContent, Message},
};
use logmail_domain::OutgoingMessage;
use serde::Deserialize;

use super::{DeliveryReceipt, MailTransport, TransportKind};
use crate::error::TransportError;

/// 設定セット名を指定する `extra` のキー
pub const CONFIGURATION_SET_NAME: &str = "configurationSetName";

/// SES トランスポートのオプション
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SesOptions {
    /// AWS リージョン
    pub region:            String,
    /// アクセスキー ID（未指定なら送信時に資格情報エラーとなる）
    #[serde(default)]
    pub access_key_id:     Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// エンドポイント URL（LocalStack などのエミュレータ向け）
    #[serde(default)]
    pub endpoint_url:      Option<String>,
}

impl std::fmt::Debug for SesOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesOptions")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// SES トランスポート
///
/// `aws_sdk_sesv2::Client` をラップする。
pub struct SesMailTransport {
    client: Client,
}

impl SesMailTransport {
    /// 構築済みのクライアントから作成する
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// オプションから SES トランスポートを作成する
    pub fn from_options(options: SesOptions) -> Result<Self, TransportError> {
        if options.region.trim().is_empty() {
            return Err(TransportError::invalid_options(
                TransportKind::Ses,
                "region が空です",
            ));
        }

        let mut builder = aws_sdk_sesv2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(options.region));

        if let Some(endpoint_url) = options.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        match (options.access_key_id, options.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                builder = builder.credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    None,
                    None,
                    "logmail",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(TransportError::invalid_options(
                    TransportKind::Ses,
                    "accessKeyId と secretAccessKey は両方指定する必要があります",
                ));
            }
        }

        Ok(Self::new(Client::from_conf(builder.build())))
    }
}

#[async_trait]
impl MailTransport for SesMailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Ses
    }

    async fn deliver(&self, message: &OutgoingMessage) -> Result<DeliveryReceipt, TransportError> {
        let output = self
            .prepare(message)?
            .send()
            .await
            .map_err(|e| TransportError::ses(DisplayErrorContext(&e).to_string()))?;

        let receipt = DeliveryReceipt::new(TransportKind::Ses);
        Ok(match output.message_id() {
            Some(message_id) => receipt.with_message_id(message_id),
            None => receipt,
        })
    }
}

impl SesMailTransport {
    /// 送信リクエストを組み立てる
    fn prepare(&self, message: &OutgoingMessage) -> Result<SendEmailFluentBuilder, TransportError> {
        let from = message
            .from
            .as_deref()
            .ok_or_else(|| TransportError::invalid_message("送信元アドレスがありません"))?;
        if message.to.is_empty() {
            return Err(TransportError::invalid_message("宛先アドレスがありません"));
        }

        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .set_cc_addresses((!message.cc.is_empty()).then(|| message.cc.clone()))
            .set_bcc_addresses((!message.bcc.is_empty()).then(|| message.bcc.clone()))
            .build();

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(
                        Content::builder()
                            .data(&message.subject)
                            .charset("UTF-8")
                            .build()
                            .map_err(|e| TransportError::ses(format!("件名構築失敗: {e}")))?,
                    )
                    .body(
                        Body::builder()
                            .text(
                                Content::builder()
                                    .data(&message.text)
                                    .charset("UTF-8")
                                    .build()
                                    .map_err(|e| {
                                        TransportError::ses(format!("テキスト本文構築失敗: {e}"))
                                    })?,
                            )
                            .build(),
                    )
                    .build(),
            )
            .build();

        let mut request = self
            .client
            .send_email()
            .from_email_address(from)
            .destination(destination)
            .content(content);
        if let Some(reply_to) = &message.reply_to {
            request = request.reply_to_addresses(reply_to);
        }
        if let Some(configuration_set) = message.extra_str(CONFIGURATION_SET_NAME) {
            request = request.configuration_set_name(configuration_set);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::TransportErrorKind;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SesMailTransport>();
    }

    #[test]
    fn regionは必須() {
        let result = serde_json::from_value::<SesOptions>(json!({"accessKeyId": "AKIA"}));

        assert!(result.is_err());
    }

    #[test]
    fn 資格情報の片方だけの指定は構築エラー() {
        let options = SesOptions {
            region:            "ap-northeast-1".to_string(),
            access_key_id:     Some("AKIA".to_string()),
            secret_access_key: None,
            endpoint_url:      None,
        };

        let err = SesMailTransport::from_options(options).err().unwrap();

        assert!(err.is_construction());
    }

    #[test]
    fn debug出力はシークレットを隠す() {
        let options = SesOptions {
            region:            "ap-northeast-1".to_string(),
            access_key_id:     Some("AKIA".to_string()),
            secret_access_key: Some("very-secret".to_string()),
            endpoint_url:      None,
        };

        assert!(!format!("{options:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn 送信元がなければ送信前にエラーを返す() {
        let transport = SesMailTransport::from_options(SesOptions {
            region:            "ap-northeast-1".to_string(),
            access_key_id:     None,
            secret_access_key: None,
            endpoint_url:      None,
        })
        .unwrap();
        let message = OutgoingMessage {
            to: vec!["ops@example.com".to_string()],
            ..Default::default()
        };

        let err = transport.deliver(&message).await.err().unwrap();

        assert!(matches!(err.kind(), TransportErrorKind::InvalidMessage(_)));
    }

    #[tokio::test]
    async fn extraの設定セット名をリクエストに渡す() {
        let transport = SesMailTransport::from_options(SesOptions {
            region:            "ap-northeast-1".to_string(),
            access_key_id:     None,
            secret_access_key: None,
            endpoint_url:      None,
        })
        .unwrap();
        let mut message = OutgoingMessage {
            from: Some("alerts@example.com".to_string()),
            to: vec!["ops@example.com".to_string()],
            ..Default::default()
        };
        message
            .extra
            .insert(CONFIGURATION_SET_NAME.to_string(), serde_json::json!("alerts"));

        let request = transport.prepare(&message).unwrap();

        assert_eq!(request.get_configuration_set_name().as_deref(), Some("alerts"));
        assert_eq!(request.get_from_email_address().as_deref(), Some("alerts@example.com"));
    }
}
