//! 送信メッセージから lettre の `Message` への変換
//!
//! sendmail / SMTP / ファイル / スタブの各トランスポートで共通に使用する。
//! 本文はプレーンテキスト 1 パートのみ。
//!
//! テンプレートのパススルー項目（`extra`）のうち、次の文字列値はヘッダーに反映する。
//! それ以外のキーはこれらのトランスポートでは使わない。
//!
//! | キー | ヘッダー |
//! |------|---------|
//! | `messageId` | `Message-ID` |
//! | `inReplyTo` | `In-Reply-To` |
//! | `references` | `References` |
//! | `sender` | `Sender` |

use lettre::message::{
    Mailbox,
    Message,
    header::{ContentType, HeaderName, HeaderValue},
};
use logmail_domain::OutgoingMessage;

use crate::error::TransportError;

/// `extra` から反映するキー
pub mod extra_key {
    pub const MESSAGE_ID: &str = "messageId";
    pub const IN_REPLY_TO: &str = "inReplyTo";
    pub const REFERENCES: &str = "references";
    pub const SENDER: &str = "sender";
}

/// lettre の `Message` を組み立てる
///
/// 送信元がない場合や宛先が 1 件もない場合は lettre がエラーを返す。
pub fn build_message(message: &OutgoingMessage) -> Result<Message, TransportError> {
    let mut builder = Message::builder().subject(&message.subject);

    if let Some(from) = &message.from {
        builder = builder.from(from.parse::<Mailbox>()?);
    }
    for to in &message.to {
        builder = builder.to(to.parse::<Mailbox>()?);
    }
    for cc in &message.cc {
        builder = builder.cc(cc.parse::<Mailbox>()?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(bcc.parse::<Mailbox>()?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(reply_to.parse::<Mailbox>()?);
    }

    if let Some(message_id) = message.extra_str(extra_key::MESSAGE_ID) {
        builder = builder.message_id(Some(message_id.to_string()));
    }
    if let Some(in_reply_to) = message.extra_str(extra_key::IN_REPLY_TO) {
        builder = builder.in_reply_to(in_reply_to.to_string());
    }
    if let Some(references) = message.extra_str(extra_key::REFERENCES) {
        builder = builder.references(references.to_string());
    }
    if let Some(sender) = message.extra_str(extra_key::SENDER) {
        builder = builder.sender(sender.parse::<Mailbox>()?);
    }

    for (name, value) in &message.headers {
        let header_name = HeaderName::new_from_ascii(name.clone()).map_err(|e| {
            TransportError::invalid_message(format!("ヘッダー名 {name:?} が不正: {e}"))
        })?;
        builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
    }

    Ok(builder
        .header(ContentType::TEXT_PLAIN)
        .body(message.text.clone())?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::error::TransportErrorKind;

    fn outgoing() -> OutgoingMessage {
        OutgoingMessage {
            from: Some("LogMail <alerts@example.com>".to_string()),
            to: vec!["ops@example.com".to_string()],
            subject: "[PROD-ERROR] billing on web-1".to_string(),
            text: "* app: billing\n* hostname: web-1".to_string(),
            ..Default::default()
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_件名と本文と宛先を含むメッセージを組み立てる() {
        let message = build_message(&outgoing()).unwrap();

        let raw = formatted(&message);
        assert!(raw.contains("Subject: [PROD-ERROR] billing on web-1"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("* app: billing"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn test_追加ヘッダーを含める() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Log-Source".to_string(), "logmail".to_string());
        let outgoing = OutgoingMessage {
            headers,
            ..outgoing()
        };

        let raw = formatted(&build_message(&outgoing).unwrap());

        assert!(raw.contains("X-Log-Source: logmail"));
    }

    #[test]
    fn test_送信元がなければエラー() {
        let outgoing = OutgoingMessage {
            from: None,
            ..outgoing()
        };

        let err = build_message(&outgoing).unwrap_err();

        assert!(matches!(err.kind(), TransportErrorKind::Message(_)));
    }

    #[test]
    fn test_不正なアドレスはエラー() {
        let outgoing = OutgoingMessage {
            to: vec!["not an address".to_string()],
            ..outgoing()
        };

        let err = build_message(&outgoing).unwrap_err();

        assert!(matches!(err.kind(), TransportErrorKind::Address(_)));
    }

    #[test]
    fn test_不正なヘッダー名はエラー() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad: Header".to_string(), "x".to_string());
        let outgoing = OutgoingMessage {
            headers,
            ..outgoing()
        };

        let err = build_message(&outgoing).unwrap_err();

        assert!(matches!(err.kind(), TransportErrorKind::InvalidMessage(_)));
    }

    #[test]
    fn test_extraの項目をヘッダーに反映する() {
        let mut outgoing = outgoing();
        outgoing
            .extra
            .insert("messageId".to_string(), json!("<log-1@example.com>"));
        outgoing
            .extra
            .insert("inReplyTo".to_string(), json!("<log-0@example.com>"));
        outgoing
            .extra
            .insert("sender".to_string(), json!("relay@example.com"));
        outgoing.extra.insert("priority".to_string(), json!("high"));

        let raw = formatted(&build_message(&outgoing).unwrap());

        assert!(raw.contains("Message-ID: <log-1@example.com>"));
        assert!(raw.contains("In-Reply-To: <log-0@example.com>"));
        assert!(raw.contains("Sender: relay@example.com"));
        assert!(!raw.contains("priority"));
    }

    #[test]
    fn test_extraの不正なsenderはアドレスエラー() {
        let mut outgoing = outgoing();
        outgoing
            .extra
            .insert("sender".to_string(), json!("not an address"));

        let err = build_message(&outgoing).unwrap_err();

        assert!(matches!(err.kind(), TransportErrorKind::Address(_)));
    }
}
