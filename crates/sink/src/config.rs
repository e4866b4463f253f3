//! # LogMail 設定
//!
//! 環境変数からテンプレートとトランスポート設定を読み込む。
//!
//! | 変数 | 用途 |
//! |------|------|
//! | `MAIL_TRANSPORT` | トランスポート種別（未設定なら sendmail） |
//! | `MAIL_FROM` / `MAIL_TO` / `MAIL_CC` / `MAIL_BCC` | アドレス（宛先はカンマ区切り） |
//! | `MAIL_SUBJECT` | 固定件名（未設定ならレコードから生成） |
//! | `SMTP_HOST` / `SMTP_PORT` / `SMTP_USER` / `SMTP_PASSWORD` / `SMTP_TIMEOUT_SECS` | smtp 用 |
//! | `SENDMAIL_PATH` | sendmail 用 |
//! | `MAIL_FILE_DIR` | file 用 |
//! | `SES_REGION` / `SES_ENDPOINT_URL` / `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | ses 用 |
//! | `LOGMAIL_ENV_VAR` | 件名の環境名を読む変数名（未設定なら `APP_ENV`） |

use std::env;

use logmail_domain::{DEFAULT_ENV_VAR, MessageTemplate, ProcessEnvironment, message::split_addresses};
use logmail_infra::{TransportConfig, TransportError, TransportKind};
use serde_json::json;
use thiserror::Error;

use crate::sink::LogMailSink;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} の値が不正です: {value} ({reason})")]
    InvalidValue {
        name:   &'static str,
        value:  String,
        reason: String,
    },

    #[error("{0} を設定する場合は {1} も必要です")]
    MissingPair(&'static str, &'static str),
}

/// シンクの設定
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// メールテンプレート
    pub template:  MessageTemplate,
    /// トランスポート設定
    pub transport: TransportConfig,
    /// 件名の環境名を読む環境変数名
    pub env_var:   String,
}

impl SinkConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut template = MessageTemplate::new();
        template.from = get("MAIL_FROM");
        template.to = get("MAIL_TO").map(|v| split_addresses(&v)).unwrap_or_default();
        template.cc = get("MAIL_CC").map(|v| split_addresses(&v)).unwrap_or_default();
        template.bcc = get("MAIL_BCC").map(|v| split_addresses(&v)).unwrap_or_default();
        template.subject = get("MAIL_SUBJECT");

        let mut transport = TransportConfig {
            kind: get("MAIL_TRANSPORT"),
            ..Default::default()
        };

        // 種別ごとに対応するオプションだけを積む（未知の種別はオプションなし）
        match transport.resolve_kind() {
            Ok(TransportKind::Sendmail) => {
                if let Some(path) = get("SENDMAIL_PATH") {
                    transport.options.insert("path".into(), json!(path));
                }
            }
            Ok(TransportKind::Smtp) => {
                if let Some(host) = get("SMTP_HOST") {
                    transport.options.insert("host".into(), json!(host));
                }
                if let Some(port) = get("SMTP_PORT") {
                    transport.options.insert("port".into(), json!(parse::<u16>("SMTP_PORT", &port)?));
                }
                if let Some(secs) = get("SMTP_TIMEOUT_SECS") {
                    transport
                        .options
                        .insert("timeoutSecs".into(), json!(parse::<u64>("SMTP_TIMEOUT_SECS", &secs)?));
                }
                match (get("SMTP_USER"), get("SMTP_PASSWORD")) {
                    (Some(user), Some(pass)) => {
                        transport
                            .options
                            .insert("auth".into(), json!({ "user": user, "pass": pass }));
                    }
                    (None, None) => {}
                    (Some(_), None) => return Err(ConfigError::MissingPair("SMTP_USER", "SMTP_PASSWORD")),
                    (None, Some(_)) => return Err(ConfigError::MissingPair("SMTP_PASSWORD", "SMTP_USER")),
                }
            }
            Ok(TransportKind::Ses) => {
                for (name, key) in [
                    ("SES_REGION", "region"),
                    ("SES_ENDPOINT_URL", "endpointUrl"),
                    ("AWS_ACCESS_KEY_ID", "accessKeyId"),
                    ("AWS_SECRET_ACCESS_KEY", "secretAccessKey"),
                ] {
                    if let Some(value) = get(name) {
                        transport.options.insert(key.into(), json!(value));
                    }
                }
            }
            Ok(TransportKind::File) => {
                if let Some(dir) = get("MAIL_FILE_DIR") {
                    transport.options.insert("dir".into(), json!(dir));
                }
            }
            Ok(TransportKind::Stub) | Err(_) => {}
        }

        Ok(Self {
            template,
            transport,
            env_var: get("LOGMAIL_ENV_VAR").unwrap_or_else(|| DEFAULT_ENV_VAR.to_string()),
        })
    }

    /// 設定からシンクを構築する
    pub fn into_sink(self) -> Result<LogMailSink, TransportError> {
        LogMailSink::builder(self.template)
            .transport_config(self.transport)
            .environment(ProcessEnvironment::new(self.env_var))
            .build()
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SinkConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SinkConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn 何も設定しなければsendmailとapp_env() {
        let config = load(&[]).unwrap();

        assert_eq!(config.transport, TransportConfig::default());
        assert_eq!(config.env_var, "APP_ENV");
        assert_eq!(config.template, MessageTemplate::new());
    }

    #[test]
    fn smtpの設定を読み込める() {
        let config = load(&[
            ("MAIL_TRANSPORT", "SMTP"),
            ("SMTP_HOST", "mail.internal"),
            ("SMTP_PORT", "1025"),
            ("SMTP_USER", "alerts"),
            ("SMTP_PASSWORD", "secret"),
            ("MAIL_FROM", "alerts@example.com"),
            ("MAIL_TO", "a@example.com, b@example.com"),
        ])
        .unwrap();

        let expected = TransportConfig::new("SMTP")
            .with_option("host", "mail.internal")
            .with_option("port", 1025)
            .with_option("auth", json!({"user": "alerts", "pass": "secret"}));
        assert_eq!(config.transport, expected);
        assert_eq!(config.template.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.template.from.as_deref(), Some("alerts@example.com"));
    }

    #[test]
    fn 他の種別のオプションは積まない() {
        let config = load(&[
            ("MAIL_TRANSPORT", "file"),
            ("MAIL_FILE_DIR", "/var/spool/logmail"),
            ("SMTP_HOST", "mail.internal"),
        ])
        .unwrap();

        assert_eq!(
            config.transport,
            TransportConfig::new("file").with_option("dir", "/var/spool/logmail")
        );
    }

    #[test]
    fn 不正なポート番号はエラー() {
        let err = load(&[("MAIL_TRANSPORT", "smtp"), ("SMTP_PORT", "smtp")]).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { name: "SMTP_PORT", .. }));
    }

    #[test]
    fn 認証情報の片方だけはエラー() {
        let err = load(&[("MAIL_TRANSPORT", "smtp"), ("SMTP_USER", "alerts")]).unwrap_err();

        assert!(matches!(err, ConfigError::MissingPair("SMTP_USER", "SMTP_PASSWORD")));
    }

    #[test]
    fn 空文字列は未設定として扱う() {
        let config = load(&[("MAIL_TRANSPORT", ""), ("MAIL_SUBJECT", "  ")]).unwrap();

        assert_eq!(config.transport.kind, None);
        assert_eq!(config.template.subject, None);
    }

    #[test]
    fn 未知の種別は構築時にエラーとなる() {
        let config = load(&[("MAIL_TRANSPORT", "pigeon"), ("SMTP_HOST", "mail.internal")]).unwrap();

        assert!(config.transport.options.is_empty());
        assert!(config.into_sink().unwrap_err().is_construction());
    }
}
