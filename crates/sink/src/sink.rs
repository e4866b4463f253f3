//! # LogMailSink
//!
//! ログレコード 1 件をメール 1 通に変換して送信する書き込み先。
//!
//! ## ライフサイクル
//!
//! ```text
//! build ─→ Open ──write──→ Open ──close──→ Closed
//!                                            │
//!                          write ─→ SinkEvent::Error(Released)
//! ```
//!
//! - 構築時にトランスポートを生成し、種別・オプションの誤りはその場でエラーを返す
//! - `write` は送信メッセージを同期的に組み立て、配送を Tokio タスクに委ねる
//! - `close` は資源を 1 度だけ解放する。配送中のタスクは待たない

use std::sync::Arc;

use logmail_domain::{
    DefaultFormatter,
    EnvironmentProvider,
    LogRecord,
    MessageFormatter,
    MessageTemplate,
    OutgoingMessage,
    ProcessEnvironment,
};
use logmail_infra::{
    DeliveryReceipt,
    MailTransport,
    TransportConfig,
    TransportError,
    TransportErrorKind,
    TransportKind,
    create_transport,
};
use logmail_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::event::{EventHub, EventReceiver, SinkEvent};

/// ログレコードをメールとして送信するシンク
///
/// テンプレートとトランスポートはインスタンスごとに固定で、構築後は変更しない。
/// 送信結果は [`subscribe`](Self::subscribe) で得た受信側に [`SinkEvent`] として届く。
pub struct LogMailSink {
    template:  Arc<MessageTemplate>,
    formatter: Arc<dyn MessageFormatter>,
    kind:      TransportKind,
    transport: Option<Arc<dyn MailTransport>>,
    events:    Arc<EventHub>,
}

impl std::fmt::Debug for LogMailSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogMailSink")
            .field("template", &self.template)
            .field("kind", &self.kind)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl LogMailSink {
    /// テンプレートとトランスポート設定からシンクを作成する
    ///
    /// 件名の環境名は `APP_ENV` 環境変数から読み取る。
    ///
    /// # Errors
    ///
    /// - 未知のトランスポート種別: `TransportErrorKind::UnknownTransport`
    /// - 種別に合わないオプション: `TransportErrorKind::InvalidOptions`
    pub fn new(template: MessageTemplate, transport: TransportConfig) -> Result<Self, TransportError> {
        Self::builder(template).transport_config(transport).build()
    }

    pub fn builder(template: MessageTemplate) -> LogMailSinkBuilder {
        LogMailSinkBuilder::new(template)
    }

    /// 送信結果イベントを購読する
    ///
    /// 購読前に完了した書き込みのイベントは受け取れない。
    /// チャネルに上限はないため、受信側は読み続けるか不要になった時点で破棄すること。
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    /// 使用しているトランスポート種別
    pub fn transport_kind(&self) -> TransportKind {
        self.kind
    }

    /// `close` 前なら `true`
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// ログレコードから送信メッセージを組み立てる
    ///
    /// テンプレートに件名があればそれを使い、本文は常にレコードから生成する。
    pub fn compose(&self, record: &LogRecord) -> OutgoingMessage {
        OutgoingMessage::compose(&self.template, record, self.formatter.as_ref())
    }

    /// ログレコード 1 件をメールとして送信する
    ///
    /// 送信メッセージはこの呼び出しの中で組み立てるため、呼び出し後にレコードを
    /// 変更・破棄しても送信内容には影響しない。配送結果は戻り値ではなく
    /// [`SinkEvent`] で通知し、返す `JoinHandle` は配送タスクの完了のみを表す。
    ///
    /// `close` 後に呼び出した場合は配送せず、`Released` エラーを通知する。
    ///
    /// # Panics
    ///
    /// Tokio ランタイムの外で呼び出した場合。
    pub fn write(&self, record: &LogRecord) -> JoinHandle<()> {
        let message = self.compose(record);
        let transport = self.transport.clone();
        let events = Arc::clone(&self.events);
        let kind = self.kind;

        let span = tracing::info_span!("mail_delivery", transport = %kind, subject = %message.subject);
        tokio::spawn(
            async move {
                let outcome = match transport {
                    Some(transport) => transport.deliver(&message).await,
                    None => Err(TransportError::released()),
                };
                publish(&events, kind, &message.subject, outcome);
            }
            .instrument(span),
        )
    }

    /// トランスポートの資源を解放する
    ///
    /// 2 回目以降の呼び出しは何もしない。配送中のタスクは完了を待たずに継続し、
    /// それぞれの結果イベントは通常どおり通知される。
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.release();
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::SINK_CLOSED,
                event.result = event::result::SUCCESS,
                event.transport = %self.kind,
                "ログメールシンクを閉じました"
            );
        }
    }
}

impl Drop for LogMailSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// 配送結果をイベントとして通知する
///
/// 失敗を受け取る購読者がいない場合、エラーを握りつぶさずエラーログに残す。
fn publish(
    events: &EventHub,
    kind: TransportKind,
    subject: &str,
    outcome: Result<DeliveryReceipt, TransportError>,
) {
    match outcome {
        Ok(receipt) => {
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_SENT,
                event.result = event::result::SUCCESS,
                event.transport = %kind,
                mail.subject = %subject,
                mail.message_id = receipt.message_id.as_deref(),
                "ログメールを送信しました"
            );
            // 成功の通知先がなくても問題ない
            events.publish(&SinkEvent::MailSent(receipt));
        }
        Err(error) => {
            let error_kind = match error.kind() {
                TransportErrorKind::Released => log_error::kind::RELEASED,
                _ => log_error::kind::DELIVERY,
            };
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_FAILED,
                event.result = event::result::FAILURE,
                event.transport = %kind,
                mail.subject = %subject,
                error.category = log_error::category::TRANSPORT,
                error.kind = error_kind,
                error = %error,
                "ログメールの送信に失敗しました"
            );
            let error = Arc::new(error);
            if events.publish(&SinkEvent::Error(Arc::clone(&error))) == 0 {
                tracing::error!(
                    error.category = log_error::category::TRANSPORT,
                    error.kind = log_error::kind::UNHANDLED_DELIVERY,
                    error = %error,
                    span_trace = %error.span_trace(),
                    "送信失敗を受け取る購読者がいません"
                );
            }
        }
    }
}

/// [`LogMailSink`] のビルダー
///
/// 整形方法・環境名の取得元・トランスポートを差し替えられる。
#[must_use]
pub struct LogMailSinkBuilder {
    template:         MessageTemplate,
    transport_config: TransportConfig,
    transport:        Option<Arc<dyn MailTransport>>,
    environment:      Option<Arc<dyn EnvironmentProvider>>,
    formatter:        Option<Arc<dyn MessageFormatter>>,
}

impl LogMailSinkBuilder {
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            transport_config: TransportConfig::default(),
            transport: None,
            environment: None,
            formatter: None,
        }
    }

    /// トランスポート設定（未指定なら sendmail）
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    /// 構築済みのトランスポートを使う
    ///
    /// 指定した場合、トランスポート設定は無視される。
    pub fn transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 件名の環境名の取得元
    ///
    /// [`formatter`](Self::formatter) を指定した場合は使われない。
    pub fn environment(mut self, environment: impl EnvironmentProvider + 'static) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    /// 件名・本文の整形方法
    pub fn formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// シンクを構築する
    ///
    /// # Errors
    ///
    /// トランスポート設定からの構築に失敗した場合。
    pub fn build(self) -> Result<LogMailSink, TransportError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => create_transport(&self.transport_config)?,
        };
        let kind = transport.kind();

        let formatter = match self.formatter {
            Some(formatter) => formatter,
            None => {
                let environment = self
                    .environment
                    .unwrap_or_else(|| Arc::new(ProcessEnvironment::default()));
                Arc::new(DefaultFormatter::from_shared(environment))
            }
        };

        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::SINK_OPENED,
            event.result = event::result::SUCCESS,
            event.transport = %kind,
            "ログメールシンクを開きました"
        );

        Ok(LogMailSink {
            template: Arc::new(self.template),
            formatter,
            kind,
            transport: Some(transport),
            events: Arc::default(),
        })
    }
}
