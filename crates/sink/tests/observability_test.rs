//! トレーシング初期化の結合テスト
//!
//! グローバル subscriber を登録するため、他のテストとは別バイナリで実行する。
//!
//! 実行方法:
//! ```bash
//! cargo test -p logmail --test observability_test
//! ```

use logmail::LogMailSink;
use logmail_domain::{Level, LogRecord, MessageTemplate};
use logmail_infra::{TransportConfig, TransportErrorKind};
use logmail_shared::observability::{LogFormat, TracingConfig, init_tracing};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_init_tracing後は別スレッドの配送失敗にもスパンが残る() {
    let config = TracingConfig::new(LogFormat::Json).with_default_filter("warn");

    assert!(init_tracing(&config).is_ok());
    assert!(init_tracing(&config).is_err());

    let mut sink = LogMailSink::new(
        MessageTemplate::new()
            .with_from("alerts@example.com")
            .with_to("ops@example.com"),
        TransportConfig::new("stub"),
    )
    .unwrap();
    let mut events = sink.subscribe();
    sink.close();

    sink.write(&LogRecord::new(Level::Error, "billing", "web-1"))
        .await
        .unwrap();

    let event = events.recv().await.unwrap();
    let error = event.error().unwrap();
    assert!(matches!(error.kind(), TransportErrorKind::Released));
    assert!(error.span_trace().to_string().contains("mail_delivery"));
}
