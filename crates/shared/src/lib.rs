//! # LogMail 共有ユーティリティ
//!
//! ワークスペース内のすべてのクレートから使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - logmail クレート（シンク本体）から依存される
//! - メール送信やログ整形のロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える

pub mod event_log;
pub mod observability;
