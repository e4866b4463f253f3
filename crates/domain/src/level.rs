//! # ログレベル
//!
//! 整数のログレベルと名前の対応表。
//!
//! | コード | 名前 |
//! |-------|------|
//! | 10 | `TRACE` |
//! | 20 | `DEBUG` |
//! | 30 | `INFO` |
//! | 40 | `WARN` |
//! | 50 | `ERROR` |
//! | 60 | `FATAL` |
//!
//! 表にないコードは `LVL<n>` として表示する。

use std::borrow::Cow;

use strum::IntoStaticStr;

/// ログレベル（閉じた集合）
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    IntoStaticStr,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Trace = 10,
    Debug = 20,
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
}

impl Level {
    /// 整数コードからレベルを解決する
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            10 => Some(Self::Trace),
            20 => Some(Self::Debug),
            30 => Some(Self::Info),
            40 => Some(Self::Warn),
            50 => Some(Self::Error),
            60 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// 整数コードを返す
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.code()
    }
}

/// 整数コードをレベル名に変換する
///
/// 表にないコードは `LVL` に 10 進表記を連結した文字列になる。
pub fn level_name(code: i64) -> Cow<'static, str> {
    match Level::from_code(code) {
        Some(level) => Cow::Borrowed(level.into()),
        None => Cow::Owned(format!("LVL{code}")),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case(10, "TRACE")]
    #[case(20, "DEBUG")]
    #[case(30, "INFO")]
    #[case(40, "WARN")]
    #[case(50, "ERROR")]
    #[case(60, "FATAL")]
    fn test_既知のコードは対応する名前を返す(#[case] code: i64, #[case] expected: &str) {
        assert_eq!(level_name(code), expected);
    }

    #[rstest]
    #[case(0, "LVL0")]
    #[case(35, "LVL35")]
    #[case(70, "LVL70")]
    #[case(-10, "LVL-10")]
    fn test_未知のコードはlvl接頭辞付きで返す(#[case] code: i64, #[case] expected: &str) {
        assert_eq!(level_name(code), expected);
    }

    #[test]
    fn test_from_codeとcodeは対応する() {
        for level in Level::iter() {
            assert_eq!(Level::from_code(level.code()), Some(level));
        }
    }

    #[test]
    fn test_displayは大文字の名前を出力する() {
        assert_eq!(Level::Warn.to_string(), "WARN");
    }
}
