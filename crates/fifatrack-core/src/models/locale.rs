//! 사용자 알림 언어.
//!
//! 한국어(ko), 영어(en) 지원.

use serde::{Deserialize, Serialize};

/// 지원 언어
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// 한국어 (기본값)
    #[default]
    Ko,
    /// 영어
    En,
}

impl Locale {
    /// 언어 코드 반환
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
        }
    }

    /// 언어 코드 파싱 ("ko", "en-US" 등)
    pub fn from_code(code: &str) -> Option<Self> {
        let lower = code.to_ascii_lowercase();
        if lower.starts_with("ko") {
            Some(Locale::Ko)
        } else if lower.starts_with("en") {
            Some(Locale::En)
        } else {
            None
        }
    }
}
