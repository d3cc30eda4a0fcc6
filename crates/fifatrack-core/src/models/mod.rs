//! 도메인 모델.

pub mod connection;
pub mod diagnostics;
pub mod locale;
