//! 사용자 알림 포트.
//!
//! 구현: `fifatrack-app` crate (터미널 알림)

use async_trait::async_trait;

use crate::error::CoreError;

/// 사용자 알림 인터페이스 (토스트/배너)
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    /// 일반 알림 표시 (제목 + 본문)
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError>;

    /// 에러 알림 표시 (사용자 조치 필요)
    async fn show_error(&self, message: &str) -> Result<(), CoreError>;
}
