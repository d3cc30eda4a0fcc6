//! 백엔드 프로브 포트.
//!
//! 구현: `fifatrack-network` crate (reqwest 기반 Supabase 프로브)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::connection::ConnectionType;

/// 호스팅 백엔드에 대한 경량 호출
///
/// 연결 모니터는 이 인터페이스에만 의존한다.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    /// 세션/신원 확인 호출: 상태 확인의 기본 단위
    async fn probe_session(&self) -> Result<(), CoreError>;

    /// 세션 유지용 하트비트 호출
    async fn keep_alive(&self) -> Result<(), CoreError>;

    /// 마지막으로 응답한 엔드포인트 모드 (`Real` 또는 `Fallback`)
    fn mode(&self) -> ConnectionType;
}
