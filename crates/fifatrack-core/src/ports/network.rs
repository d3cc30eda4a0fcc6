//! 호스트 네트워크 도달성 포트.
//!
//! 구현: `fifatrack-network` crate (TCP 연결 프로브)

use async_trait::async_trait;

/// 호스트 네트워크 연결 여부 확인
///
/// 백엔드 장애와 네트워크 자체 단절을 구분하는 데 사용한다.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// 네트워크 사용 가능 여부
    async fn is_online(&self) -> bool;
}
