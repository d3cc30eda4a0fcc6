//! 호스트 네트워크 도달성 확인.
//!
//! 백엔드 실패가 "서버 문제"인지 "내 네트워크 문제"인지 구분하기 위해
//! 잘 알려진 주소로 TCP 연결을 시도한다. 하나라도 성공하면 온라인.

use async_trait::async_trait;
use fifatrack_core::config::ConnectionConfig;
use fifatrack_core::ports::network::NetworkProbe;
use futures::future::select_ok;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// TCP 연결 기반 네트워크 프로브
pub struct TcpNetworkProbe {
    targets: Vec<String>,
    timeout: Duration,
}

impl TcpNetworkProbe {
    /// 새 프로브 생성 (`targets`: host:port 목록)
    pub fn new(targets: Vec<String>, timeout: Duration) -> Self {
        Self { targets, timeout }
    }

    /// 연결 설정으로 생성
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(
            config.network_probe_targets.clone(),
            config.network_probe_timeout(),
        )
    }

    async fn try_connect(target: String, timeout: Duration) -> Result<(), String> {
        match tokio::time::timeout(timeout, TcpStream::connect(target.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("{target}: {e}")),
            Err(_) => Err(format!("{target}: 타임아웃")),
        }
    }
}

#[async_trait]
impl NetworkProbe for TcpNetworkProbe {
    async fn is_online(&self) -> bool {
        // 대상이 없으면 판단 불가 → 온라인으로 간주 (백엔드 결과만 사용)
        if self.targets.is_empty() {
            return true;
        }

        let attempts = self
            .targets
            .iter()
            .map(|t| Box::pin(Self::try_connect(t.clone(), self.timeout)));

        match select_ok(attempts).await {
            Ok(_) => true,
            Err(last) => {
                debug!("네트워크 도달성 확인 실패: {last}");
                false
            }
        }
    }
}
