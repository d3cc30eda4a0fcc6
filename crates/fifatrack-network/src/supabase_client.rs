//! Supabase 백엔드 프로브.
//!
//! `BackendProbe` 포트 구현. 세션/신원 확인과 세션 유지 하트비트를
//! 가장 가벼운 REST 호출로 수행하며, 기본 엔드포인트가 차단되면
//! 대체 엔드포인트(fallback)로 순차 시도한다.

use async_trait::async_trait;
use fifatrack_core::config::BackendConfig;
use fifatrack_core::error::CoreError;
use fifatrack_core::models::connection::ConnectionType;
use fifatrack_core::ports::backend::BackendProbe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error_mapping::{map_status_error, map_transport_error};

/// 로그인 세션이 있을 때의 신원 확인 경로
const USER_PATH: &str = "/auth/v1/user";
/// 세션 없이 사용하는 인증 서비스 상태 경로
const HEALTH_PATH: &str = "/auth/v1/health";
/// PostgREST 루트 (하트비트)
const REST_ROOT_PATH: &str = "/rest/v1/";

/// Supabase 프로브: `BackendProbe` 포트 구현
pub struct SupabaseProbe {
    client: reqwest::Client,
    /// [기본, 대체?] 엔드포인트
    endpoints: Vec<String>,
    anon_key: String,
    access_token: Option<String>,
    timeout: Duration,
    /// 마지막으로 응답한 엔드포인트 인덱스
    active: AtomicUsize,
}

impl SupabaseProbe {
    /// 새 프로브 생성
    ///
    /// `timeout`은 개별 HTTP 요청(연결 포함)에 적용된다.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        let mut endpoints = vec![config.url.trim_end_matches('/').to_string()];
        if let Some(fallback) = config.fallback_url.as_deref() {
            let fallback = fallback.trim_end_matches('/').to_string();
            if !fallback.is_empty() && !endpoints.contains(&fallback) {
                endpoints.push(fallback);
            }
        }

        Ok(Self {
            client,
            endpoints,
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            timeout,
            active: AtomicUsize::new(0),
        })
    }

    /// 등록된 엔드포인트 목록
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// 세션 확인에 사용할 경로
    fn probe_path(&self) -> &'static str {
        if self.access_token.is_some() {
            USER_PATH
        } else {
            HEALTH_PATH
        }
    }

    /// 단일 엔드포인트 GET
    async fn get(&self, operation: &str, base_url: &str, path: &str) -> Result<(), CoreError> {
        let url = format!("{base_url}{path}");
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);

        let mut req = self.client.get(&url).header("apikey", &self.anon_key);
        if !bearer.is_empty() {
            req = req.bearer_auth(bearer);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| map_transport_error(operation, &e, self.timeout))?;

        let status = resp.status();
        if status.is_success() {
            debug!("{operation} 성공: {url} ({status})");
            return Ok(());
        }

        let headers = resp.headers().clone();
        let body = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });
        Err(map_status_error(operation, status, &headers, &body))
    }

    /// 기본 → 대체 순서로 시도
    ///
    /// 도달 불가(`Unreachable`)일 때만 다음 엔드포인트로 넘어간다.
    /// 응답을 받은 엔드포인트의 HTTP 에러는 그대로 반환한다.
    async fn get_with_fallback(&self, operation: &str, path: &str) -> Result<(), CoreError> {
        let mut last_error = None;

        for (idx, base_url) in self.endpoints.iter().enumerate() {
            match self.get(operation, base_url, path).await {
                Ok(()) => {
                    let previous = self.active.swap(idx, Ordering::Relaxed);
                    if previous != idx {
                        info!("백엔드 엔드포인트 전환: {} → {}", self.endpoints[previous], base_url);
                    }
                    return Ok(());
                }
                Err(e @ CoreError::Unreachable(_)) => {
                    debug!("엔드포인트 도달 불가, 다음 시도: {base_url} - {e}");
                    last_error = Some(e);
                }
                Err(e) => {
                    self.active.store(idx, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::Internal("백엔드 엔드포인트 없음".to_string())))
    }
}

#[async_trait]
impl BackendProbe for SupabaseProbe {
    async fn probe_session(&self) -> Result<(), CoreError> {
        self.get_with_fallback("세션 확인", self.probe_path()).await
    }

    async fn keep_alive(&self) -> Result<(), CoreError> {
        self.get_with_fallback("하트비트", REST_ROOT_PATH).await
    }

    fn mode(&self) -> ConnectionType {
        if self.active.load(Ordering::Relaxed) == 0 {
            ConnectionType::Real
        } else {
            ConnectionType::Fallback
        }
    }
}
