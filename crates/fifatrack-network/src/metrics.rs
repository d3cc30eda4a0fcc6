//! 연결 확인 지표 집계.

use fifatrack_core::models::diagnostics::{success_rate, ConnectionMetrics, ConnectionSpeed};
use std::collections::VecDeque;

/// 연결 확인 결과 누적기
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    total: u64,
    successful: u64,
    failed: u64,
    response_times: VecDeque<u64>,
    window: usize,
    last_response_time_ms: Option<u64>,
}

impl MetricsTracker {
    /// `window`: 평균 응답 시간에 사용할 최근 표본 수
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            response_times: VecDeque::with_capacity(window),
            window,
            last_response_time_ms: None,
        }
    }

    /// 성공 기록
    pub fn record_success(&mut self, response_time_ms: u64) {
        self.total += 1;
        self.successful += 1;
        self.last_response_time_ms = Some(response_time_ms);
        if self.response_times.len() == self.window {
            self.response_times.pop_front();
        }
        self.response_times.push_back(response_time_ms);
    }

    /// 실패 기록
    pub fn record_failure(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    /// 최근 표본 평균 응답 시간
    pub fn average_response_time_ms(&self) -> Option<u64> {
        if self.response_times.is_empty() {
            return None;
        }
        let sum: u64 = self.response_times.iter().sum();
        Some((sum as f64 / self.response_times.len() as f64).round() as u64)
    }

    /// 현재 지표 스냅샷
    pub fn snapshot(&self) -> ConnectionMetrics {
        let average = self.average_response_time_ms();
        ConnectionMetrics {
            total_connections: self.total,
            successful_connections: self.successful,
            failed_connections: self.failed,
            success_rate: success_rate(self.successful, self.total),
            average_response_time_ms: average,
            last_response_time_ms: self.last_response_time_ms,
            connection_speed: ConnectionSpeed::from_response_time(average),
        }
    }
}
