//! 알림/콘솔 문자열.
//!
//! 한국어(ko), 영어(en). `{secs}`, `{attempt}` 같은 자리표시자는
//! [`fill`]로 치환한다.

use fifatrack_core::models::connection::ErrorKind;
use fifatrack_core::models::locale::Locale;

/// 로컬라이즈된 문자열 모음
pub struct Strings {
    // 알림 제목
    pub restored_title: &'static str,
    pub lost_title: &'static str,
    pub extended_backoff_title: &'static str,
    pub offline_title: &'static str,

    // 알림 본문
    pub restored_body: &'static str,
    pub restored_fallback_body: &'static str,
    pub lost_timeout: &'static str,
    pub lost_blocked: &'static str,
    pub lost_unknown: &'static str,
    pub reauthenticate: &'static str,
    pub invalid_request: &'static str,
    pub extended_backoff_body: &'static str,
    pub waiting_for_network_body: &'static str,

    // 콘솔
    pub console_ready: &'static str,
    pub console_help: &'static str,
    pub console_unknown: &'static str,
    pub console_check_ok: &'static str,
    pub console_check_failed: &'static str,
    pub console_paused: &'static str,
    pub console_resumed: &'static str,
    pub console_visibility: &'static str,
    pub console_network: &'static str,
    pub console_recommendations: &'static str,
}

impl Strings {
    /// 한국어 문자열
    pub const KO: Strings = Strings {
        restored_title: "✅ 연결 복구",
        lost_title: "⚠️ 연결 끊김",
        extended_backoff_title: "⏳ 서버 응답 없음",
        offline_title: "📴 오프라인",

        restored_body: "서버 연결이 복구되었습니다. (응답 {ms}ms)",
        restored_fallback_body: "대체 서버로 연결이 복구되었습니다. (응답 {ms}ms)",
        lost_timeout: "서버 응답이 너무 느립니다. 자동으로 다시 연결합니다.",
        lost_blocked: "서버에 접근할 수 없습니다. 방화벽, VPN, 광고 차단 설정을 확인하세요.",
        lost_unknown: "서버 연결에 문제가 발생했습니다. 자동으로 다시 연결합니다.",
        reauthenticate: "세션이 만료되었습니다. 다시 로그인하세요.",
        invalid_request: "요청이 거부되었습니다. 앱을 최신 버전으로 업데이트하세요.",
        extended_backoff_body: "재연결 한도에 도달했습니다. {secs}초 후 다시 시도합니다.",
        waiting_for_network_body: "네트워크 연결이 끊겼습니다. 복구되면 자동으로 다시 연결합니다.",

        console_ready: "콘솔 준비됨. 'help'로 명령 목록을 확인하세요.",
        console_help: "명령: status, diag, check, pause, resume, background, foreground, online, offline, help, quit",
        console_unknown: "알 수 없는 명령: {cmd}",
        console_check_ok: "연결됨 ({type}, {ms}ms)",
        console_check_failed: "연결 실패 [{kind}] {message}",
        console_paused: "상태 확인 일시 중지",
        console_resumed: "상태 확인 재개",
        console_visibility: "가시성 변경: {value}",
        console_network: "네트워크 상태 전달: {value}",
        console_recommendations: "권장 조치:",
    };

    /// 영어 문자열
    pub const EN: Strings = Strings {
        restored_title: "✅ Connection restored",
        lost_title: "⚠️ Connection lost",
        extended_backoff_title: "⏳ Server not responding",
        offline_title: "📴 Offline",

        restored_body: "The server connection is back. ({ms}ms)",
        restored_fallback_body: "Reconnected through the fallback server. ({ms}ms)",
        lost_timeout: "The server is responding too slowly. Reconnecting automatically.",
        lost_blocked: "The server is unreachable. Check firewall, VPN or ad-blocker settings.",
        lost_unknown: "Something went wrong with the server connection. Reconnecting automatically.",
        reauthenticate: "Your session has expired. Please sign in again.",
        invalid_request: "The request was rejected. Update the app to the latest version.",
        extended_backoff_body: "Reconnect limit reached. Trying again in {secs}s.",
        waiting_for_network_body: "Your network is down. We will reconnect once it is back.",

        console_ready: "Console ready. Type 'help' for commands.",
        console_help: "Commands: status, diag, check, pause, resume, background, foreground, online, offline, help, quit",
        console_unknown: "Unknown command: {cmd}",
        console_check_ok: "Connected ({type}, {ms}ms)",
        console_check_failed: "Check failed [{kind}] {message}",
        console_paused: "Health checks paused",
        console_resumed: "Health checks resumed",
        console_visibility: "Visibility set to {value}",
        console_network: "Network state reported: {value}",
        console_recommendations: "Recommendations:",
    };

    /// 로케일에 따른 문자열 반환
    pub fn for_locale(locale: Locale) -> &'static Strings {
        match locale {
            Locale::Ko => &Self::KO,
            Locale::En => &Self::EN,
        }
    }

    /// 연결 끊김 알림 본문 (사용자 조치가 필요 없는 종류)
    pub fn lost_body(&self, kind: ErrorKind) -> &'static str {
        match kind {
            ErrorKind::Offline => self.waiting_for_network_body,
            ErrorKind::Timeout => self.lost_timeout,
            ErrorKind::BackendBlocked => self.lost_blocked,
            ErrorKind::Unauthorized => self.reauthenticate,
            ErrorKind::InvalidRequest => self.invalid_request,
            ErrorKind::UnknownBackendError => self.lost_unknown,
        }
    }
}

/// `{key}` 자리표시자 치환
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
