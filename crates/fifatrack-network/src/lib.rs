//! # fifatrack-network
//!
//! 호스팅 백엔드(Supabase) 연결 어댑터와 연결 모니터.
//! 세션 프로브, 네트워크 도달성 확인, 지수 백오프 재연결,
//! 주기적 상태 확인/하트비트를 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use fifatrack_network::connectivity::ConnectionMonitor;
//! use fifatrack_network::network_probe::TcpNetworkProbe;
//! use fifatrack_network::supabase_client::SupabaseProbe;
//!
//! let backend = Arc::new(SupabaseProbe::new(&config.backend, config.connection.probe_timeout())?);
//! let network = Arc::new(TcpNetworkProbe::from_config(&config.connection));
//! let (monitor, handle) = ConnectionMonitor::new(config.connection.clone(), backend, network);
//! tokio::spawn(monitor.run(shutdown_rx));
//! handle.start_health_check().await?;
//! ```

pub mod backoff;
pub mod connectivity;
pub mod error_mapping;
pub mod event_bus;
pub mod metrics;
pub mod network_probe;
pub mod supabase_client;
