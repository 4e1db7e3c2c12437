//! 로깅 초기화 모듈
//!
//! 모니터 로그를 JSON 형식으로 stdout과 일별 파일에 동시 출력합니다.

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "info,heartbeat_monitor=debug";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "monitor.log";

type JsonFormat = fmt::format::Format<fmt::format::Json, fmt::time::UtcTime<Rfc3339>>;

/// JSON layer shared by the stdout and file outputs
fn json_layer<S>() -> fmt::Layer<S, fmt::format::JsonFields, JsonFormat>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .flatten_event(false)
}

/// 로깅 시스템을 초기화합니다.
///
/// - 레벨: `RUST_LOG` (기본값 `info,heartbeat_monitor=debug`)
/// - 파일: `LOG_DIR` (기본값 `logs/`) 아래 `monitor.log.YYYY-MM-DD`
///
/// 반환되는 `WorkerGuard`를 main에서 유지해야 종료 시 버퍼링된 로그가 손실되지 않습니다.
/// 이미 전역 subscriber가 설치된 경우(테스트 등)에는 조용히 넘어갑니다.
pub fn init_logging() -> WorkerGuard {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer())
        .with(json_layer().with_ansi(false).with_writer(file_writer))
        .try_init();

    if let Err(err) = result {
        use std::error::Error;
        let already_set = err
            .source()
            .and_then(|s| s.downcast_ref::<tracing::dispatcher::SetGlobalDefaultError>())
            .is_some();
        if !already_set {
            eprintln!("Failed to initialize tracing: {}", err);
        }
    }

    guard
}
