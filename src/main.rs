use heartbeat_monitor::{
    build_channels,
    config::AppConfig,
    monitoring::{find_latest_log_file, HeartbeatMonitor},
    utils::{init_logging, AppError},
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1. 로깅 초기화
    let _guard = init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error_code = e.error_code(), error = %e, "Monitor stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    // 2. 설정 로드
    let config = AppConfig::load()?;

    // 3. 알림 채널 구성
    let channels = build_channels(&config);

    // 4. 최신 로그 파일 탐색
    let log_file = find_latest_log_file(&config.base_path)?;
    tracing::info!(
        log_file = %log_file.display(),
        validator = %config.validator_address,
        "Monitoring validator heartbeat"
    );

    // 5. 폴링 루프 실행
    let mut monitor = HeartbeatMonitor::new(&config, log_file, channels);
    monitor.run_loop().await;

    Ok(())
}
