use drive_upload_relay::config::ServerConfig;
use drive_upload_relay::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[FATAL] {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Held for the whole process so buffered file logs get flushed
    let _log_guard = match logging::init(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("[FATAL] {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = drive_upload_relay::run(config).await {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
