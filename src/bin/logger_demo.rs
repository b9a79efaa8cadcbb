use feedgate::logger::*;
use feedgate::settings::LogFormat;

fn main() -> anyhow::Result<()> {
    let format = match std::env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    };

    let logger = Logger::new_bootstrap(format);
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "debug".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!(user_id = "12345678", path = "/api/profile", "application info log");

    Ok(())
}
