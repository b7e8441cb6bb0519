use std::time::Duration;

use clap::Parser;
use error::AppError;
use manifest_engine::{HlsParser, ManifestConfig, PlayerInterface};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod output;
mod utils;

use cli::CliArgs;
use utils::{parse_headers, parse_time};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // Logs go to stderr so that stdout only carries the rendered manifest
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}

fn build_config(args: &CliArgs) -> Result<ManifestConfig, AppError> {
    let timeout = parse_time(&args.timeout)?;
    if timeout < 0.0 {
        return Err(AppError::ParseError(format!(
            "Timeout must not be negative: {}",
            args.timeout
        )));
    }

    let availability_window = args
        .availability_window
        .as_deref()
        .map(parse_time)
        .transpose()?;

    let presentation_delay = args
        .presentation_delay
        .as_deref()
        .map(parse_time)
        .transpose()?;

    let mut headers = ManifestConfig::get_default_headers();
    headers.extend(parse_headers(&args.headers));

    let mut builder = ManifestConfig::builder()
        .with_timeout(Duration::from_secs_f64(timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_max_attempts(args.attempts)
        .with_headers(headers)
        .with_ignore_drm_info(args.ignore_drm)
        .with_availability_window_override(availability_window)
        .with_default_presentation_delay(presentation_delay)
        .with_sniff_byte_budget(args.sniff_bytes);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.with_user_agent(user_agent);
    }

    Ok(builder.build())
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    let config = build_config(&args)?;
    debug!(
        timeout = ?config.retry.timeout,
        connect_timeout = ?config.connect_timeout,
        attempts = config.retry.max_attempts,
        "HTTP configuration"
    );

    let parser = HlsParser::with_http_transport(config)?;
    let interface = PlayerInterface::new().with_on_error(|e| warn!(error = %e, "Recoverable error"));

    info!(url = %args.url, "Parsing manifest");
    let manifest = parser.start(&args.url, &interface).await?;
    info!(
        variants = manifest.periods.iter().map(|p| p.variants.len()).sum::<usize>(),
        streams = output::stream_count(&manifest),
        "Manifest parsed"
    );

    if args.json {
        println!("{}", output::render_json(&manifest)?);
    } else {
        print!("{}", output::render_text(&manifest));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_from_flags() {
        let args = CliArgs::parse_from([
            "manifest-cli",
            "https://example.com/master.m3u8",
            "--timeout",
            "1m",
            "--attempts",
            "3",
            "-H",
            "Referer: https://example.com/",
            "--ignore-drm",
            "--availability-window",
            "30",
            "--presentation-delay",
            "12s",
            "--sniff-bytes",
            "4096",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.retry.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.headers["referer"], "https://example.com/");
        assert!(config.headers.contains_key("accept"));
        assert!(config.ignore_drm_info);
        assert_eq!(config.availability_window_override, Some(30.0));
        assert_eq!(config.default_presentation_delay, Some(12.0));
        assert_eq!(config.sniff_byte_budget, 4096);
    }

    #[test]
    fn test_negative_timeout_is_rejected() {
        let args = CliArgs::parse_from(["manifest-cli", "https://example.com/", "--timeout=-5"]);
        assert!(matches!(build_config(&args), Err(AppError::ParseError(_))));
    }
}
