use vidpost_core::LogFormat;

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// One-line summary for `vidpost hash`, in `sha256sum` layout.
pub fn digest_line(digest: &str, file: &std::path::Path) -> String {
    format!("{}  {}", digest, file.display())
}
