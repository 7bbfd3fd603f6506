use std::fs::File;

use tracing_subscriber::EnvFilter;
use vska::config::{Config, ConfigError};
use vska::plugin::{JsonPresenter, PluginContext, Presenter, StdinPrompt};
use vska::resolver::TemplateResolver;
use vska::router::Router;
use vska::settings::SettingsFile;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Log to a file; stdout belongs to the host
    let log_file = File::create(std::env::temp_dir().join("vska.log")).ok();

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(false)
            .with_writer(file)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            if let ConfigError::ParseError(_) | ConfigError::ValidationError(_) = &e
                && let Ok(path) = Config::config_path()
            {
                eprintln!("\nFix or remove the config file at: {}", path.display());
            }
            std::process::exit(1);
        }
    };

    let ctx = match PluginContext::from_args(std::env::args().skip(1)) {
        Ok(ctx) => ctx.with_icons_dir(config.addon.icons_dir()),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nUsage: vska <plugin-base-url> <handle> [?query]");
            std::process::exit(1);
        }
    };

    let mut settings = match SettingsFile::open() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let resolver = TemplateResolver::new(&config.resolver);
    let mut prompt = StdinPrompt;

    let outcome = Router::new(&ctx, &config.catalog, &mut settings, &resolver, &mut prompt)
        .route()
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, query = %ctx.query, "request aborted");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut presenter = JsonPresenter::new(std::io::stdout().lock());
    if let Err(e) = presenter.present(&ctx, &outcome) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
