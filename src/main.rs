use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dirserver::{routes, AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "dirserver")]
#[command(about = "Serve a directory tree as listings and downloads over HTTP")]
#[command(version)]
struct Cli {
    /// Directory to serve (required here or in the config file)
    #[arg(short = 'd', long = "dir", env = "DIRSERVER_ROOT")]
    root: Option<PathBuf>,

    /// Port to listen on [default: 8000]
    #[arg(short, long, env = "DIRSERVER_PORT")]
    port: Option<u16>,

    /// Address to bind to [default: 0.0.0.0]
    #[arg(short, long, env = "DIRSERVER_BIND")]
    bind: Option<String>,

    /// Show each subdirectory with the number of files beneath it
    #[arg(long, env = "DIRSERVER_COUNT_FILES")]
    count_files: bool,

    /// Page template for listings; JSON is served when unset
    #[arg(short, long, env = "DIRSERVER_TEMPLATE")]
    template: Option<PathBuf>,

    /// Basic auth user name
    #[arg(short, long, env = "DIRSERVER_USER")]
    user: Option<String>,

    /// Basic auth password
    #[arg(long = "pass", env = "DIRSERVER_PASS", hide_env_values = true)]
    password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, env = "DIRSERVER_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "DIRSERVER_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags given on the command line win over the config file.
    fn apply(self, config: &mut Config) {
        if let Some(root) = self.root {
            config.root = Some(root);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if self.count_files {
            config.count_files = true;
        }
        if let Some(template) = self.template {
            config.template = Some(template);
        }
        if let Some(user) = self.user {
            config.auth.username = Some(user);
        }
        if let Some(password) = self.password {
            config.auth.password = Some(password);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "dirserver=debug,tower_http=debug"
    } else {
        "dirserver=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    cli.apply(&mut config);

    let state = AppState::from_config(&config)?;

    info!("Serving files from: {}", state.root_dir.display());
    match &config.template {
        Some(template) => info!("Rendering listings with template: {}", template.display()),
        None => info!("No template configured, serving JSON listings"),
    }
    if state.count_files {
        info!("Counting files in subdirectories");
    }
    if state.credentials.is_some() {
        info!("Basic auth enabled");
    }

    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    info!("Starting dirserver on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
