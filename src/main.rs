//! FloatScope - chat with ARGO float data from the terminal.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, unreadable input, etc.)
//!   2 - Backend reported itself unhealthy

use anyhow::{Context, Result};
use floatscope::cli::{Args, Command, OutputFormat};
use floatscope::config::{Config, CONFIG_FILE_NAME};
use floatscope::context::ContextExtractor;
use floatscope::mapping::VisualizationDataMapper;
use floatscope::models::{parse_measurements, ConversationTurn, Field, MessageContext};
use floatscope::report;
use floatscope::session::{
    Conversation, HttpSessionClient, SessionClient, SessionContextStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration; its `verbose` setting feeds the log level
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("FloatScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .floatscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the backend, context window and chart defaults.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the subcommand. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    match args.command.clone() {
        Some(Command::Chat) => run_chat(&config).await,
        Some(Command::Extract { input }) => run_extract(&config, &input),
        Some(Command::Render {
            input,
            kind,
            parameter,
            metrics,
            x_axis,
            y_axis,
            color_by,
            format,
            output,
        }) => {
            let mut mapper = VisualizationDataMapper::from(&config.visualization);
            apply_overrides(
                &mut mapper,
                parameter,
                metrics,
                x_axis,
                y_axis,
                color_by,
            );
            run_render(&mapper, &input, kind.into(), format, output.as_deref())
        }
        Some(Command::Health) => run_health(&config).await,
        None => Ok(0),
    }
}

/// Read a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `extract`: turn log in, query context JSON out.
fn run_extract(config: &Config, input: &Path) -> Result<i32> {
    let turns: Vec<ConversationTurn> = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Failed to parse turns from {}", input.display()))?;

    let extractor = ContextExtractor::new(config.context.window_size);
    let context = extractor.extract(&turns);

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(0)
}

fn apply_overrides(
    mapper: &mut VisualizationDataMapper,
    parameter: Option<Field>,
    metrics: Option<Vec<Field>>,
    x_axis: Option<Field>,
    y_axis: Option<Field>,
    color_by: Option<Field>,
) {
    if let Some(parameter) = parameter {
        mapper.parameter = parameter;
    }
    if let Some(metrics) = metrics {
        mapper.metrics = metrics;
    }
    if let Some(x_axis) = x_axis {
        mapper.x_axis = x_axis;
    }
    if let Some(y_axis) = y_axis {
        mapper.y_axis = y_axis;
    }
    if let Some(color_by) = color_by {
        mapper.color_by = color_by;
    }
}

/// `render`: result rows in, render spec out.
fn run_render(
    mapper: &VisualizationDataMapper,
    input: &Path,
    kind: floatscope::models::VisualizationKind,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<i32> {
    let rows = parse_measurements(&read_input(input)?)
        .with_context(|| format!("Failed to parse rows from {}", input.display()))?;
    info!("Loaded {} rows", rows.len());

    let spec = mapper.map(kind, &rows);

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&spec)?,
        OutputFormat::Text => report::render_summary(&spec),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            println!("✅ {} chart saved to: {}", spec.kind(), path.display());
        }
        None => println!("{}", content.trim_end()),
    }

    Ok(0)
}

/// `health`: print backend status.
async fn run_health(config: &Config) -> Result<i32> {
    let client = HttpSessionClient::new(&config.backend)?;
    let health = client.get_health().await?;

    let marker = if health.is_healthy() { "✅" } else { "⛔" };
    println!("{} Backend status: {}", marker, health.status);
    for (name, status) in &health.services {
        println!("   {}: {}", name, status);
    }
    for (name, value) in &health.metrics {
        println!("   {} = {}", name, value);
    }

    Ok(if health.is_healthy() { 0 } else { 2 })
}

/// `chat`: interactive session.
async fn run_chat(config: &Config) -> Result<i32> {
    let client: Arc<dyn SessionClient> = Arc::new(HttpSessionClient::new(&config.backend)?);

    let session = client.create_session().await?;
    println!("🌊 FloatScope session {}", session.session_id);
    println!("   Backend: {}", config.backend.url);
    println!("   Commands: /context, /clear, /export [FILE], /pin LAT LON, /quit\n");

    let mut conversation = Conversation::new();
    let mut store = SessionContextStore::new(
        session.session_id.clone(),
        ContextExtractor::new(config.context.window_size),
        client.clone(),
    );
    let mut pin: Option<MessageContext> = None;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next().unwrap_or_default() {
                "quit" | "exit" => break,
                "context" => print!("{}", report::context_summary(store.current())),
                "clear" => {
                    conversation.clear();
                    pin = None;
                    if let Err(e) = store.clear().await {
                        warn!("Context will be pushed again on the next turn: {}", e);
                    }
                    println!("🧹 Conversation cleared.");
                }
                "export" => {
                    let path = parts.next().map(Path::new);
                    match report::save_conversation(
                        store.session_id(),
                        conversation.turns(),
                        path,
                    ) {
                        Ok(path) => println!("💾 Conversation saved to: {}", path.display()),
                        Err(e) => {
                            error!("Failed to export conversation: {:#}", e);
                            eprintln!("❌ {:#}", e);
                        }
                    }
                }
                "pin" => match parse_pin(parts.next(), parts.next()) {
                    Some(context) => {
                        pin = Some(context);
                        println!("📍 Next question will be about the pinned location.");
                    }
                    None => println!("Usage: /pin LAT LON"),
                },
                other => println!("Unknown command: /{}", other),
            }
            continue;
        }

        conversation.push(ConversationTurn::user(line));
        refresh_context(&mut store, &conversation).await;

        let spinner = waiting_spinner();
        let reply = client
            .send_message(line, store.session_id(), pin.take().as_ref())
            .await;
        spinner.finish_and_clear();

        match reply {
            Ok(turn) => {
                println!("\n{}", report::turn_summary(&turn));
                conversation.push(turn);
                refresh_context(&mut store, &conversation).await;
            }
            Err(e) => {
                error!("Failed to get a reply: {}", e);
                eprintln!("❌ {}", e);
            }
        }
    }

    info!("Session ended after {} turns", conversation.len());
    Ok(0)
}

async fn refresh_context(store: &mut SessionContextStore, conversation: &Conversation) {
    match store.refresh(conversation.turns()).await {
        Ok(true) => debug!("Query context pushed"),
        Ok(false) => {}
        Err(e) => warn!("Context will be pushed again on the next turn: {}", e),
    }
}

fn parse_pin(lat: Option<&str>, lon: Option<&str>) -> Option<MessageContext> {
    let latitude: f64 = lat?.parse().ok()?;
    let longitude: f64 = lon?.parse().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some(MessageContext::map_pin(latitude, longitude))
}

fn waiting_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Waiting for the backend...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Where the configuration came from. Logged once logging is set up.
enum ConfigSource {
    File(PathBuf),
    DefaultFile,
    Builtin,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` must load; a broken default file falls back to
/// the built-in settings.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default() {
        Ok(Some(config)) => (config, ConfigSource::DefaultFile),
        Ok(None) => (Config::default(), ConfigSource::Builtin),
        Err(e) => (Config::default(), ConfigSource::Unreadable(e)),
    })
}
