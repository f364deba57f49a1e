//! `TorConn` CLI - Command-line interface for the `TorConn` Tor settings
//!
//! Provides commands for showing the saved settings, checking bridge lines,
//! and testing or saving Tor connection settings.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use torconn_core::bridge::{classify_bridge_line, validate_bridges};
use torconn_core::builder::{needs_meek_warning, BridgeSource, Capabilities, SettingsForm};
use torconn_core::config::{AppSettings, ConfigManager};
use torconn_core::control::{ControlPortFactory, ControlPortSession};
use torconn_core::error::SettingsError;
use torconn_core::models::{BuiltinBridge, ConnectionMode, TorSettings};
use torconn_core::orchestrator::{Action, OrchestratorOptions, Outcome, SettingsOrchestrator};
use torconn_core::progress::{CallbackObserver, CancelHandle, OrchestratorState};

/// `TorConn` command-line interface for Tor connection settings
#[derive(Parser)]
#[command(name = "torconn")]
#[command(author, version, about = "TorConn command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the saved settings
    #[command(about = "Show the saved Tor settings")]
    Show {
        /// Output format
        #[arg(short, long, default_value = "toml", value_enum)]
        format: OutputFormat,
    },

    /// Check bridge lines
    #[command(about = "Check bridge lines from a file or stdin")]
    CheckBridges {
        /// File with one bridge per line (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Test settings without saving them
    #[command(about = "Connect to Tor with the given settings and report its version")]
    Test {
        #[command(flatten)]
        form: FormArgs,
    },

    /// Apply and save settings
    #[command(about = "Connect to Tor with the given settings and save them")]
    Save {
        #[command(flatten)]
        form: FormArgs,

        /// Save without connecting to Tor
        #[arg(long)]
        local_only: bool,
    },
}

/// Output format for `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// TOML, as stored on disk
    Toml,
    /// Pretty-printed JSON
    Json,
}

/// Connection mode argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Tor bundled with the application
    Bundled,
    /// Find a running Tor automatically
    Automatic,
    /// Tor control port
    ControlPort,
    /// Tor control socket file
    SocketFile,
}

impl From<ModeArg> for ConnectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bundled => Self::Bundled,
            ModeArg::Automatic => Self::Automatic,
            ModeArg::ControlPort => Self::ControlPort,
            ModeArg::SocketFile => Self::SocketFile,
        }
    }
}

/// Bridge argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BridgesArg {
    /// Don't use bridges
    None,
    /// Built-in obfs4 bridges
    Obfs4,
    /// Built-in meek-azure bridge
    MeekAzure,
    /// Built-in snowflake bridge
    Snowflake,
    /// Bridges obtained from torproject.org, read from --bridge-file
    Moat,
    /// Custom bridges, read from --bridge-file
    Custom,
}

/// Settings overrides shared by `test` and `save`
///
/// Anything not given keeps its saved value.
#[derive(Debug, Default, Args)]
pub struct FormArgs {
    /// How to reach Tor
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Control port address
    #[arg(long)]
    pub control_address: Option<String>,

    /// Control port number
    #[arg(long)]
    pub control_port: Option<String>,

    /// Control socket file
    #[arg(long)]
    pub socket_file: Option<String>,

    /// SOCKS address
    #[arg(long)]
    pub socks_address: Option<String>,

    /// SOCKS port
    #[arg(long)]
    pub socks_port: Option<String>,

    /// Control port password
    #[arg(short, long, conflicts_with = "no_auth")]
    pub password: Option<String>,

    /// Don't authenticate to the control port
    #[arg(long)]
    pub no_auth: bool,

    /// Bridges to use
    #[arg(short, long, value_enum)]
    pub bridges: Option<BridgesArg>,

    /// File with Moat or custom bridge lines
    #[arg(long)]
    pub bridge_file: Option<PathBuf>,

    /// Connection timeout in seconds (0 waits forever)
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl FormArgs {
    /// Applies the overrides on top of `form`
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` if the bridge file can't be read, or
    /// `CliError::InvalidSettings` if a bridge file is given while the
    /// selected bridges don't take one.
    pub fn apply(&self, form: &mut SettingsForm) -> Result<(), CliError> {
        if let Some(mode) = self.mode {
            form.connection_mode = mode.into();
        }
        if let Some(address) = &self.control_address {
            form.control_port_address.clone_from(address);
        }
        if let Some(port) = &self.control_port {
            form.control_port_port.clone_from(port);
        }
        if let Some(path) = &self.socket_file {
            form.socket_file_path.clone_from(path);
        }
        if let Some(address) = &self.socks_address {
            form.socks_address.clone_from(address);
        }
        if let Some(port) = &self.socks_port {
            form.socks_port.clone_from(port);
        }
        if let Some(password) = &self.password {
            form.no_auth = false;
            form.auth_password = SecretString::from(password.clone());
        }
        if self.no_auth {
            form.no_auth = true;
        }

        match self.bridges {
            None => {}
            Some(BridgesArg::None) => form.use_bridges = false,
            Some(BridgesArg::Moat) => {
                form.use_bridges = true;
                form.bridge_source = BridgeSource::Moat;
            }
            Some(BridgesArg::Custom) => {
                form.use_bridges = true;
                form.bridge_source = BridgeSource::Custom;
            }
            Some(BridgesArg::Obfs4) => use_builtin(form, BuiltinBridge::Obfs4),
            Some(BridgesArg::MeekAzure) => use_builtin(form, BuiltinBridge::MeekAzure),
            Some(BridgesArg::Snowflake) => use_builtin(form, BuiltinBridge::Snowflake),
        }

        if let Some(path) = &self.bridge_file {
            if !form.use_bridges || form.bridge_source == BridgeSource::Builtin {
                return Err(CliError::InvalidSettings(
                    "--bridge-file needs --bridges moat or --bridges custom".to_string(),
                ));
            }
            let text = std::fs::read_to_string(path)?;
            tracing::debug!(path = %path.display(), "read bridge lines");
            match form.bridge_source {
                BridgeSource::Moat => form.moat_bridges = text,
                BridgeSource::Custom | BridgeSource::Builtin => form.custom_bridges = text,
            }
        }
        Ok(())
    }

    fn options(&self, base: OrchestratorOptions) -> OrchestratorOptions {
        let timeout = self
            .timeout
            .map_or(base.timeout, |secs| (secs > 0).then(|| Duration::from_secs(secs)));
        OrchestratorOptions { timeout, ..base }
    }
}

fn use_builtin(form: &mut SettingsForm, bridge: BuiltinBridge) {
    form.use_bridges = true;
    form.bridge_source = BridgeSource::Builtin;
    form.builtin_bridge = bridge;
}

/// True when the form turns on meek-azure and the saved settings don't use it
#[must_use]
pub fn meek_warning_applies(previous: &TorSettings, form: &SettingsForm) -> bool {
    form.use_bridges
        && form.bridge_source == BridgeSource::Builtin
        && needs_meek_warning(previous, form.builtin_bridge)
}

fn main() {
    // Initialize logging with environment filter (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Show { format } => cmd_show(config, format),
        Commands::CheckBridges { file } => cmd_check_bridges(file.as_deref()),
        Commands::Test { form } => cmd_run(config, Action::Test, &form, false),
        Commands::Save { form, local_only } => cmd_run(config, Action::Save, &form, local_only),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn config_manager(config: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config {
        Some(dir) => Ok(ConfigManager::with_config_dir(dir.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Show settings command handler
fn cmd_show(config: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let settings = config_manager(config)?
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
    println!("{}", format_settings(&settings, format)?);
    Ok(())
}

/// Formats settings for display with the password masked
///
/// # Errors
///
/// Returns `CliError::Config` if serialization fails.
pub fn format_settings(settings: &AppSettings, format: OutputFormat) -> Result<String, CliError> {
    let mut settings = settings.clone();
    if !settings.tor.password().is_empty() {
        settings.tor.auth_password = SecretString::from("********");
    }
    match format {
        OutputFormat::Toml => toml::to_string_pretty(&settings)
            .map_err(|e| CliError::Config(format!("Failed to serialize to TOML: {e}"))),
        OutputFormat::Json => serde_json::to_string_pretty(&settings)
            .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}"))),
    }
}

/// Check bridges command handler
fn cmd_check_bridges(file: Option<&Path>) -> Result<(), CliError> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let report = bridge_report(&text);
    print!("{report}");

    if validate_bridges(&text).is_valid() {
        Ok(())
    } else {
        Err(CliError::InvalidSettings(
            "None of the bridges are valid".to_string(),
        ))
    }
}

/// Lists each non-blank line with the bridge grammar it matched
#[must_use]
pub fn bridge_report(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match classify_bridge_line(line) {
            Some(grammar) => format!("ok    {:<10} {line}\n", grammar.as_str()),
            None => format!("bad   {:<10} {line}\n", "-"),
        })
        .collect()
}

/// Test and save command handler
fn cmd_run(
    config: Option<&Path>,
    action: Action,
    args: &FormArgs,
    local_only: bool,
) -> Result<(), CliError> {
    let manager = config_manager(config)?;
    tracing::debug!(
        config_dir = %manager.config_dir().display(),
        ?action,
        "running settings action"
    );
    let settings = manager
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;

    // The command line can't launch a bundled Tor
    let capabilities = Capabilities {
        bundled_available: false,
        ..Capabilities::default()
    };
    let mut form = SettingsForm::from_settings(&settings.tor, &capabilities);
    args.apply(&mut form)?;

    if meek_warning_applies(&settings.tor, &form) {
        eprintln!(
            "Warning: meek-azure bridges are costly for the Tor Project to run. \
             Only use them if you can't connect to Tor otherwise."
        );
    }

    let mut options = args.options(OrchestratorOptions::from(&settings.connection));
    options.local_only |= local_only;
    tracing::debug!(?options, "orchestrator options");

    let mut orchestrator = SettingsOrchestrator::new(
        ControlPortSession::new(),
        ControlPortFactory,
        manager,
        options,
    )
    .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?
    .with_observer(CallbackObserver::new(|state| {
        tracing::info!(?state, "settings action state");
        if state == OrchestratorState::Connecting {
            eprintln!("Connecting to Tor...");
        }
    }));

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::ConnectionFailed(format!("Failed to create async runtime: {e}")))?;

    let cancel = CancelHandle::new();
    let outcome = runtime.block_on(async {
        let canceller = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, cancelling the connection attempt");
                canceller.cancel();
            }
        });
        orchestrator.run(action, &form, &cancel).await
    })?;

    match outcome {
        Outcome::Tested(status) => {
            println!("Connected to the Tor controller.\n\n{status}");
        }
        Outcome::Saved {
            reconnected: true,
            status,
        } => {
            println!("Settings saved, reconnected to Tor.");
            if let Some(status) = status {
                println!("\n{status}");
            }
        }
        Outcome::Saved {
            reconnected: false, ..
        } => println!("Settings saved."),
    }
    Ok(())
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - Tor could not be reached or the attempt was cancelled
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The settings or bridge lines are invalid
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Connecting to Tor failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The user cancelled the connection attempt
    #[error("Connection cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, IO)
    /// - 2: Connection failure (connection failed or cancelled)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed(_) | Self::Cancelled => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::InvalidSettings(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(error: SettingsError) -> Self {
        match error {
            SettingsError::ConnectionFailed(reason) => Self::ConnectionFailed(reason),
            SettingsError::ConnectionCancelled => Self::Cancelled,
            SettingsError::Save(e) => Self::Config(format!("Failed to save settings: {e}")),
            e @ (SettingsError::MoatBridgesEmpty | SettingsError::CustomBridgesInvalid) => {
                Self::InvalidSettings(e.to_string())
            }
        }
    }
}
