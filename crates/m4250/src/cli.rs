//! Clap derive structures for the `m4250` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also pulled
//! into `build.rs` for man page generation, so it may only depend on clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// m4250 -- command-line control for NETGEAR M4250 switches
#[derive(Debug, Parser)]
#[command(
    name = "m4250",
    version,
    about = "Control NETGEAR M4250 switches from the command line",
    long_about = "Query and control NETGEAR M4250 managed switches over their REST API.\n\n\
        Reads device health, PoE configuration and port link state, toggles or\n\
        power-cycles PoE per port, and can watch the switch for changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Switch profile to use
    #[arg(long, short = 'p', env = "M4250_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Switch hostname, IP or URL (overrides profile)
    #[arg(long, env = "M4250_HOST", global = true)]
    pub host: Option<String>,

    /// REST API port (overrides profile)
    #[arg(long, env = "M4250_PORT", global = true)]
    pub port: Option<u16>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "M4250_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "M4250_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "M4250_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "M4250_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show device health (name, CPU, memory, uptime, active ports)
    #[command(alias = "st")]
    Status,

    /// Inspect and control Power over Ethernet
    Poe(PoeArgs),

    /// Inspect port link state
    Ports(PortsArgs),

    /// Reboot the switch
    Reboot,

    /// Poll the switch and print every change as it happens
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── PoE ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PoeArgs {
    #[command(subcommand)]
    pub command: PoeCommand,
}

/// Ports to act on; each is handled independently.
#[derive(Debug, Args)]
pub struct PortList {
    /// Port ids (e.g. 1 2 5)
    #[arg(required = true, num_args = 1..)]
    pub ports: Vec<u32>,
}

#[derive(Debug, Subcommand)]
pub enum PoeCommand {
    /// List PoE configuration and delivery status per port
    #[command(alias = "ls")]
    List,

    /// Enable PoE on ports
    On(PortList),

    /// Disable PoE on ports
    Off(PortList),

    /// Flip PoE on ports
    Toggle(PortList),

    /// Power-cycle PoE on ports
    Cycle(PortList),
}

// ── Ports ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortsArgs {
    #[command(subcommand)]
    pub command: PortsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortsCommand {
    /// List link speed and VLAN membership per port
    #[command(alias = "ls")]
    List,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in milliseconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval_ms: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (passwords masked)
    Show,

    /// Store a profile's password in the system keyring
    SetPassword,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
