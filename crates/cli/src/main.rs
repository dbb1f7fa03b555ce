use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use nfc_tagid_core::{SessionConfig, ShareMode, TagReader};
use nfc_tagid_transport_pcsc::{PcscConfig, PcscService, Scope};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Print the UID of an NFC tag held to a PC/SC reader")]
struct Cli {
    /// Seconds to wait for a tag (integer; values outside 1-10 fall back to 5)
    #[arg(allow_negative_numbers = true)]
    timeout: Option<f64>,

    /// Resource manager scope
    #[arg(long, value_enum, default_value_t = ScopeArg::System)]
    scope: ScopeArg,

    /// Request exclusive access to the card
    #[arg(long)]
    exclusive: bool,

    /// Trace level output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    User,
    System,
}

impl From<ScopeArg> for Scope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::User => Self::User,
            ScopeArg::System => Self::System,
        }
    }
}

impl Cli {
    /// Arguments in the shape the reader expects: zero or one number
    fn args(&self) -> Vec<f64> {
        self.timeout.into_iter().collect()
    }

    fn session_config(&self) -> SessionConfig {
        let share_mode = if self.exclusive {
            ShareMode::Exclusive
        } else {
            ShareMode::Shared
        };
        SessionConfig::new().with_share_mode(share_mode)
    }

    fn pcsc_config(&self) -> PcscConfig {
        PcscConfig::new().with_scope(self.scope.into())
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    debug!(?cli, "Starting");

    let service = PcscService::with_config(cli.pcsc_config());
    let reader = TagReader::new(service).with_config(cli.session_config());

    let result = reader.get_tag_id(&cli.args());
    println!("{result}");

    if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
