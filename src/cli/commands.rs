use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "hunter", version, about = "Resumable recon-to-scan pipeline for authorized external testing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline against a domain, resuming pending work if any
    Run(RunArgs),
    /// Show target and finding counts from the store
    Status(StatusArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Apex domain to test
    pub domain: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Newline-separated URL list, used instead of tool-based discovery
    #[arg(short, long)]
    pub urls: Option<String>,

    /// Route mock URLs without scanning anything
    #[arg(long)]
    pub dry_run: bool,

    /// Scan pool width
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// Report output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Exit non-zero when any scan unit failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::parse_from([
            "hunter", "run", "example.com", "--threads", "4", "--dry-run", "--strict", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.domain, "example.com");
                assert_eq!(args.threads, Some(4));
                assert!(args.dry_run);
                assert!(args.strict);
                assert!(args.urls.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_status_args_parse() {
        let cli = Cli::parse_from(["hunter", "status", "--db", "/tmp/state.db", "--json"]);
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.db.as_deref(), Some("/tmp/state.db"));
                assert!(args.json);
            }
            _ => panic!("expected status"),
        }
    }
}
