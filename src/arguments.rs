/// Command-line argument handling
///
/// Two kinds of flags share the command line:
/// - logger flags (`--debug-<tag>`, `--verbose`, `--verbose-<tag>`, `--quiet`,
///   `--no-log-file`), read by `logger::init()` straight from the process args
/// - everything else, parsed by clap into `Cli`
///
/// `parse_cli` strips the logger flags before clap sees them, so they can
/// appear anywhere on the line without being declared per subcommand.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "swapdesk")]
#[command(about = "Quote, check and execute Solana token swaps through the Jupiter aggregator")]
#[command(
    after_help = "Logging flags: --debug-<swap|quote|transaction|recovery|rpc|cache|wallet|config|system>, --verbose, --quiet, --no-log-file"
)]
pub struct Cli {
    /// Configuration file (TOML); defaults are used when it does not exist
    #[arg(long, global = true, default_value = crate::config::CONFIG_FILE_PATH)]
    pub config: PathBuf,

    /// Keypair file, overrides wallet.keypair_path
    #[arg(long, global = true)]
    pub keypair: Option<String>,

    /// Print machine-readable JSON instead of the summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Quote a swap without executing it
    Quote {
        /// Input mint
        input: String,
        /// Output mint
        output: String,
        /// Raw input amount (smallest units)
        amount: u64,
        /// Slippage percentage (overrides config)
        #[arg(long)]
        slippage: Option<f64>,
        /// Allow routes through arbitrary intermediate tokens
        #[arg(long)]
        unrestricted: bool,
    },

    /// Spend SOL on a token
    Buy {
        /// Token mint to buy
        mint: String,
        /// SOL to spend
        #[arg(long)]
        sol: f64,
        /// Slippage percentage (overrides config)
        #[arg(long)]
        slippage: Option<f64>,
    },

    /// Sell a percentage of the wallet's token balance for SOL
    Sell {
        /// Token mint to sell
        mint: String,
        /// Percentage of the balance, 0 < percent <= 100
        #[arg(long, default_value = "100")]
        percent: f64,
    },

    /// Check whether a token can currently be sold
    Sellable {
        /// Token mint
        mint: String,
        /// Raw token amount to check
        amount: u64,
    },

    /// Show token metadata
    Token {
        /// Token mint
        mint: String,
    },

    /// Show the wallet's SOL balance and, optionally, a token balance
    Balance {
        /// Token mint
        mint: Option<String>,
    },
}

/// Whether `arg` is consumed by the logger rather than clap
pub fn is_logger_flag(arg: &str) -> bool {
    matches!(arg, "--verbose" | "--quiet" | "--no-log-file")
        || arg.starts_with("--debug-")
        || arg.starts_with("--verbose-")
}

/// Arguments with every logger flag removed
pub fn clap_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .filter(|arg| !is_logger_flag(arg))
        .collect()
}

/// Parse the process arguments, exiting with usage on error
pub fn parse_cli() -> Cli {
    Cli::parse_from(clap_args(std::env::args()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_flags_are_filtered() {
        let args = clap_args([
            "swapdesk",
            "--debug-swap",
            "buy",
            "--verbose",
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            "--sol",
            "0.01",
            "--no-log-file",
        ]);
        assert_eq!(
            args,
            vec![
                "swapdesk",
                "buy",
                "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
                "--sol",
                "0.01"
            ]
        );
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::parse_from(clap_args([
            "swapdesk",
            "--debug-quote",
            "sell",
            "mint",
            "--percent",
            "25",
            "--config",
            "custom.toml",
        ]));

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        match cli.command {
            Command::Sell { mint, percent } => {
                assert_eq!(mint, "mint");
                assert_eq!(percent, 25.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_sell_defaults_to_whole_balance() {
        let cli = Cli::parse_from(["swapdesk", "sell", "mint"]);
        assert!(matches!(cli.command, Command::Sell { percent, .. } if percent == 100.0));
    }
}
