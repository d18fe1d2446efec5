use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;
use swapdesk::{
    arguments::{parse_cli, Cli, Command},
    cache::SwapCaches,
    config::{get_config_clone, load_config_from_path},
    errors::{ErrorReport, RecoveryEngine},
    logger::{self, LogTag},
    rpc::{lamports_to_sol, sol_to_lamports, RpcClient},
    swaps::{
        JupiterClient, KeypairTransactionSigner, QuoteOptions, SwapExecutor, SwapResult,
    },
};

/// Entry point for the swapdesk CLI
///
/// Logger flags are read from the raw process args; everything else goes
/// through clap. Exit code 1 means the operation was surfaced as failed.
#[tokio::main]
async fn main() {
    logger::init();
    let cli = parse_cli();

    if let Err(e) = run(cli).await {
        logger::error(LogTag::System, &format!("{:#}", e));
        eprintln!("{} {:#}", "error:".red().bold(), e);
        logger::flush();
        std::process::exit(1);
    }

    logger::flush();
}

async fn run(cli: Cli) -> Result<()> {
    load_config_from_path(&cli.config)
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    let config = get_config_clone();
    logger::debug(
        LogTag::Config,
        &format!("Loaded configuration from {}", cli.config.display()),
    );

    let keypair_path = cli
        .keypair
        .clone()
        .unwrap_or_else(|| config.wallet.keypair_path.clone());
    let signer = Arc::new(KeypairTransactionSigner::from_file(&keypair_path)?);

    let rpc = Arc::new(RpcClient::new(&config.rpc)?);
    let aggregator = Arc::new(JupiterClient::new(config.swaps.clone())?);
    let recovery = Arc::new(RecoveryEngine::new(config.recovery.clone()).with_failover(rpc.clone()));
    let caches = Arc::new(SwapCaches::new(&config.cache));

    let executor = SwapExecutor::new(&config, aggregator, rpc.clone(), signer, recovery, caches);
    logger::info(
        LogTag::Wallet,
        &format!("Wallet {} via {}", executor.signer(), rpc.current_endpoint()),
    );

    match cli.command {
        Command::Quote {
            input,
            output,
            amount,
            slippage,
            unrestricted,
        } => {
            let options = QuoteOptions {
                slippage_percent: slippage,
                prefer_optimized: if unrestricted { Some(false) } else { None },
            };
            let quote = executor
                .quote(&input, &output, amount, &options)
                .await
                .map_err(report_error)?;

            if cli.json {
                return print_json(&quote);
            }
            print_header("QUOTE");
            println!("In:           {} {}", quote.in_amount, quote.input_mint);
            println!("Out:          {} {}", quote.out_amount, quote.output_mint);
            println!("Price impact: {}", format_impact(quote.price_impact_pct));
            println!("Slippage:     {} bps", quote.slippage_bps);
            println!("Route:        {}", quote.route_labels().join(" -> "));
        }

        Command::Buy {
            mint,
            sol,
            slippage,
        } => {
            let result = executor
                .buy(&mint, sol_to_lamports(sol), slippage)
                .await
                .map_err(report_error)?;
            print_swap(&result, cli.json)?;
        }

        Command::Sell { mint, percent } => {
            let result = executor.sell(&mint, percent).await.map_err(report_error)?;
            print_swap(&result, cli.json)?;
        }

        Command::Sellable { mint, amount } => {
            let verdict = executor
                .can_token_be_sold(&mint, amount)
                .await
                .map_err(report_error)?;

            if cli.json {
                return print_json(&verdict);
            }
            if verdict.sellable {
                println!(
                    "{} {} (expected out {} lamports, impact {})",
                    "SELLABLE".green().bold(),
                    mint,
                    verdict.expected_out.unwrap_or(0),
                    format_impact(verdict.price_impact_pct.unwrap_or(0.0))
                );
            } else {
                println!(
                    "{} {}: {}",
                    "NOT SELLABLE".red().bold(),
                    mint,
                    verdict.reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        Command::Token { mint } => {
            let info = executor.token_info(&mint).await.map_err(report_error)?;

            if cli.json {
                return print_json(&info);
            }
            print_header("TOKEN");
            println!("Mint:     {}", info.mint);
            println!("Symbol:   {}", info.symbol.bold());
            println!("Name:     {}", info.name);
            println!("Decimals: {}", info.decimals);
            if let Some(price) = info.usd_price {
                println!("Price:    ${}", price);
            }
        }

        Command::Balance { mint } => {
            let lamports = executor.sol_balance().await?;
            println!("SOL: {:.9}", lamports_to_sol(lamports));
            if let Some(mint) = mint {
                let amount = executor.token_balance(&mint).await?;
                println!("{}: {}", mint, amount);
            }
        }
    }

    Ok(())
}

/// Print the report for the operator and turn it into the process error
fn report_error(report: ErrorReport) -> anyhow::Error {
    eprintln!("{} {}", "✗".red().bold(), report.user_message());
    if let Some(hint) = &report.hint {
        eprintln!("  {} {}", "hint:".yellow(), hint);
    }
    anyhow::anyhow!("{} [{}]: {}", report.context.operation, report.kind, report.message)
}

fn print_swap(result: &SwapResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }

    print_header("SWAP CONFIRMED");
    println!("Signature:    {}", result.signature.green());
    println!(
        "Executed:     {} of {} ({}%)",
        result.executed_amount, result.requested_amount, result.reduction_percent
    );
    println!("Received:     {} {}", result.quote.out_amount, result.quote.output_mint);
    println!("Price impact: {}", format_impact(result.quote.price_impact_pct));
    println!("Format:       {} ({} API)", result.format, result.generation);
    if result.was_reduced() {
        println!(
            "{}",
            format!(
                "Amount was reduced to {}% after liquidity failures",
                result.reduction_percent
            )
            .yellow()
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title.bold());
    println!("{}", "=".repeat(60));
}

fn format_impact(pct: f64) -> colored::ColoredString {
    let text = format!("{:.4}%", pct);
    if pct > 5.0 {
        text.red()
    } else if pct > 1.0 {
        text.yellow()
    } else {
        text.green()
    }
}
