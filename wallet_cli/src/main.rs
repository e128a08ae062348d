use std::fs::OpenOptions;
use std::io::Write;

use abi::format::{format_short_number, format_wallet_address};
use abi::ClassificationResult;
use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use holder_check::pipeline::MAX_LIMIT;
use holder_check::wallet::{get_balance, get_wallet_portfolio};
use holder_check::{get_holders_classification, Config, HeliusClient, KnownAddressRegistry};
use rust_decimal::prelude::ToPrimitive;

fn cli() -> Command {
    let address = Arg::new("address")
        .short('a')
        .long("address")
        .value_name("WALLET_ADDRESS")
        .required(true);

    Command::new("Wallet Analyzer")
        .version("1.0")
        .about("Inspects Solana token holders and wallets through Helius")
        .subcommand_required(true)
        .subcommand(
            Command::new("holders")
                .about("Top holders of a token, classified")
                .arg(
                    Arg::new("mint")
                        .short('m')
                        .long("mint")
                        .value_name("MINT_ADDRESS")
                        .required(true),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Append owner,balance,classification lines to FILE"),
                ),
        )
        .subcommand(
            Command::new("balance")
                .about("SOL balance of a wallet")
                .arg(address.clone()),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Token portfolio of a wallet")
                .arg(address),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let matches = cli().get_matches();
    let config = Config::from_env()?;
    let rpc = HeliusClient::new(config.rpc_url.clone(), config.request_timeout)?;

    match matches.subcommand() {
        Some(("holders", args)) => holders(&rpc, &config, args).await,
        Some(("balance", args)) => {
            let address = required(args, "address")?;
            let balance = get_balance(&rpc, address).await?;
            println!("{}: {} SOL", address, balance.normalize());
            Ok(())
        }
        Some(("portfolio", args)) => {
            let address = required(args, "address")?;
            let portfolio = get_wallet_portfolio(&rpc, address).await?;
            println!("Wallet {} (${:.2})", format_wallet_address(Some(address), 5), portfolio.total_value);
            for token in &portfolio.tokens {
                println!(
                    "  {:<8} {:>12} @ ${:<12.4} = ${:.2}",
                    token.symbol,
                    format_short_number(token.balance),
                    token.price_per_token,
                    token.value
                );
            }
            Ok(())
        }
        _ => bail!("unknown command"),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

async fn holders(rpc: &HeliusClient, config: &Config, args: &ArgMatches) -> Result<()> {
    let mint = required(args, "mint")?;
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(config.holder_limit);
    if limit == 0 || limit > MAX_LIMIT {
        bail!("--limit must be between 1 and {}", MAX_LIMIT);
    }

    let result = get_holders_classification(
        rpc,
        KnownAddressRegistry::global(),
        mint,
        limit,
        config.max_pages,
    )
    .await?;
    print_holders(mint, &result);

    if let Some(path) = args.get_one::<String>("output") {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("opening {}", path))?;
        for holder in &result.top_holders {
            writeln!(
                file,
                "{},{},{}",
                holder.owner,
                holder.balance.normalize(),
                holder.classification.as_deref().unwrap_or("")
            )?;
        }
        println!("Top holders appended to {}.", path);
    }
    Ok(())
}

fn print_holders(mint: &str, result: &ClassificationResult) {
    println!("Token {}", mint);
    println!(
        "Total holders: {}  Total supply: {}",
        result.total_holders,
        format_short_number(result.total_supply.to_f64().unwrap_or(0.0))
    );
    for (rank, holder) in result.top_holders.iter().enumerate() {
        println!(
            "{:>3}. {:<13} {:>10} {:>7.2}%  {}",
            rank + 1,
            format_wallet_address(Some(&holder.owner), 4),
            format_short_number(holder.balance.to_f64().unwrap_or(0.0)),
            result.owned_percentage(holder),
            holder.classification.as_deref().unwrap_or("-")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_holders_arguments() {
        let matches = cli()
            .try_get_matches_from(["wallet_cli", "holders", "--mint", "M", "--limit", "5"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "holders");
        assert_eq!(args.get_one::<usize>("limit"), Some(&5));
        assert_eq!(required(args, "mint").unwrap(), "M");
    }

    #[test]
    fn balance_requires_address() {
        assert!(cli().try_get_matches_from(["wallet_cli", "balance"]).is_err());
    }
}
