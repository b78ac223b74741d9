use std::env;

use anyhow::{Context, Result};
use shieldmint_cli::{Visibility, Workflow};
use shieldmint_config::ShieldmintConfig;
use shieldmint_note::Secret;
use shieldmint_pxe::HttpPxeClient;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("run");

    match cmd {
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "sample-config" => {
            print!("{}", ShieldmintConfig::generate_sample());
            return;
        }
        "run" | "chain-id" | "balances" | "mint-public" | "mint-private" => {}
        _ => {
            println!("❌ Unknown command: {}", cmd);
            println!();
            print_usage();
            std::process::exit(1);
        }
    }

    if let Err(e) = dispatch(cmd, &args[2.min(args.len())..]).await {
        eprintln!("❌ Error in app: {:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(cmd: &str, rest: &[String]) -> Result<()> {
    let config = ShieldmintConfig::load()?;
    let pxe = HttpPxeClient::with_timeout(&config.pxe.url, config.request_timeout())?;
    log::info!("Using PXE at {}", pxe.url());

    let workflow = Workflow::new(&pxe, &config);

    match cmd {
        "chain-id" => {
            workflow.connect().await?;
        }
        "balances" => {
            let kinds = match rest.first() {
                Some(kind) => vec![kind.parse::<Visibility>()?],
                None => vec![Visibility::Public, Visibility::Private],
            };

            workflow.connect().await?;
            let token = workflow.resolve_token()?;
            for kind in kinds {
                println!("{} balances:", kind);
                workflow.show_balances(&token, kind).await?;
            }
        }
        "mint-public" => {
            let amount = parse_amount(rest, config.mint.public_amount)?;
            workflow.connect().await?;
            let token = workflow.resolve_token()?;
            let owner = workflow.owner().await?;
            workflow
                .mint_public(&token.with_wallet(owner), owner, amount)
                .await?;
        }
        "mint-private" => {
            let amount = parse_amount(rest, config.mint.private_amount)?;
            workflow.connect().await?;
            let token = workflow.resolve_token()?;
            let owner = workflow.owner().await?;
            let secret = Secret::random(&mut rand::thread_rng());
            workflow
                .mint_private(&token.with_wallet(owner), owner, amount, secret)
                .await?;
        }
        _ => {
            workflow.run().await?;
        }
    }

    Ok(())
}

fn parse_amount(rest: &[String], default: u64) -> Result<u128> {
    match rest.first() {
        Some(s) => s
            .parse::<u128>()
            .with_context(|| format!("Amount must be a valid number, got '{s}'")),
        None => Ok(u128::from(default)),
    }
}

fn print_usage() {
    println!("shieldmint - public and shielded token minting against a PXE");
    println!();
    println!("USAGE:");
    println!("  shieldmint [command] [args]");
    println!();
    println!("COMMANDS:");
    println!("  run                        Connect, mint publicly, then mint and redeem a shield (default)");
    println!("  chain-id                   Print the chain id of the connected node");
    println!("  balances [public|private]  Print balances of every registered account");
    println!("  mint-public [amount]       Public mint to the owner");
    println!("  mint-private [amount]      Shielded mint, note registration and redeem");
    println!("  sample-config              Print a sample shieldmint.toml");
    println!("  help                       Show this help message");
    println!();
    println!("CONFIG FILES (first found wins):");
    println!("  $SHIELDMINT_CONFIG, ./shieldmint.toml, ~/.shieldmint/shieldmint.toml");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  PXE_URL                       PXE endpoint (default: http://localhost:8080)");
    println!("  SHIELDMINT_ADDRESSES          Contract address file (default: addresses.json)");
    println!("  SHIELDMINT_TOKEN_ARTIFACT     Token artifact JSON");
    println!("  SHIELDMINT_OWNER              Minting account (default: first registered)");
    println!("  SHIELDMINT_POLL_INTERVAL_MS   Receipt poll interval");
    println!("  SHIELDMINT_WAIT_TIMEOUT_SECS  Give up waiting for inclusion after this long");
    println!("  RUST_LOG                      Log level (debug/info/warn/error)");
}
