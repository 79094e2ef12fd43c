use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trading_bot::api::auth::RequestSigner;
use trading_bot::api::client::{BrokerClient, HttpBrokerClient};
use trading_bot::bot::Trader;
use trading_bot::config::Config;
use trading_bot::strategy::{MomentumStrategy, StrategyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let signer = RequestSigner::from_sources(
        config.private_key_pem.clone(),
        config.private_key_path.clone(),
    )
    .context("loading signing key")?;
    let strategy = MomentumStrategy::new(StrategyConfig::default())?;

    let client = HttpBrokerClient::new(&config.api_url, config.credentials.clone(), signer);
    client.login().await.context("login failed, check credentials")?;

    let account = client.get_account().await?;
    info!(account = %account.account_number, buying_power = account.buying_power, "account");

    let mut trader = Trader::new(client, strategy, config.order_quantity, config.dry_run);
    let loaded = trader.sync_holdings().await?;
    info!(positions = loaded, dry_run = config.dry_run, symbols = ?config.symbols, "trader started");

    let mut interval = tokio::time::interval(config.poll_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                for symbol in &config.symbols {
                    if let Err(e) = trader.tick(symbol).await {
                        error!(symbol = %symbol, error = %e, "tick failed");
                    }
                }
                let ledger = trader.ledger();
                for (symbol, position) in ledger.all() {
                    let Some(&last) = trader.prices(symbol).and_then(|w| w.back()) else {
                        continue;
                    };
                    if let Ok(pnl) = ledger.unrealized_pnl(symbol, last) {
                        info!(symbol = %symbol, quantity = position.quantity, unrealized_pnl = pnl, "position");
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
