use anyhow::Result;
use daowallet::{
    config::{self, Command},
    wallet::Wallet,
};
use tokio::signal;
use tracing::{error, info};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // TIPS: guard must have same long lifetime with main
    let _guard = logger_init();

    let (args, cfg) = config::read_config()?;
    let wallet = Wallet::new(&cfg)?;
    info!("wallet lock {:?}", wallet.lock());

    tokio::select! {
        res = run(&wallet, args.command) => {
            if let Err(e) = &res {
                error!("daowallet failed: {:?}", e);
            }
            res
        }
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, abandoning the operation...");
            Ok(())
        }
    }
}

async fn run(wallet: &Wallet, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let rows = wallet.list().await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Deposit { amount } => {
            let hash = wallet.deposit(amount).await?;
            println!("{:#x}", hash);
        }
        Command::Withdraw { tx_hash, amount } => {
            let hash = wallet.withdraw(&tx_hash, amount).await?;
            println!("{:#x}", hash);
        }
    }
    Ok(())
}

fn logger_init() -> WorkerGuard {
    let formatting_layer = fmt::layer().pretty().with_writer(std::io::stderr);
    let file_appender =
        RollingFileAppender::new(Rotation::HOURLY, "logs/daowallet", "daowallet.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG)
        .boxed();

    Registry::default()
        .with(formatting_layer)
        .with(file_layer)
        .with(EnvFilter::from_default_env())
        .init();

    guard
}
