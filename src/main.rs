use anyhow::Context;
use log::{info, warn};

use powledger::{Blockchain, ChainConfig};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ChainConfig::from_env().context("failed to load chain configuration")?;
    info!(
        "Creating chain (difficulty {}, seed {} to {})",
        config.difficulty, config.seed_amount, config.seed_account
    );

    let mut chain = Blockchain::new(config).context("failed to create chain")?;
    let seed_account = chain.seed_account().clone();
    let half = chain.seed_amount() / 2;

    chain.stage(seed_account.clone(), "adam", half, None)?;
    chain.stage(seed_account.clone(), "eve", half, None)?;

    // Staging validates against the committed ledger only, so adam cannot
    // spend funds that are still pending.
    if let Err(err) = chain.stage("adam", "eve", 1, None) {
        warn!("Skipping transfer: {}", err);
    }

    chain.commit().context("failed to commit pending transactions")?;

    for block in chain.blocks() {
        println!("{}", block);
    }

    match chain.verify_chain_diagnostic() {
        Ok(()) => info!("Chain of {} blocks verified", chain.block_count()),
        Err(err) => warn!("Chain verification failed: {}", err),
    }

    let ledger = chain.ledger_snapshot()?;
    for (account, balance) in ledger.iter() {
        println!("{}: {}", account, balance);
    }

    Ok(())
}
