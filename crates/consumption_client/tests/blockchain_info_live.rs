use std::env;

use consumption_client::net::BlockSource;
use consumption_client::net::blockchain_info::BlockchainInfoClient;

/// Genesis block; its size has not changed since 2009.
const GENESIS: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

/// Integration-style test against a live blockchain.info compatible API.
///
/// Skipped unless `BLOCKCHAIN_API_URL` is set, e.g.
/// `BLOCKCHAIN_API_URL=https://blockchain.info cargo test -p consumption_client --test blockchain_info_live`.
#[tokio::test]
async fn live_block_size_and_listing() -> Result<(), Box<dyn std::error::Error>> {
    let url = match env::var("BLOCKCHAIN_API_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("BLOCKCHAIN_API_URL not set; skipping live API test");
            return Ok(());
        }
    };

    let client = BlockchainInfoClient::new(&url)?;

    let size = client.fetch_block_size(GENESIS).await?;
    assert_eq!(size, 285);

    // 2024-04-20 23:59:59.999 UTC, the day of the fourth halving.
    let blocks = client.list_blocks_up_to(1_713_657_599_999).await?;
    eprintln!("live_block_size_and_listing: {} blocks listed", blocks.len());
    assert!(!blocks.is_empty());

    Ok(())
}
