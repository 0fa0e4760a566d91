//! Live submission against a real node.
//!
//! Requires `tests/test-config.toml`, `tests/test-form.toml` and a private key
//! (PRIVATE_KEY or `tests/test-config.local.toml`). The form's token must be
//! held by that key on a chain with a configured router, e.g. a local anvil
//! node with the router deployed first.
//!
//! Run with:
//! ```bash
//! cargo test --package airdrop --test live -- --ignored
//! ```


use action::{SubmitOutcome, Submitter};
use airdrop::check;
use client::ProviderChainClient;
use lifecycle::TransactionLifecycle;
use setup::{load_private_key, load_test_config, load_test_form};

#[tokio::test]
#[ignore = "requires a node, a deployed router and a funded key"]
async fn test_live_airdrop() {
    let config = load_test_config();
    let form = load_test_form();
    let private_key = load_private_key().expect("Private key required");

    let owner = client::signer_address(&private_key).expect("Invalid private key");
    let provider = client::create_wallet_provider(&config.rpc_url, &private_key)
        .expect("Failed to create wallet provider");
    let client = ProviderChainClient::new(provider);
    let routers = config.router_table().expect("Invalid router table");

    let check = check(&client, &routers, &form, owner)
        .await
        .expect("Failed to check form");
    println!("{check}");
    assert!(check.is_ready(), "form is not ready: {:?}", check.readiness);

    let submitter = Submitter::new(
        client,
        routers,
        TransactionLifecycle::new(config.lifecycle_config()),
    )
    .with_confirmations(config.confirmations);

    let outcome = submitter
        .submit(&form, &check.token, owner)
        .await
        .expect("Submission failed");

    let SubmitOutcome::Confirmed { transfer, .. } = outcome else {
        panic!("Submission was cancelled");
    };
    println!("✓ Airdrop confirmed in {}", transfer.tx_hash);
}
