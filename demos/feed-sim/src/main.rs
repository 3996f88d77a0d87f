//! feedsync feed simulation
//!
//! Drives like/hide interactions against the in-memory authority with
//! simulated network latency and injected faults, and prints the view state
//! as it moves through speculation, reconciliation and rollback.
//!
//! Environment variables:
//! - FEEDSYNC_LOG: tracing filter (default `info,feedsync=debug`)
//! - FEEDSYNC_STALE_POLICY: `fence` or `last-response-wins`
//! - FEEDSYNC_REQUEST_TIMEOUT_MS: per-request timeout, `0` disables
//! - FEEDSYNC_SIM_LATENCY_MS: simulated round trip (default 80)

use std::time::Duration;

use feedsync::core::constants::ENV_LOG;
use feedsync::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ENV_SIM_LATENCY_MS: &str = "FEEDSYNC_SIM_LATENCY_MS";
const DEFAULT_SIM_LATENCY_MS: u64 = 80;

#[tokio::main]
async fn main() -> Result<(), FeedError> {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new("info,feedsync=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let latency = match std::env::var(ENV_SIM_LATENCY_MS) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| FeedError::Config(format!("{ENV_SIM_LATENCY_MS}: {e}")))?,
        Err(_) => DEFAULT_SIM_LATENCY_MS,
    };

    let authority = InMemoryAuthority::builder()
        .post("p7", "u1")
        .post("p8", "u1")
        .post("p9", "u3")
        .like("p7", "u5")
        .like("p8", "u3")
        .latency(Duration::from_millis(latency))
        .build();

    let config = ClientConfig::from_env()?;
    info!(?config, latency_ms = latency, "starting feed simulation");
    let client = FeedClient::builder(authority).config(config).build();

    like_scenario(&client).await?;
    unlike_failure_scenario(&client).await?;
    hide_scenarios(&client).await?;
    double_tap_scenario(&client).await?;

    client.sign_out();
    info!("simulation finished");
    Ok(())
}

/// Viewer u2 likes p7; the like is visible before the authority answers.
async fn like_scenario(client: &FeedClient<InMemoryAuthority>) -> Result<(), FeedError> {
    let p7 = PostId::from("p7");
    client.sign_in(UserId::from("u2")).await?;

    let mut changes = client.store().subscribe();
    let reconciler = client.reconciler();
    let task = tokio::spawn({
        let p7 = p7.clone();
        async move { reconciler.toggle_like(&p7).await }
    });

    if changes.changed().await.is_ok() {
        println!(
            "[like] speculative: p7 liked = {}",
            changes.borrow_and_update().is_liked(&p7)
        );
    }

    match task.await {
        Ok(result) => {
            let settled = result?;
            println!(
                "[like] settled: liked = {}, like_count = {}",
                settled.outcome().liked,
                settled.outcome().like_count
            );
        }
        Err(e) => warn!(error = %e, "like task panicked"),
    }
    println!("[like] store: p7 liked = {}", client.store().is_liked(&p7));
    Ok(())
}

/// Viewer u3 unlikes p8 while the network drops the request.
async fn unlike_failure_scenario(
    client: &FeedClient<InMemoryAuthority>,
) -> Result<(), FeedError> {
    let p8 = PostId::from("p8");
    client.sign_in(UserId::from("u3")).await?;
    println!("[unlike] hydrated: p8 liked = {}", client.store().is_liked(&p8));

    client
        .gateway()
        .fail_next(InteractionError::Network("connection reset by peer".into()))
        .await;

    match client.toggle_like(&p8).await {
        Ok(_) => println!("[unlike] unexpectedly succeeded"),
        Err(err) => println!("[unlike] alert: {} ({err})", err.user_message()),
    }
    println!(
        "[unlike] store after rollback: p8 liked = {}",
        client.store().is_liked(&p8)
    );
    Ok(())
}

/// u3 tries to hide their own post, then hides somebody else's.
async fn hide_scenarios(client: &FeedClient<InMemoryAuthority>) -> Result<(), FeedError> {
    let p9 = PostId::from("p9");
    let p7 = PostId::from("p7");

    match client.hide_post(&p9, &UserId::from("u3")).await {
        Ok(_) => println!("[hide] unexpectedly hid own post"),
        Err(err) => println!("[hide] alert: {} ({err})", err.user_message()),
    }
    println!("[hide] p9 hidden = {}", client.store().is_hidden(&p9));

    let settled = client.hide_post(&p7, &UserId::from("u1")).await?;
    println!(
        "[hide] p7 hidden = {} (authority: {})",
        client.store().is_hidden(&p7),
        settled.outcome().hidden
    );
    Ok(())
}

/// Two taps on p9 before the first answer arrives.
async fn double_tap_scenario(client: &FeedClient<InMemoryAuthority>) -> Result<(), FeedError> {
    let p9 = PostId::from("p9");
    client.sign_in(UserId::from("u2")).await?;

    let first = tokio::spawn({
        let reconciler = client.reconciler();
        let p9 = p9.clone();
        async move { reconciler.toggle_like(&p9).await }
    });
    tokio::task::yield_now().await;
    let second = tokio::spawn({
        let reconciler = client.reconciler();
        let p9 = p9.clone();
        async move { reconciler.toggle_like(&p9).await }
    });

    for (name, task) in [("first", first), ("second", second)] {
        match task.await {
            Ok(Ok(settled)) => {
                let reconciled = settled.is_reconciled();
                let outcome = settled.into_outcome();
                println!(
                    "[double-tap] {name}: reconciled = {reconciled}, liked = {}, like_count = {}",
                    outcome.liked, outcome.like_count
                );
            }
            Ok(Err(err)) => println!("[double-tap] {name}: {err}"),
            Err(e) => warn!(error = %e, "double-tap task panicked"),
        }
    }
    println!(
        "[double-tap] store: p9 liked = {}, like_count = {:?}",
        client.store().is_liked(&p9),
        client.store().like_count(&p9)
    );
    Ok(())
}
