//! Example: solving a login captcha through the local relay page.
//!
//! Run with: cargo run --example geetest_relay

use bili_passport::{ApiClient, GeetestKind, GeetestServer};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let client = ApiClient::new()?;
    let relay = GeetestServer::start(&client, GeetestKind::Login).await?;
    println!("Open {} and solve the captcha", relay.url());

    while !relay.is_done() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    if let Some(result) = relay.result() {
        println!("validate: {}", result.validate);
        println!("seccode:  {}", result.seccode);
        println!("token:    {}", result.token);
    }

    relay.stop().await?;
    Ok(())
}
