//! Example: logging in with a QR code.
//!
//! Run with: cargo run --example qr_login [-- --tv]

use bili_passport::{
    ApiClient, CredentialStore, QrLoginEvent, QrLoginFlow, TvQrLogin, WebQrLogin,
    DEFAULT_POLL_INTERVAL,
};

/// Give up after this many polls (the code expires after ~3 minutes anyway).
const MAX_POLLS: u32 = 180;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output (optional)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let store = CredentialStore::new();
    let client = ApiClient::builder()
        // Optionally add proxy:
        // .proxy("http://127.0.0.1:8080")
        .build()?;

    if let Some(credential) = store.load()? {
        if credential.check_valid(&client).await? {
            println!("Stored credential at {:?} is still valid", store.path());
            return Ok(());
        }
        println!("Stored credential expired, logging in again");
    }

    let flow: Box<dyn QrLoginFlow> = if std::env::args().any(|arg| arg == "--tv") {
        Box::new(TvQrLogin::new(client.clone()))
    } else {
        Box::new(WebQrLogin::new(client.clone()))
    };

    let session = flow.generate().await?;
    println!("Encode this URL as a QR code and scan it with the app:");
    println!("  {}", session.url);

    for _ in 0..MAX_POLLS {
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;

        match flow.poll(&session.key).await? {
            QrLoginEvent::Complete(credential) => {
                credential.raise_for_no_sessdata()?;
                store.save(&credential)?;
                println!("Logged in, credential saved to {:?}", store.path());
                println!("  valid: {}", credential.check_valid(&client).await?);
                return Ok(());
            }
            QrLoginEvent::Expired(message) => {
                println!("QR code expired: {}", message);
                return Ok(());
            }
            event => {
                println!("[{}] {}", event.phase(), event.message().unwrap_or_default());
            }
        }
    }

    println!("Gave up after {} polls", MAX_POLLS);
    Ok(())
}
