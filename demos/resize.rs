//! Resizes `assets/input.jpg` to 800x600 using the `cover` fit mode.
//!
//! Usage:
//! `cargo run --example resize`

use image_converter::{ImageConverterClient, ResizeOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = ImageConverterClient::from_env()?;

    let options = ResizeOptions {
        width: Some(800),
        height: Some(600),
        fit: Some("cover".to_string()),
    };

    match client.resize("assets/input.jpg", "resized.jpg", options).await {
        Ok(result) => {
            println!("Resized: assets/input.jpg -> resized.jpg");
            if let (Some(original), Some(resized)) = (result.data.original, result.data.resized) {
                println!(
                    "   {}x{} -> {}x{}",
                    original.width.unwrap_or_default(),
                    original.height.unwrap_or_default(),
                    resized.width.unwrap_or_default(),
                    resized.height.unwrap_or_default()
                );
            }
        }
        Err(e) => {
            eprintln!("Resize failed: {}", e);
        }
    }

    Ok(())
}
