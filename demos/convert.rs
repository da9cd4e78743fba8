//! This example converts a local image to WebP.
//!
//! To run this example, you must have the `RAPIDAPI_KEY` environment variable set
//! (a `.env` file works too), and an image file must exist at `assets/input.jpg`.
//!
//! Usage:
//! `cargo run --example convert`

use image_converter::ImageConverterClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Reads RAPIDAPI_KEY (and optionally RAPIDAPI_HOST) after loading .env.
    let client = ImageConverterClient::from_env()?;

    let input = "assets/input.jpg";
    let output = "output.webp";
    println!("Converting '{}' to WebP...", input);

    match client.convert(input, output, "webp", Some(80)).await {
        Ok(result) => {
            println!("Converted: {} -> {}", input, output);
            let data = result.data;
            if let Some(size) = data.original.and_then(|o| o.size) {
                println!("   Original: {} bytes", size);
            }
            if let Some(size) = data.converted.and_then(|c| c.size) {
                println!("   Converted: {} bytes", size);
            }
            if let Some(compression) = data.compression {
                println!("   Compression: {}%", compression);
            }
        }
        Err(e) => {
            eprintln!("Conversion failed: {}", e);
        }
    }

    Ok(())
}
