use image_converter::{FlipDirection, ImageConverterClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = ImageConverterClient::from_env()?;

    let direction = FlipDirection::Horizontal;
    match client.flip("assets/input.jpg", "flipped.jpg", direction).await {
        Ok(_) => {
            println!("Flipped: assets/input.jpg -> flipped.jpg ({})", direction.as_str());
        }
        Err(e) => {
            eprintln!("Flip failed: {}", e);
        }
    }

    Ok(())
}
