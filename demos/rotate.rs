use image_converter::ImageConverterClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = ImageConverterClient::from_env()?;

    let angle = 90;
    match client.rotate("assets/input.jpg", "rotated.jpg", angle).await {
        Ok(_) => {
            println!("Rotated: assets/input.jpg -> rotated.jpg ({} degrees)", angle);
        }
        Err(e) => {
            eprintln!("Rotate failed: {}", e);
        }
    }

    Ok(())
}
