use image_converter::{CropRegion, ImageConverterClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = ImageConverterClient::from_env()?;

    let region = CropRegion {
        left: 100,
        top: 50,
        width: 400,
        height: 300,
    };

    match client.crop("assets/input.jpg", "cropped.jpg", region).await {
        Ok(result) => {
            println!("Cropped: assets/input.jpg -> cropped.jpg ({} bytes)", result.bytes_written);
        }
        Err(e) => {
            eprintln!("Crop failed: {}", e);
        }
    }

    Ok(())
}
