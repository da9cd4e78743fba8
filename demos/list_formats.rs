use image_converter::ImageConverterClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    // Falls back to the RAPIDAPI_KEY environment variable.
    let client = ImageConverterClient::new(None)?;

    println!("Querying supported formats...");

    match client.list_formats().await {
        Ok(formats) => {
            println!("Supported formats: {}", formats.join(", "));
        }
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}
