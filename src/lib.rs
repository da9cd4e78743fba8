//! An unofficial Rust SDK for the Image Converter API.
//!
//! This SDK provides a convenient, asynchronous interface to a hosted image
//! conversion service: format conversion, resizing, cropping, rotation,
//! flipping and listing the supported formats. All image processing happens
//! server-side; the client uploads the source file as a multipart form,
//! decodes the base64 image the API returns, and writes it to disk.
//!
//! ## Features
//! - One typed method per endpoint, plus a generic [`ConversionRequest`].
//! - Local validation of required fields before anything is sent.
//! - Atomic output writes: a failed call never leaves a partial file behind.
//! - Bounded timeouts and caller-driven cancellation.
//! - Typed error handling for robust applications.
//!
//! ```no_run
//! use image_converter::ImageConverterClient;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let client = ImageConverterClient::new(Some("your_api_key".to_string()))?;
//! let output = client.convert("input.jpg", "output.webp", "webp", Some(80)).await?;
//! println!("{:?}", output.data.converted);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod output;
mod request;
mod types;

pub use client::ImageConverterClient;
pub use config::{
    ClientConfig, OperationDefaults, DEFAULT_API_HOST, DEFAULT_CONNECT_TIMEOUT, DEFAULT_FIT,
    DEFAULT_QUALITY, DEFAULT_TIMEOUT,
};
pub use error::ConverterError;
pub use request::{
    ConversionRequest, CropRegion, FlipDirection, OperationKind, ParamValue, ResizeOptions,
};
pub use tokio_util::sync::CancellationToken;
pub use types::{ConversionOutput, FormatInfo, ImageInfo, ResponseData};
