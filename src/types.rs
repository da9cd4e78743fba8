use std::path::PathBuf;

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

/// (Internal) The JSON envelope every endpoint answers with.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub(crate) success: bool,
    /// The processed image, base64-encoded.
    #[serde(default)]
    pub(crate) image: Option<String>,
    /// Untyped here; read through [`ResponseData::lenient`].
    #[serde(default)]
    pub(crate) data: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<RemoteErrorBody>,
    /// Gateway-level failures carry a top-level message instead of `error`.
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// The `error` member of a failed response.
///
/// The API has been seen to send both a bare message and an object with a
/// `message` and `code`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RemoteErrorBody {
    Message(String),
    Detailed {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<Value>,
    },
}

impl RemoteErrorBody {
    pub(crate) fn message(&self) -> Option<&str> {
        match self {
            Self::Message(m) => Some(m.as_str()),
            Self::Detailed { message, .. } => message.as_deref(),
        }
    }

    pub(crate) fn code(&self) -> Option<String> {
        match self {
            Self::Message(_) => None,
            Self::Detailed { code, .. } => code.as_ref().map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Size and dimensions of one side of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageInfo {
    /// Encoded size in bytes.
    #[serde(default, deserialize_with = "lenient_number")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry of the supported formats list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormatInfo {
    /// The identifier to pass as `format` to convert, e.g. `webp`.
    pub format: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operation-specific metadata from the `data` member of a response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub original: Option<ImageInfo>,
    /// Present for convert.
    #[serde(default)]
    pub converted: Option<ImageInfo>,
    /// Present for resize.
    #[serde(default)]
    pub resized: Option<ImageInfo>,
    /// Size reduction achieved by convert, as a percentage.
    #[serde(default, deserialize_with = "lenient_number")]
    pub compression: Option<f64>,
    /// Present for list_formats, in the order the API lists them.
    #[serde(default)]
    pub formats: Option<Vec<FormatInfo>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseData {
    /// Reads the typed view of `data`. If the shape is off, the raw members
    /// are kept in `extra` rather than failing the call.
    pub(crate) fn lenient(value: Value) -> Self {
        match Self::deserialize(&value) {
            Ok(data) => data,
            Err(err) => {
                warn!(%err, "unexpected response metadata; keeping it untyped");
                let extra = match value {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Self {
                    extra,
                    ..Default::default()
                }
            }
        }
    }
}

/// Accepts a number or a numeric string; anything else reads as `None`.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.to_string().parse().ok(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    /// Where the decoded image was written; `None` for list_formats.
    pub destination: Option<PathBuf>,
    pub bytes_written: usize,
    pub data: ResponseData,
}
