use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;

use crate::config::OperationDefaults;
use crate::error::ConverterError;

static FORMAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// Fields that must hold a non-negative integer wherever they appear.
const UNSIGNED_FIELDS: &[&str] = &["quality", "width", "height", "left", "top"];

/// The operations exposed by the Image Converter API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Convert,
    Resize,
    Crop,
    Rotate,
    Flip,
    ListFormats,
}

impl OperationKind {
    /// The endpoint path, relative to the API host.
    pub fn path(self) -> &'static str {
        match self {
            Self::Convert => "/api/convert",
            Self::Resize => "/api/resize",
            Self::Crop => "/api/crop",
            Self::Rotate => "/api/transform/rotate",
            Self::Flip => "/api/transform/flip",
            Self::ListFormats => "/api/formats",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::ListFormats => Method::GET,
            _ => Method::POST,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::Resize => "resize",
            Self::Crop => "crop",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
            Self::ListFormats => "list_formats",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Convert => &["format"],
            Self::Crop => &["left", "top", "width", "height"],
            Self::Rotate => &["angle"],
            Self::Flip => &["direction"],
            Self::Resize | Self::ListFormats => &[],
        }
    }

    pub fn optional_fields(self) -> &'static [&'static str] {
        match self {
            Self::Convert => &["quality"],
            Self::Resize => &["width", "height", "fit"],
            _ => &[],
        }
    }

    /// Whether the operation uploads an image and produces one.
    pub fn transforms_image(self) -> bool {
        !matches!(self, Self::ListFormats)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single form field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

macro_rules! integer_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                Self::Integer(i64::from(value))
            }
        })*
    };
}

integer_param!(u8, u16, u32, i32, i64);

/// Direction accepted by the flip endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

impl FlipDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl std::str::FromStr for FlipDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(format!(
                "direction must be \"horizontal\" or \"vertical\", got {other:?}"
            )),
        }
    }
}

/// Target dimensions for a resize. Unset dimensions are left to the API, and a
/// dimension of `0` counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Fit mode such as `cover` or `contain`; the client default applies when unset.
    pub fit: Option<String>,
}

/// The rectangle to keep when cropping, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// A fully described call against one endpoint.
///
/// Built through the per-operation constructors and [`param`](Self::param);
/// [`validate`](Self::validate) checks it before any file is read or any
/// request is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub operation: OperationKind,
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub params: BTreeMap<String, ParamValue>,
}

impl ConversionRequest {
    /// An upload request with no fields set yet.
    pub fn new(
        operation: OperationKind,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Self {
        Self {
            operation,
            source: Some(source.as_ref().to_path_buf()),
            destination: Some(destination.as_ref().to_path_buf()),
            params: BTreeMap::new(),
        }
    }

    pub fn convert(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        format: &str,
        quality: Option<u8>,
    ) -> Self {
        let request = Self::new(OperationKind::Convert, source, destination).param("format", format);
        match quality {
            Some(q) => request.param("quality", q),
            None => request,
        }
    }

    pub fn resize(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        options: ResizeOptions,
    ) -> Self {
        let mut request = Self::new(OperationKind::Resize, source, destination);
        if let Some(width) = options.width.filter(|w| *w > 0) {
            request = request.param("width", width);
        }
        if let Some(height) = options.height.filter(|h| *h > 0) {
            request = request.param("height", height);
        }
        if let Some(fit) = options.fit {
            request = request.param("fit", fit);
        }
        request
    }

    pub fn crop(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        region: CropRegion,
    ) -> Self {
        Self::new(OperationKind::Crop, source, destination)
            .param("left", region.left)
            .param("top", region.top)
            .param("width", region.width)
            .param("height", region.height)
    }

    pub fn rotate(source: impl AsRef<Path>, destination: impl AsRef<Path>, angle: i32) -> Self {
        Self::new(OperationKind::Rotate, source, destination).param("angle", angle)
    }

    pub fn flip(
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        direction: FlipDirection,
    ) -> Self {
        Self::new(OperationKind::Flip, source, destination).param("direction", direction.as_str())
    }

    pub fn list_formats() -> Self {
        Self {
            operation: OperationKind::ListFormats,
            source: None,
            destination: None,
            params: BTreeMap::new(),
        }
    }

    /// Sets a form field, replacing any previous value.
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Checks the request locally: paths, required and unknown fields, and
    /// field value shapes.
    pub fn validate(&self) -> Result<(), ConverterError> {
        let op = self.operation;

        if op.transforms_image() {
            match &self.source {
                Some(p) if !p.as_os_str().is_empty() => {}
                _ => return Err(ConverterError::invalid(op, "source path is required")),
            }
            match &self.destination {
                Some(p) if !p.as_os_str().is_empty() => {}
                _ => return Err(ConverterError::invalid(op, "destination path is required")),
            }
        } else if !self.params.is_empty() {
            return Err(ConverterError::invalid(op, "this operation takes no fields"));
        }

        let missing: Vec<&str> = op
            .required_fields()
            .iter()
            .copied()
            .filter(|field| !self.params.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(ConverterError::invalid(
                op,
                format!("missing required field(s): {}", missing.join(", ")),
            ));
        }

        for (name, value) in &self.params {
            if !op.required_fields().contains(&name.as_str())
                && !op.optional_fields().contains(&name.as_str())
            {
                return Err(ConverterError::invalid(op, format!("unknown field {name:?}")));
            }
            check_value(name, value).map_err(|reason| ConverterError::invalid(op, reason))?;
        }

        Ok(())
    }

    /// The form fields to send, with configured defaults filled in for
    /// optional fields the caller left unset.
    pub(crate) fn form_fields(&self, defaults: &OperationDefaults) -> Vec<(String, String)> {
        let mut fields: BTreeMap<String, String> = self
            .params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();

        match self.operation {
            OperationKind::Convert => {
                fields
                    .entry("quality".to_string())
                    .or_insert_with(|| defaults.quality.to_string());
            }
            OperationKind::Resize => {
                fields
                    .entry("fit".to_string())
                    .or_insert_with(|| defaults.fit.clone());
            }
            _ => {}
        }

        fields.into_iter().collect()
    }
}

fn check_value(name: &str, value: &ParamValue) -> Result<(), String> {
    if UNSIGNED_FIELDS.contains(&name) {
        let ok = match value {
            ParamValue::Integer(n) => *n >= 0,
            ParamValue::Text(s) => s.parse::<u64>().is_ok(),
        };
        if !ok {
            return Err(format!("{name} must be a non-negative integer, got {value}"));
        }
        return Ok(());
    }

    match (name, value) {
        ("angle", ParamValue::Text(s)) if s.parse::<i64>().is_err() => {
            Err(format!("angle must be an integer, got {s:?}"))
        }
        ("direction", v) => v.to_string().parse::<FlipDirection>().map(|_| ()),
        ("format", v) if !FORMAT_RE.is_match(&v.to_string()) => {
            Err(format!("format must be an alphanumeric identifier, got \"{v}\""))
        }
        ("fit", v) if v.to_string().trim().is_empty() => Err("fit must not be empty".to_string()),
        _ => Ok(()),
    }
}
