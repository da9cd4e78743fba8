#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image_converter::ImageConverterClient;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TEST_API_KEY: &str = "test_api_key";

/// Bytes that are not valid UTF-8, standing in for a real JPEG.
pub const FIXTURE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x0D, 0x0A, 0x2D,
    0x2D, 0x80, 0xFE, 0x00, 0xFF, 0xD9,
];

/// What the mocked API sends back as the processed image.
pub const PROCESSED_IMAGE: &[u8] = &[0x52, 0x49, 0x46, 0x46, 0x00, 0xFF, 0x10, 0x0D, 0x0A, 0x57];

pub fn client_for(server: &MockServer) -> ImageConverterClient {
    ImageConverterClient::new_with_url(TEST_API_KEY.to_string(), &server.uri()).unwrap()
}

/// A temp dir holding `input.jpg` with [`FIXTURE_JPEG`] in it.
pub fn workspace() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.jpg");
    std::fs::write(&input, FIXTURE_JPEG).unwrap();
    (dir, input)
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn success_body(image: &[u8], data: Value) -> Value {
    json!({
        "success": true,
        "image": encode(image),
        "data": data
    })
}

/// Mounts a POST mock at `endpoint` that requires the auth headers.
pub async fn mount_post(server: &MockServer, endpoint: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(header("x-rapidapi-key", TEST_API_KEY))
        .and(header("x-rapidapi-host", image_converter::DEFAULT_API_HOST))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

pub async fn single_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

/// One part of a multipart/form-data body.
#[derive(Debug)]
pub struct FormPart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap()
    }
}

/// Splits a captured multipart request body into its parts, keyed by field name.
pub fn form_parts(request: &Request) -> HashMap<String, FormPart> {
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .expect("request has a content type");
    assert!(
        content_type.starts_with("multipart/form-data"),
        "not a multipart request: {content_type}"
    );
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("multipart boundary")
        .trim_matches('"');
    let delimiter = format!("--{boundary}");

    let mut parts = HashMap::new();
    for section in split_on(&request.body, delimiter.as_bytes()).into_iter().skip(1) {
        if section.starts_with(b"--") {
            break;
        }
        let section = section.strip_prefix(b"\r\n").unwrap_or(section);
        let header_end = find(section, b"\r\n\r\n").expect("part headers");
        let headers = std::str::from_utf8(&section[..header_end]).unwrap();
        let mut data = &section[header_end + 4..];
        if data.ends_with(b"\r\n") {
            data = &data[..data.len() - 2];
        }

        let mut name = None;
        let mut file_name = None;
        let mut content_type = None;
        for line in headers.split("\r\n") {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-disposition:") {
                name = quoted_attr(line, "name");
                file_name = quoted_attr(line, "filename");
            } else if lower.starts_with("content-type:") {
                content_type = Some(line["content-type:".len()..].trim().to_string());
            }
        }

        parts.insert(
            name.expect("part name"),
            FormPart {
                file_name,
                content_type,
                data: data.to_vec(),
            },
        );
    }
    parts
}

fn quoted_attr(line: &str, attr: &str) -> Option<String> {
    let needle = format!("; {attr}=\"");
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')?;
    Some(line[start..start + end].to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_on<'a>(mut haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    while let Some(pos) = find(haystack, delimiter) {
        out.push(&haystack[..pos]);
        haystack = &haystack[pos + delimiter.len()..];
    }
    out.push(haystack);
    out
}

pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
