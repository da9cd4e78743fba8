use std::io::{self, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ConverterError;
use crate::request::OperationKind;

/// Decodes a base64 image payload, tolerating a `data:<mime>;base64,` prefix
/// and embedded line breaks.
pub(crate) fn decode_image(operation: OperationKind, payload: &str) -> Result<Vec<u8>, ConverterError> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| ConverterError::Decode { operation, source })
}

/// Writes `bytes` to `destination` so that the path either keeps its old
/// contents or holds all of the new ones.
///
/// The data goes to a hidden temporary file next to the destination, is
/// synced, and is then renamed over it. The temporary file is removed if any
/// step fails.
pub(crate) async fn write_atomically(
    operation: OperationKind,
    destination: &Path,
    bytes: Vec<u8>,
) -> Result<usize, ConverterError> {
    let path = destination.to_path_buf();
    let len = bytes.len();

    tokio::task::spawn_blocking(move || persist(&path, &bytes))
        .await
        .map_err(|join| ConverterError::local_io(operation, destination, io::Error::other(join)))?
        .map_err(|source| ConverterError::local_io(operation, destination, source))?;

    Ok(len)
}

fn persist(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".imgconv-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        let op = OperationKind::Convert;
        assert_eq!(decode_image(op, "aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_image(op, "data:image/webp;base64,aGVs\nbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let err = decode_image(OperationKind::Flip, "not base64!!").unwrap_err();
        assert!(matches!(err, ConverterError::Decode { operation: OperationKind::Flip, .. }));
    }

    #[tokio::test]
    async fn writes_and_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.png");
        std::fs::write(&dest, b"old").unwrap();

        let written = write_atomically(OperationKind::Resize, &dest, vec![0, 159, 146, 150])
            .await
            .unwrap();

        assert_eq!(written, 4);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![0, 159, 146, 150]);
        assert_eq!(entries(dir.path()), vec!["out.png".to_string()]);
    }

    #[tokio::test]
    async fn missing_parent_directory_is_a_local_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope").join("out.png");

        let err = write_atomically(OperationKind::Crop, &dest, b"data".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, ConverterError::LocalIo { ref path, .. } if path == &dest));
        assert!(entries(dir.path()).is_empty());
    }
}
