mod common;

use common::*;
use image_converter::{ConversionRequest, ConverterError, CropRegion, OperationKind};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crop_sends_region() {
    let server = MockServer::start().await;
    mount_post(
        &server,
        "/api/crop",
        ResponseTemplate::new(200).set_body_json(success_body(PROCESSED_IMAGE, json!({}))),
    )
    .await;

    let client = client_for(&server);
    let (dir, input) = workspace();
    let output_path = dir.path().join("cropped.jpg");

    client
        .crop(
            &input,
            &output_path,
            CropRegion {
                left: 100,
                top: 50,
                width: 400,
                height: 300,
            },
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output_path).unwrap(), PROCESSED_IMAGE);
    let parts = form_parts(&single_request(&server).await);
    assert_eq!(parts["left"].text(), "100");
    assert_eq!(parts["top"].text(), "50");
    assert_eq!(parts["width"].text(), "400");
    assert_eq!(parts["height"].text(), "300");
    assert_eq!(parts["image"].data, FIXTURE_JPEG);
}

#[tokio::test]
async fn test_crop_with_missing_field_never_reaches_the_network() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let (dir, input) = workspace();
    let output_path = dir.path().join("cropped.jpg");

    for missing in ["left", "top", "width", "height"] {
        let mut request = ConversionRequest::crop(
            &input,
            &output_path,
            CropRegion {
                left: 1,
                top: 2,
                width: 3,
                height: 4,
            },
        );
        request.params.remove(missing);

        match client.execute(&request).await {
            Err(ConverterError::InvalidRequest { operation, reason }) => {
                assert_eq!(operation, OperationKind::Crop);
                assert!(reason.contains(missing), "{reason}");
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!output_path.exists());
}
