//! Upload, presign, and download round trips.

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{http_client, presign, test_filename, upload};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_download_uploaded_bytes_via_presigned_url() {
        let client = http_client();
        let filename = test_filename("roundtrip");
        let content = Bytes::from_static(b"Hello, S3! This is a test file.");

        let object_key = upload(&client, &filename, content.clone()).await;
        assert!(
            object_key.ends_with(&format!("_{filename}")),
            "object key {object_key} should end with _{filename}"
        );

        let url = presign(&client, &object_key, 3600).await;
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=3600"));

        let resp = client.get(&url).send().await.expect("download");
        assert!(resp.status().is_success(), "download failed: {}", resp.status());
        let downloaded = resp.bytes().await.expect("download body");
        assert_eq!(downloaded, content);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_binary_payload() {
        let client = http_client();
        let content: Bytes = (0..=255u8).cycle().take(64 * 1024).collect::<Vec<_>>().into();

        let object_key = upload(&client, &test_filename("binary"), content.clone()).await;
        let url = presign(&client, &object_key, 600).await;

        let downloaded = client
            .get(&url)
            .send()
            .await
            .expect("download")
            .bytes()
            .await
            .expect("download body");
        assert_eq!(downloaded.len(), content.len());
        assert_eq!(downloaded, content);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_use_default_filename_when_omitted() {
        let client = http_client();
        let resp = client
            .post(format!("{}/upload-to-s3", crate::server_url()))
            .body("no name")
            .send()
            .await
            .expect("upload request");
        assert!(resp.status().is_success());

        let json: serde_json::Value = resp.json().await.expect("upload json");
        let key = json["objectKey"].as_str().expect("objectKey");
        assert!(key.ends_with("_default_filename"));
    }
}
