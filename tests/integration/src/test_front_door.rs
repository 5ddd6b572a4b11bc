//! Parameter validation and routing of the front door.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::{endpoint, http_client, server_url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let client = http_client();
        let resp = client
            .get(format!("{}/health", server_url()))
            .send()
            .await
            .expect("health request");
        assert_eq!(resp.status(), StatusCode::OK);

        let json: serde_json::Value = resp.json().await.expect("health json");
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_presign_without_parameters() {
        let client = http_client();

        let cases: [(&[(&str, &str)], &str); 3] = [
            (&[("expires", "3600")], "Missing objectKey parameter"),
            (&[("objectKey", "test.txt")], "Missing expires parameter"),
            (
                &[("objectKey", "test.txt"), ("expires", "soon")],
                "Invalid expires parameter",
            ),
        ];

        for (query, message) in cases {
            let resp = client
                .get(endpoint("/get-presigned-s3-url", query))
                .send()
                .await
                .expect("presign");
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(resp.text().await.expect("body"), message);
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_wrong_methods() {
        let client = http_client();

        let resp = client
            .post(endpoint(
                "/get-presigned-s3-url",
                &[("objectKey", "test.txt"), ("expires", "3600")],
            ))
            .send()
            .await
            .expect("presign");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let resp = client
            .get(format!("{}/upload-to-s3", server_url()))
            .send()
            .await
            .expect("upload");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_tag_responses_with_request_id() {
        let client = http_client();
        let resp = client
            .get(format!("{}/health", server_url()))
            .send()
            .await
            .expect("health request");
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(resp.headers()["server"], "s3link");
    }
}
