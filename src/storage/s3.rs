//! S3-compatible object storage (Backblaze B2, MinIO, AWS) using path-style
//! URLs and AWS Signature Version 4.

use super::{validate_key, FileStorage, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct S3FileStorage {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl std::fmt::Debug for S3FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FileStorage")
            .field("endpoint", &self.endpoint.as_str())
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Headers a signed request must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub content_sha256: String,
    pub authorization: String,
}

impl S3FileStorage {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Self, StorageError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::Backend(format!("invalid s3 endpoint: {}", e)))?;
        if endpoint.host_str().is_none() {
            return Err(StorageError::Backend("s3 endpoint has no host".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
            region: region.to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StorageError::Backend(format!("storage.{} is not set", name)))
        };

        Self::new(
            &required(&config.s3_endpoint, "s3_endpoint")?,
            &required(&config.s3_bucket, "s3_bucket")?,
            &config.s3_region,
            &required(&config.s3_access_key_id, "s3_access_key_id")?,
            &required(&config.s3_secret_access_key, "s3_secret_access_key")?,
        )
    }

    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn object_path(&self, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/{}", uri_encode(&self.bucket), encoded_key)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.object_path(key)
        )
    }

    /// Signs a request for `canonical_uri` with an empty query string.
    pub fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let content_sha256 = hex::encode(Sha256::digest(payload));

        let canonical_request = format!(
            "{method}\n{uri}\n\nhost:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{date}\n\n{signed}\n{hash}",
            method = method,
            uri = canonical_uri,
            host = self.host_header(),
            hash = content_sha256,
            date = amz_date,
            signed = SIGNED_HEADERS,
        );

        let scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, SERVICE);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(&self.secret_access_key, &date_stamp, &self.region, SERVICE);
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        SignedHeaders {
            authorization: format!(
                "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
                self.access_key_id, scope, SIGNED_HEADERS, signature
            ),
            amz_date,
            content_sha256,
        }
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        body: Bytes,
    ) -> Result<reqwest::Response, StorageError> {
        validate_key(key)?;
        let path = self.object_path(key);
        let signed = self.sign(method.as_str(), &path, &body, Utc::now());

        debug!(method = %method, key = %key, "s3 request");
        self.client
            .request(method, self.object_url(key))
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header("authorization", signed.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let response = self.send(Method::PUT, key, bytes).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Backend(format!(
                "PUT {} returned {}",
                key,
                response.status()
            )))
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let response = self.send(Method::DELETE, key, Bytes::new()).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                warn!(key = %key, "object already absent from bucket");
                Ok(false)
            }
            status if status.is_success() => Ok(true),
            status => Err(StorageError::Backend(format!(
                "DELETE {} returned {}",
                key, status
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let response = self.send(Method::HEAD, key, Bytes::new()).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StorageError::Backend(format!(
                "HEAD {} returned {}",
                key, status
            ))),
        }
    }

    fn url(&self, key: &str) -> String {
        self.object_url(key)
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// SigV4 signing key for one day, region and service
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// RFC 3986 encoding of one path segment, as SigV4 expects.
fn uri_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage(endpoint: &str) -> S3FileStorage {
        S3FileStorage::new(endpoint, "docs", "eu-central-003", "AKID", "SECRET").unwrap()
    }

    #[test]
    fn signing_key_matches_published_vector() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn put_request_signature_is_stable() {
        let storage = storage("https://s3.example.com");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let signed = storage.sign(
            "PUT",
            "/docs/property_documents/2024/05/01/lease.pdf",
            b"hello",
            now,
        );

        assert_eq!(signed.amz_date, "20240501T120000Z");
        assert_eq!(
            signed.content_sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            signed.authorization,
            "AWS4-HMAC-SHA256 Credential=AKID/20240501/eu-central-003/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, \
             Signature=6b7d183576d49591460aecc9514bf97770440fa75c700dbfc50b8c73d7b42e4f"
        );
    }

    #[test]
    fn object_paths_are_percent_encoded() {
        let storage = storage("https://s3.example.com/");
        assert_eq!(
            storage.object_path("task_images/boiler photo.jpg"),
            "/docs/task_images/boiler%20photo.jpg"
        );
        assert_eq!(
            storage.url("task_images/a.jpg"),
            "https://s3.example.com/docs/task_images/a.jpg"
        );
    }

    #[tokio::test]
    async fn put_sends_signed_request_to_bucket_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/docs/task_images/boiler.jpg"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        storage(&server.uri())
            .put("task_images/boiler.jpg", Bytes::from("jpeg"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_object_delete_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let removed = storage(&server.uri())
            .delete("task_images/gone.jpg")
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn server_errors_surface_as_backend_errors() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = storage(&server.uri())
            .exists("task_images/a.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
