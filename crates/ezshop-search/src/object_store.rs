// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! S3 image store with SigV4-signed `PutObject`.
//!
//! Objects are written as `{folder}/{uuid}.{ext}` with a `public-read` ACL and
//! addressed by their public URL.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use ezshop_config::model::ObjectStoreConfig;
use ezshop_core::{AdapterType, EzshopError, HealthStatus, ObjectStore, PluginAdapter};

use ezshop_core::content_type;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";

#[derive(Clone)]
struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

/// [`ObjectStore`] for AWS S3 or an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: reqwest::Client,
    bucket: String,
    region: String,
    folder: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("folder", &self.folder)
            .field("endpoint", &self.endpoint)
            .field("has_credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    /// Builds the store. Missing credentials are not an error here: uploads
    /// fail and the health check reports degraded.
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, EzshopError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EzshopError::Config(format!("failed to build HTTP client: {e}")))?;
        let credentials = resolve_credentials(config);
        if credentials.is_none() {
            warn!("object store credentials not configured, image uploads will fail");
        }
        info!(bucket = %config.bucket, region = %config.region, "object store initialized");
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            folder: config.folder.trim_end_matches('/').to_string(),
            endpoint: config.endpoint.as_ref().map(|e| e.trim_end_matches('/').to_string()),
            public_base_url: config
                .public_base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            credentials,
            timeout: config.timeout(),
        })
    }

    /// Object key for a new upload with extension `ext`.
    pub fn object_key(&self, ext: &str) -> String {
        let file = format!("{}.{ext}", uuid::Uuid::new_v4().simple());
        if self.folder.is_empty() {
            file
        } else {
            format!("{}/{file}", self.folder)
        }
    }

    /// Where the signed PUT is sent: path-style on a custom endpoint,
    /// virtual-hosted on AWS.
    fn upload_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{endpoint}/{}/{}", self.bucket, uri_encode_path(key)),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket,
                self.region,
                uri_encode_path(key)
            ),
        }
    }

    /// URL handed back to callers.
    pub fn public_url(&self, key: &str) -> String {
        match (&self.public_base_url, &self.endpoint) {
            (Some(base), _) => format!("{base}/{key}"),
            (None, Some(endpoint)) => format!("{endpoint}/{}/{key}", self.bucket),
            (None, None) => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }
}

fn resolve_credentials(config: &ObjectStoreConfig) -> Option<Credentials> {
    let from_env = |names: &[&str]| names.iter().find_map(|n| std::env::var(n).ok());
    let access_key_id = config
        .access_key_id
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| from_env(&["AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY"]))?;
    let secret_access_key = config
        .secret_access_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| from_env(&["AWS_SECRET_ACCESS_KEY", "AWS_SECRET_KEY"]))?;
    Some(Credentials {
        access_key_id,
        secret_access_key,
    })
}

#[async_trait]
impl PluginAdapter for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        if self.credentials.is_none() {
            return Ok(HealthStatus::Degraded("no credentials configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, EzshopError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            EzshopError::Config("object store credentials not configured".into())
        })?;
        let kind = content_type::from_mime(content_type);
        let key = self.object_key(kind.extension);
        let url = self.upload_url(&key);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| EzshopError::Config(format!("invalid object store URL {url}: {e}")))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{port}", parsed.host_str().unwrap_or_default()),
            None => parsed.host_str().unwrap_or_default().to_string(),
        };

        let payload_hash = hex::encode(Sha256::digest(&bytes));
        let signed = sign_put(&SignInput {
            now: Utc::now(),
            region: &self.region,
            host: &host,
            path: parsed.path(),
            content_type: kind.mime,
            payload_hash: &payload_hash,
            access_key_id: &credentials.access_key_id,
            secret_access_key: &credentials.secret_access_key,
        });

        let response = self
            .client
            .put(parsed)
            .header("content-type", kind.mime)
            .header("x-amz-acl", "public-read")
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", signed.authorization)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EzshopError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    EzshopError::store(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EzshopError::store(format!(
                "object store rejected upload ({status}): {body}"
            )));
        }
        debug!(key = %key, content_type = kind.mime, "image uploaded");
        Ok(self.public_url(&key))
    }
}

// --- SigV4 ---

struct SignInput<'a> {
    now: DateTime<Utc>,
    region: &'a str,
    host: &'a str,
    path: &'a str,
    content_type: &'a str,
    payload_hash: &'a str,
    access_key_id: &'a str,
    secret_access_key: &'a str,
}

struct Signed {
    amz_date: String,
    authorization: String,
}

const SIGNED_HEADERS: &str = "content-type;host;x-amz-acl;x-amz-content-sha256;x-amz-date";

fn sign_put(input: &SignInput<'_>) -> Signed {
    let amz_date = input.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = input.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/{SERVICE}/aws4_request", input.region);

    let canonical_request = format!(
        "PUT\n{path}\n\n\
         content-type:{ct}\nhost:{host}\nx-amz-acl:public-read\n\
         x-amz-content-sha256:{hash}\nx-amz-date:{amz_date}\n\n\
         {SIGNED_HEADERS}\n{hash}",
        path = input.path,
        ct = input.content_type,
        host = input.host,
        hash = input.payload_hash,
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );
    let key = signing_key(input.secret_access_key, &date, input.region, SERVICE);
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    Signed {
        authorization: format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            input.access_key_id
        ),
        amz_date,
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

/// Percent-encodes everything except unreserved characters and `/`.
fn uri_encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
