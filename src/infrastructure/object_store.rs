use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Durable public blob storage.
///
/// Implementations write the object with public-read access at write time
/// and return its canonical URL; the URL must be fetchable by any client
/// without further authorization. Writes are single-attempt; retry policy,
/// if any, belongs to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `content` under a freshly generated key and return the
    /// canonical public URL of the object.
    ///
    /// `name_hint` is the original filename, if any; it only influences the
    /// generated key, never addressing.
    async fn store_bytes(
        &self,
        content: Vec<u8>,
        content_type: &str,
        size_hint: Option<u64>,
        name_hint: Option<&str>,
    ) -> Result<String, StoreError>;
}

/// Generate a globally unique object key: `{uuid}_{sanitized-name}` when a
/// name hint is available, otherwise `{uuid}.{ext}` with the extension
/// derived from the content type.
pub fn object_key(name_hint: Option<&str>, content_type: &str) -> String {
    let id = Uuid::new_v4();
    match name_hint.map(sanitize_name).filter(|n| !n.is_empty()) {
        Some(name) => format!("{id}_{name}"),
        None => format!("{id}.{}", extension_for(content_type)),
    }
}

fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Object store configuration, loaded once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub bucket: String,
    pub region: String,
    /// Overrides the standard S3 URL when objects are served from a CDN.
    pub public_base_url: Option<String>,
}

impl StoreConfig {
    /// Canonical public URL for (bucket, key).
    pub fn object_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }
}

/// S3-backed object store.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    config: StoreConfig,
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS environment (credentials, region
    /// chain) and the given store configuration.
    pub async fn from_env(config: StoreConfig) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            config,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn store_bytes(
        &self,
        content: Vec<u8>,
        content_type: &str,
        size_hint: Option<u64>,
        name_hint: Option<&str>,
    ) -> Result<String, StoreError> {
        let key = object_key(name_hint, content_type);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(content));

        if let Some(size) = size_hint.and_then(|s| i64::try_from(s).ok()) {
            request = request.content_length(size);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;

        Ok(self.config.object_url(&key))
    }
}

/// In-process object store used by the test suite and local development.
///
/// Records every write so tests can assert on write counts, keys, and the
/// content type each object was stored with.
#[derive(Default)]
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    write_count: AtomicUsize,
    unavailable: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub content_type: String,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail with `BackendUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        #[allow(clippy::unwrap_used)] // lock poisoning is unrecoverable here
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        #[allow(clippy::unwrap_used)]
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn store_bytes(
        &self,
        content: Vec<u8>,
        content_type: &str,
        _size_hint: Option<u64>,
        name_hint: Option<&str>,
    ) -> Result<String, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable(
                "simulated outage".to_string(),
            ));
        }

        let key = object_key(name_hint, content_type);
        self.write_count.fetch_add(1, Ordering::SeqCst);

        #[allow(clippy::unwrap_used)]
        self.objects.lock().unwrap().insert(
            key.clone(),
            StoredObject {
                content,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("{}/{key}", self.base_url.trim_end_matches('/')))
    }
}
