use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

use super::{RecordStore, StoreError, WriteMode};

/// HTTP status S3 answers when a conditional create hits an existing key.
const PRECONDITION_FAILED: u16 = 412;

/// Stores records as objects in an S3 bucket.
///
/// Credentials and region come from the ambient AWS configuration (env vars,
/// instance profile, etc.).
#[derive(Clone)]
pub struct S3RecordStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3RecordStore {
    pub fn new(config: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.into(),
        }
    }

    /// Loads the AWS configuration from the environment and builds a store for `bucket`.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(&config, bucket)
    }
}

/// One page of a key listing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyPage {
    keys: Vec<String>,
    /// Token for the following page; `None` on the last one.
    next_token: Option<String>,
}

impl KeyPage {
    fn from_listing(resp: &ListObjectsV2Output) -> Self {
        let keys = resp
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();
        let next_token = match resp.next_continuation_token() {
            Some(token) if resp.is_truncated() == Some(true) => Some(token.to_string()),
            _ => None,
        };
        Self { keys, next_token }
    }
}

/// Calls `fetch_page` with each continuation token in turn, starting from
/// `None`, and concatenates the keys. Returns the keys and the page count.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<(Vec<String>, usize), StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<KeyPage, StoreError>>,
{
    let mut keys = Vec::new();
    let mut continuation_token = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(continuation_token.take()).await?;
        pages += 1;
        keys.extend(page.keys);

        match page.next_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    Ok((keys, pages))
}

#[async_trait::async_trait]
impl RecordStore for S3RecordStore {
    /// Follows continuation tokens until the listing is exhausted.
    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let (keys, pages) = collect_pages(|continuation_token| async move {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| {
                    StoreError::unavailable(format!(
                        "S3 ListObjectsV2 failed for '{prefix}': {}",
                        DisplayErrorContext(&e)
                    ))
                })?;
            Ok::<_, StoreError>(KeyPage::from_listing(&resp))
        })
        .await?;

        debug!(pages, keys = keys.len(), "S3 listing complete");
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_no_such_key() => StoreError::NotFound {
                    key: key.to_string(),
                },
                _ => StoreError::unavailable(format!(
                    "S3 GetObject failed for '{key}': {}",
                    DisplayErrorContext(&e)
                )),
            })?;

        let body = resp.body.collect().await.map_err(|e| {
            StoreError::unavailable(format!("Failed to read S3 object body '{key}': {e}"))
        })?;

        Ok(body.into_bytes())
    }

    #[tracing::instrument(skip(self, body), fields(bucket = %self.bucket, bytes = body.len()))]
    async fn put(&self, key: &str, body: Bytes, mode: WriteMode) -> Result<(), StoreError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json");

        if mode == WriteMode::Create {
            request = request.if_none_match("*");
        }

        request.send().await.map_err(|e| {
            let status = e.raw_response().map(|resp| resp.status().as_u16());
            if status == Some(PRECONDITION_FAILED) {
                StoreError::AlreadyExists {
                    key: key.to_string(),
                }
            } else {
                StoreError::unavailable(format!(
                    "S3 PutObject failed for '{key}': {}",
                    DisplayErrorContext(&e)
                ))
            }
        })?;

        Ok(())
    }
}
