use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ETAG, IF_MATCH, IF_NONE_MATCH};

use crate::error::StoreError;
use crate::store::{ObjectStore, StoredObject, VersionToken};

/// Objects in a bucket reachable with plain GET/PUT (public-write or
/// token-gated). The `ETag` is the version token; writes are guarded with
/// `If-None-Match: *` on create and `If-Match` on update.
pub struct HttpStore {
    client: Client,
    bucket_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(
        bucket_url: &str,
        token: Option<&str>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|source| StoreError::Request {
                path: bucket_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            bucket_url: bucket_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.bucket_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn send(&self, path: &str, req: RequestBuilder) -> Result<Response, StoreError> {
        self.authorized(req)
            .send()
            .map_err(|source| StoreError::Request {
                path: path.to_string(),
                source,
            })
    }

    fn finish_write(path: &str, resp: Response) -> Result<(), StoreError> {
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => Err(StoreError::Conflict {
                path: path.to_string(),
            }),
            s => Err(StoreError::Status {
                path: path.to_string(),
                status: s.as_u16(),
                body: resp.text().unwrap_or_default(),
            }),
        }
    }
}

impl ObjectStore for HttpStore {
    fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        let resp = self.send(path, self.client.get(self.object_url(path)))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content = resp.bytes().map_err(|source| StoreError::Request {
            path: path.to_string(),
            source,
        })?;

        Ok(Some(StoredObject {
            content: content.to_vec(),
            version: VersionToken::new(etag),
        }))
    }

    fn create(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        let req = self
            .client
            .put(self.object_url(path))
            .header(IF_NONE_MATCH, "*")
            .body(content.to_vec());
        let resp = self.send(path, req)?;
        Self::finish_write(path, resp)
    }

    fn update(
        &self,
        path: &str,
        content: &[u8],
        version: &VersionToken,
    ) -> Result<(), StoreError> {
        let mut req = self.client.put(self.object_url(path)).body(content.to_vec());
        // Some buckets send no ETag; those updates are unconditional.
        if !version.as_str().is_empty() {
            req = req.header(IF_MATCH, version.as_str());
        }
        let resp = self.send(path, req)?;
        Self::finish_write(path, resp)
    }
}
