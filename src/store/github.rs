use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{ObjectStore, StoredObject, VersionToken};

/// Files in a GitHub repository branch, through the contents API.
/// The blob `sha` is the version token and every write is a commit.
pub struct GithubStore {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

/// Shape shared by the contents and git blob endpoints.
#[derive(Debug, Deserialize)]
struct Contents {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn decode_content(path: &str, contents: &Contents) -> Result<Vec<u8>, StoreError> {
    if contents.encoding != "base64" {
        return Err(StoreError::Decode {
            path: path.to_string(),
            reason: format!("unsupported content encoding '{}'", contents.encoding),
        });
    }
    // The API wraps base64 at 60 columns.
    let packed: String = contents
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(packed).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

fn status_error(path: &str, resp: Response) -> StoreError {
    let status = resp.status().as_u16();
    StoreError::Status {
        path: path.to_string(),
        status,
        body: resp.text().unwrap_or_default(),
    }
}

impl GithubStore {
    pub fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        branch: &str,
        token: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|source| StoreError::Request {
                path: api_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            token: token.to_string(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn blob_url(&self, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/blobs/{}",
            self.api_url, self.owner, self.repo, sha
        )
    }

    fn get_json(&self, path: &str, req: RequestBuilder) -> Result<Option<Contents>, StoreError> {
        let request_error = |source| StoreError::Request {
            path: path.to_string(),
            source,
        };

        let resp = req
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(request_error)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(status_error(path, resp));
        }
        resp.json().map(Some).map_err(request_error)
    }

    /// Files over 1 MB come back from the contents API with `encoding: none`
    /// and no content; the blob endpoint still serves them base64-encoded.
    fn get_blob(&self, path: &str, sha: &str) -> Result<Vec<u8>, StoreError> {
        let blob = self
            .get_json(path, self.client.get(self.blob_url(sha)))?
            .ok_or_else(|| StoreError::Decode {
                path: path.to_string(),
                reason: format!("blob {sha} not found"),
            })?;
        decode_content(path, &blob)
    }

    fn put(&self, path: &str, body: &PutContents<'_>) -> Result<(), StoreError> {
        let resp = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .json(body)
            .send()
            .map_err(|source| StoreError::Request {
                path: path.to_string(),
                source,
            })?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(StoreError::Conflict {
                path: path.to_string(),
            }),
            _ => Err(status_error(path, resp)),
        }
    }
}

impl ObjectStore for GithubStore {
    fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        let req = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())]);
        let Some(contents) = self.get_json(path, req)? else {
            return Ok(None);
        };

        let content = if contents.encoding == "base64" {
            decode_content(path, &contents)?
        } else {
            self.get_blob(path, &contents.sha)?
        };

        Ok(Some(StoredObject {
            content,
            version: VersionToken::new(contents.sha),
        }))
    }

    fn create(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        self.put(
            path,
            &PutContents {
                message: format!("Create {}", file_name(path)),
                content: STANDARD.encode(content),
                branch: &self.branch,
                sha: None,
            },
        )
    }

    fn update(
        &self,
        path: &str,
        content: &[u8],
        version: &VersionToken,
    ) -> Result<(), StoreError> {
        self.put(
            path,
            &PutContents {
                message: format!("Update {}", file_name(path)),
                content: STANDARD.encode(content),
                branch: &self.branch,
                sha: Some(version.as_str()),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_contents_url() {
        let store = GithubStore::new(
            "https://api.github.com/",
            "someone",
            "someone.github.io",
            "master",
            "t0ken",
            "feedroll-test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.contents_url("api/error.log"),
            "https://api.github.com/repos/someone/someone.github.io/contents/api/error.log"
        );
    }

    #[test]
    fn update_body_carries_sha() {
        let body = PutContents {
            message: format!("Update {}", file_name("api/rss_data.json")),
            content: STANDARD.encode(b"[]"),
            branch: "master",
            sha: Some("abc123"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Update rss_data.json");
        assert_eq!(json["content"], "W10=");
        assert_eq!(json["sha"], "abc123");

        let create = PutContents { sha: None, ..body };
        assert!(serde_json::to_value(&create).unwrap().get("sha").is_none());
    }

    #[test]
    fn decodes_wrapped_base64() {
        let contents: Contents = serde_json::from_str(
            r#"{"encoding":"base64","sha":"s1","content":"aHR0cHM6Ly9hLmV4YW1w\nbGUvZmVlZAo=\n"}"#,
        )
        .unwrap();
        assert_eq!(
            decode_content("api/rss_feeds.txt", &contents).unwrap(),
            b"https://a.example/feed\n"
        );
    }

    #[test]
    fn refuses_to_decode_unencoded_content() {
        let contents: Contents =
            serde_json::from_str(r#"{"encoding":"none","size":2000000,"content":"","sha":"abc"}"#)
                .unwrap();
        let err = decode_content("api/error.log", &contents).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "{err}");
    }
}
