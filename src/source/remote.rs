use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};

use super::{ContentSource, FetchError};

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Reads files from a branch of a GitHub repository through the contents API
#[derive(Debug, Clone)]
pub struct RemoteContentSource {
    client: Client,
    api_base: String,
    repository: String,
    branch: String,
    access_token: Option<String>,
}

impl RemoteContentSource {
    pub fn new(
        repository: impl Into<String>,
        branch: impl Into<String>,
        access_token: Option<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            repository: repository.into(),
            branch: branch.into(),
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.repository,
            path.trim_start_matches('/')
        )
    }
}

/// Map a response status to a fetch error, `None` on success
fn classify_status(status: StatusCode, path: &str) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(path.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::AccessDenied(format!("{} ({})", path, status))
        }
        _ => FetchError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        },
    })
}

#[async_trait]
impl ContentSource for RemoteContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.contents_url(path);
        tracing::debug!(
            repository = %self.repository,
            branch = %self.branch,
            path = %path,
            "Fetching remote file"
        );

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", self.branch.as_str())])
            .header(ACCEPT, RAW_MEDIA_TYPE);
        if let Some(token) = &self.access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        if let Some(err) = classify_status(response.status(), path) {
            return Err(err);
        }

        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        format!("remote:{}@{}", self.repository, self.branch)
    }
}
