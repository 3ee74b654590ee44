//! Classroom/Drive HTTP client.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::auth::Authenticator;
use crate::api::types::*;
use crate::api::{CatalogSource, FileSource};
use crate::config::{Config, RetryConfig};
use crate::download::retry::with_retry;
use crate::error::{Error, Result};

/// Classroom API base URL.
const CLASSROOM_API: &str = "https://classroom.googleapis.com/v1";

/// Drive API base URL.
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";

/// Items requested per page for list calls.
pub const PAGE_SIZE: u32 = 100;

/// Metadata fields the planner needs for naming and dispatch.
const FILE_FIELDS: &str = "id,name,size,createdTime,mimeType,exportLinks,md5Checksum";

/// Authenticated client for the Classroom and Drive REST APIs.
pub struct ClassroomApi {
    client: Client,
    auth: Authenticator,
    retry: RetryConfig,
}

impl ClassroomApi {
    /// Create a client from the configured credential files.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("classroom-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        let auth = Authenticator::new(
            client.clone(),
            &config.client_secrets_path(),
            config.token_cache_path(),
        )?;

        Ok(Self {
            client,
            auth,
            retry: config.retry.clone(),
        })
    }

    /// Obtain a token up front so an interactive login happens before any listing.
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.access_token().await.map(|_| ())
    }

    /// Make an authenticated GET request, renewing the token once on 401.
    async fn get_once(&self, url: &Url) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let token = self.auth.access_token().await?;
        let mut response = self.client.get(url.clone()).bearer_auth(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Access token rejected, renewing");
            let token = self.auth.renew().await?;
            response = self.client.get(url.clone()).bearer_auth(&token).send().await?;
        }

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication(format!("HTTP {}: {}", status, message)));
        }

        Err(Error::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
            message,
        })
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        with_retry(&self.retry, || async move {
            let response = self.get_once(url).await?;
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| {
                Error::Api(format!(
                    "Failed to parse response from {}: {} - Response: {}",
                    url,
                    e,
                    text.chars().take(500).collect::<String>()
                ))
            })
        })
        .await
    }

    /// Open a body stream with its declared content type.
    ///
    /// Only the request is retried; a failure while the caller reads the
    /// stream surfaces as an error item.
    async fn get_stream(&self, url: &Url) -> Result<Download> {
        let response = with_retry(&self.retry, || self.get_once(url)).await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes_stream().map(|chunk| chunk.map_err(Error::from));
        Ok(Download::new(content_type, body.boxed()))
    }

    /// Fetch every page of a list call and merge the `key` arrays.
    async fn list_all<T: DeserializeOwned>(&self, url: Url, key: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            {
                let mut query = page_url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: Value = self.get_json(&page_url).await?;
            let (page_items, next) = split_page(page, key)?;
            items.extend(page_items);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }
}

/// Split one page into its items under `key` and the continuation token.
///
/// A page without `key` contributes no items (the APIs omit empty arrays).
pub fn split_page(page: Value, key: &str) -> Result<(Vec<Value>, Option<String>)> {
    let Value::Object(mut page) = page else {
        return Err(Error::Api("List response is not a JSON object".into()));
    };

    let next = match page.remove("nextPageToken") {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    };

    let items = match page.remove(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            return Err(Error::Api(format!(
                "List response field '{}' is not an array",
                key
            )))
        }
    };

    Ok((items, next))
}

fn api_url(base: &str, path: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}{}", base, path))?)
}

#[async_trait]
impl CatalogSource for ClassroomApi {
    async fn list_courses(&self) -> Result<Vec<CourseResource>> {
        self.list_all(api_url(CLASSROOM_API, "/courses")?, "courses")
            .await
    }

    async fn list_course_work_materials(
        &self,
        course_id: &str,
    ) -> Result<Vec<CourseWorkMaterialResource>> {
        let url = api_url(
            CLASSROOM_API,
            &format!("/courses/{}/courseWorkMaterials", course_id),
        )?;
        self.list_all(url, "courseWorkMaterial").await
    }
}

#[async_trait]
impl FileSource for ClassroomApi {
    async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let mut url = api_url(DRIVE_API, &format!("/files/{}", file_id))?;
        url.query_pairs_mut()
            .append_pair("fields", FILE_FIELDS)
            .append_pair("supportsAllDrives", "true");
        self.get_json(&url).await
    }

    async fn download_media(&self, file_id: &str) -> Result<Download> {
        let mut url = api_url(DRIVE_API, &format!("/files/{}", file_id))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("supportsAllDrives", "true");
        self.get_stream(&url).await
    }

    async fn fetch_export_link(&self, url: &str) -> Result<Download> {
        let url = Url::parse(url)?;
        self.get_stream(&url).await
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<Download> {
        let mut url = api_url(DRIVE_API, &format!("/files/{}/export", file_id))?;
        url.query_pairs_mut().append_pair("mimeType", mime_type);
        self.get_stream(&url).await
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<FileMetadata>> {
        let mut url = api_url(DRIVE_API, "/files")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("'{}' in parents and trashed = false", folder_id))
            .append_pair("fields", &format!("nextPageToken,files({})", FILE_FIELDS))
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");
        self.list_all(url, "files").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_page_with_token() {
        let page = json!({
            "courses": [{"id": "1"}, {"id": "2"}],
            "nextPageToken": "abc"
        });
        let (items, next) = split_page(page, "courses").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(next.as_deref(), Some("abc"));
    }

    #[test]
    fn test_split_page_last_page() {
        let (items, next) = split_page(json!({"courses": [{"id": "3"}]}), "courses").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(next, None);
    }

    #[test]
    fn test_split_page_missing_key_is_empty() {
        let (items, next) = split_page(json!({}), "courseWorkMaterial").unwrap();
        assert!(items.is_empty());
        assert_eq!(next, None);

        let (_, next) = split_page(json!({"nextPageToken": ""}), "files").unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn test_split_page_rejects_malformed_pages() {
        assert!(split_page(json!([1, 2]), "files").is_err());
        assert!(split_page(json!({"files": "nope"}), "files").is_err());
    }

    #[test]
    fn test_merged_pages_deserialize() {
        let mut merged = Vec::new();
        for page in [
            json!({"courses": [{"id": "1", "name": "Math", "creationTime": "2024-01-01T00:00:00Z"}], "nextPageToken": "p2"}),
            json!({"courses": [{"id": "2", "name": "Art", "creationTime": "2024-02-01T00:00:00Z"}]}),
        ] {
            let (items, _) = split_page(page, "courses").unwrap();
            merged.extend(items);
        }

        let courses: Vec<CourseResource> = merged
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[1].name, "Art");
    }

    #[test]
    fn test_api_url() {
        let url = api_url(CLASSROOM_API, "/courses/42/courseWorkMaterials").unwrap();
        assert_eq!(
            url.as_str(),
            "https://classroom.googleapis.com/v1/courses/42/courseWorkMaterials"
        );
    }
}
