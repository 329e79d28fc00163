//! Object-tag metadata store (Cloudinary)
//!
//! Painting metadata lives on the image assets themselves:
//! - folder path -> category
//! - tags -> freeform tags (plus legacy `title:` / `category:` tags)
//! - context (`custom`) -> `caption`/`alt`, `label_number`, `published`, `verified`
//!
//! Reads use the Admin API with basic auth. Writes use the signed upload API
//! (`/image/context`, `/image/tags`), SHA-256 signatures.

use async_trait::async_trait;
use gallery_common::config::CloudinaryConfig;
use gallery_common::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use super::{MetadataSource, RawFlag, RawRecord};

/// Admin API page size (maximum allowed)
const PAGE_SIZE: u32 = 500;

/// Metadata source backed by Cloudinary tags and context fields
#[derive(Clone)]
pub struct CloudinarySource {
    client: Client,
    config: CloudinaryConfig,
    root_folder: String,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    public_id: String,
    format: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    created_at: Option<String>,
    folder: Option<String>,
    asset_folder: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    context: Option<ResourceContext>,
}

#[derive(Debug, Deserialize)]
struct ResourceContext {
    #[serde(default)]
    custom: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FolderList {
    #[serde(default)]
    folders: Vec<Folder>,
}

#[derive(Debug, Deserialize)]
struct Folder {
    name: String,
}

/// Upload API responses list the ids the command applied to
#[derive(Debug, Deserialize)]
struct CommandResult {
    #[serde(default)]
    public_ids: Vec<String>,
}

impl Resource {
    fn into_raw(self) -> RawRecord {
        let mut custom = self.context.map(|c| c.custom).unwrap_or_default();
        let caption = custom.remove("caption").or_else(|| custom.remove("alt"));

        // Folder mode accounts report `asset_folder`; fixed-folder accounts
        // encode the folder in the public id.
        let folder = self
            .folder
            .or(self.asset_folder)
            .filter(|f| !f.is_empty())
            .or_else(|| Some(self.public_id.clone()));

        RawRecord {
            id: Some(self.public_id.clone()),
            label_number: custom.remove("label_number"),
            caption,
            folder,
            category: custom.remove("category"),
            asset_path: Some(self.public_id),
            tags: self.tags,
            published: custom.remove("published").map(RawFlag::Text),
            verified: custom.remove("verified").map(RawFlag::Text),
            width: self.width,
            height: self.height,
            format: self.format,
            created: self.created_at,
        }
    }
}

impl CloudinarySource {
    pub fn new(config: CloudinaryConfig, root_folder: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            root_folder: root_folder.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Cloudinary request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Cloudinary returned {} for {}",
                response.status(),
                url
            )));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid Cloudinary response: {}", e)))?;
        Ok(Some(body))
    }

    /// Signed upload API command; true when `id` was among the affected ids
    async fn command(&self, endpoint: &str, mut params: Vec<(String, String)>, id: &str) -> Result<bool> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        params.push(("timestamp".to_string(), timestamp));
        params.push(("public_ids".to_string(), id.to_string()));
        let signature = sign_params(&params, &self.config.api_secret);

        let mut form: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| if k == "public_ids" { ("public_ids[]".to_string(), v) } else { (k, v) })
            .collect();
        form.push(("api_key".to_string(), self.config.api_key.clone()));
        form.push(("signature".to_string(), signature));

        let url = self.api_url(&format!("image/{}", endpoint));
        debug!(endpoint, painting_id = id, "Cloudinary upload API command");

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Cloudinary request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Cloudinary returned {} for {}",
                response.status(),
                url
            )));
        }

        let result = response
            .json::<CommandResult>()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid Cloudinary response: {}", e)))?;
        Ok(result.public_ids.iter().any(|p| p == id))
    }

    async fn add_context(&self, id: &str, key: &str, value: &str) -> Result<bool> {
        let params = vec![
            ("command".to_string(), "add".to_string()),
            ("context".to_string(), format!("{}={}", key, escape_context_value(value))),
        ];
        self.command("context", params, id).await
    }

    async fn tag_command(&self, command: &str, id: &str, tag: &str) -> Result<bool> {
        let params = vec![
            ("command".to_string(), command.to_string()),
            ("tag".to_string(), tag.to_string()),
        ];
        self.command("tags", params, id).await
    }
}

/// Upload API signature: parameters sorted by name, `k=v` joined with `&`,
/// secret appended, SHA-256 hex digest.
pub fn sign_params(params: &[(String, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "api_key" | "signature" | "file" | "resource_type"))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Context values use `|` and `=` as separators
fn escape_context_value(value: &str) -> String {
    value.replace('|', "\\|").replace('=', "\\=")
}

/// Encode a public id for use as a URL path, keeping its `/` separators
fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl MetadataSource for CloudinarySource {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let url = self.api_url("resources/image/upload");
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![
                ("max_results", PAGE_SIZE.to_string()),
                ("tags", "true".to_string()),
                ("context", "true".to_string()),
            ];
            if let Some(c) = &cursor {
                query.push(("next_cursor", c.clone()));
            }

            let page: ResourceList = self
                .get_json(&url, &query)
                .await?
                .ok_or_else(|| Error::Upstream(format!("Cloudinary listing not found: {}", url)))?;

            records.extend(page.resources.into_iter().map(Resource::into_raw));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = records.len(), "Fetched Cloudinary resources");
        Ok(records)
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>> {
        let url = self.api_url(&format!("resources/image/upload/{}", encode_public_id(id)));
        let query = [("tags", "true".to_string()), ("context", "true".to_string())];
        let resource: Option<Resource> = self.get_json(&url, &query).await?;
        Ok(resource.map(Resource::into_raw))
    }

    async fn fetch_categories(&self) -> Result<Option<Vec<String>>> {
        if self.root_folder.is_empty() {
            return Ok(None);
        }
        let url = self.api_url(&format!("folders/{}", encode_public_id(&self.root_folder)));
        let listing: Option<FolderList> = self.get_json(&url, &[]).await?;
        // A root without subfolders falls back to deriving from paintings
        Ok(listing
            .map(|l| l.folders.into_iter().map(|f| f.name).collect::<Vec<_>>())
            .filter(|names| !names.is_empty()))
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool> {
        self.add_context(id, "published", if published { "true" } else { "false" }).await
    }

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool> {
        self.add_context(id, "label_number", label_number).await
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool> {
        self.add_context(id, "verified", if verified { "true" } else { "false" }).await
    }

    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.tag_command("add", id, tag).await
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.tag_command("remove", id, tag).await
    }
}
