//! External file hosting for chart images.
//!
//! Charts only store URLs; the bytes live on a hosting service. [`FileHost`]
//! is the seam the chart service talks through, with [`UploadThingHost`] as
//! the production implementation over UploadThing's v6 REST API.

use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{UPLOADTHING_API_KEY_HEADER, UPLOADTHING_API_URL};
use crate::error::{JournalError, Result};

/// A file stored on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedFile {
    pub key: String,
    pub url: String,
}

/// Upload and delete operations against an external file host.
pub trait FileHost: Send + Sync {
    fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<HostedFile>;

    /// Delete the file behind a previously returned URL.
    fn delete(&self, url: &str) -> Result<()>;
}

/// Extract the file key from a hosted URL of the form `.../f/{key}`.
pub fn file_key_from_url(url: &str) -> Result<String> {
    let key = url
        .rsplit_once("/f/")
        .map(|(_, rest)| rest.split(['?', '#']).next().unwrap_or(""))
        .unwrap_or("");
    if key.is_empty() || key.contains('/') {
        return Err(JournalError::InvalidArgument(format!(
            "not a hosted file URL: {url}"
        )));
    }
    Ok(key.to_string())
}

// ---------------------------------------------------------------------------
// DisabledFileHost
// ---------------------------------------------------------------------------

/// Used when no hosting credentials are configured. Every call fails, which
/// chart deletion logs and skips.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledFileHost;

impl FileHost for DisabledFileHost {
    fn upload(&self, file_name: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<HostedFile> {
        Err(JournalError::FileHost(format!(
            "file hosting is not configured; cannot upload {file_name}"
        )))
    }

    fn delete(&self, url: &str) -> Result<()> {
        Err(JournalError::FileHost(format!(
            "file hosting is not configured; cannot delete {url}"
        )))
    }
}

// ---------------------------------------------------------------------------
// UploadThingHost
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignedUpload {
    key: String,
    file_url: String,
    url: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct PresignedResponse {
    data: Vec<PresignedUpload>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    success: bool,
}

/// UploadThing v6 REST client.
pub struct UploadThingHost {
    client: Client,
    api_url: String,
    api_key: String,
}

impl UploadThingHost {
    /// Build a client. `api_url` defaults to the public UploadThing API.
    ///
    /// Must be called off the async executor (the blocking client owns its
    /// own runtime).
    pub fn new(api_key: impl Into<String>, api_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url
                .unwrap_or(UPLOADTHING_API_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v6/{}", self.api_url, path)
    }
}

impl FileHost for UploadThingHost {
    fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<HostedFile> {
        let size = bytes.len();
        let resp = self
            .client
            .post(self.endpoint("uploadFiles"))
            .header(UPLOADTHING_API_KEY_HEADER, &self.api_key)
            .json(&json!({
                "files": [{ "name": file_name, "size": size, "type": content_type }],
                "acl": "public-read",
                "contentDisposition": "inline",
            }))
            .send()?;
        if !resp.status().is_success() {
            return Err(JournalError::FileHost(format!(
                "upload request for {file_name} rejected: HTTP {}",
                resp.status()
            )));
        }
        let presigned = resp
            .json::<PresignedResponse>()?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| JournalError::FileHost("no presigned upload returned".into()))?;

        let mut form = multipart::Form::new();
        for (name, value) in presigned.fields {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(name, value);
        }
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        form = form.part("file", part);

        let put = self.client.post(&presigned.url).multipart(form).send()?;
        if !put.status().is_success() {
            return Err(JournalError::FileHost(format!(
                "storage rejected {file_name}: HTTP {}",
                put.status()
            )));
        }

        info!("Uploaded {} ({} bytes) as {}", file_name, size, presigned.key);
        Ok(HostedFile {
            key: presigned.key,
            url: presigned.file_url,
        })
    }

    fn delete(&self, url: &str) -> Result<()> {
        let key = file_key_from_url(url)?;
        debug!("Deleting hosted file {}", key);
        let resp = self
            .client
            .post(self.endpoint("deleteFiles"))
            .header(UPLOADTHING_API_KEY_HEADER, &self.api_key)
            .json(&json!({ "fileKeys": [key] }))
            .send()?;
        if !resp.status().is_success() {
            return Err(JournalError::FileHost(format!(
                "delete of {key} rejected: HTTP {}",
                resp.status()
            )));
        }
        let body: DeleteResponse = resp.json()?;
        if !body.success {
            return Err(JournalError::FileHost(format!("delete of {key} unsuccessful")));
        }
        Ok(())
    }
}
