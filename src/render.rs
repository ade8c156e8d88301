use crate::{
    error::{HordeError, Result},
    models::{GenerationResult, ImageRef},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// A displayable image: either the hosted URL or a `data:` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    src: String,
}

impl RenderedImage {
    pub fn from_result(result: &GenerationResult) -> Self {
        let src = match &result.image {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Inline { mime_type, base64 } => format!(
                "data:{};base64,{}",
                mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE),
                base64
            ),
        };
        Self { src }
    }

    /// The string an `<img src>` (or any viewer) would take.
    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_remote(&self) -> bool {
        !self.src.starts_with("data:")
    }

    fn data_parts(&self) -> Option<(&str, &str)> {
        let rest = self.src.strip_prefix("data:")?;
        rest.split_once(";base64,")
    }

    /// File extension for the saved image, taken from the mime type or the URL path.
    pub fn extension(&self) -> &str {
        let candidate = match self.data_parts() {
            Some((mime, _)) => mime.strip_prefix("image/"),
            None => self
                .src
                .split_once("://")
                .map_or(self.src.as_str(), |(_, rest)| rest)
                .split(['?', '#'])
                .next()
                .and_then(|s| s.split_once('/'))
                .and_then(|(_, path)| path.rsplit('/').next())
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext),
        };

        match candidate {
            Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
            _ => "png",
        }
    }

    pub fn file_name(&self, timestamp_millis: i64) -> String {
        format!("gen_{}.{}", timestamp_millis, self.extension())
    }

    /// The exact bytes behind the image: the decoded payload, or the body the
    /// URL serves. Nothing is re-encoded.
    pub async fn bytes(&self, http: &reqwest::Client) -> Result<Vec<u8>> {
        if let Some((_, payload)) = self.data_parts() {
            return Ok(STANDARD.decode(payload)?);
        }

        let response = http.get(&self.src).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HordeError::Response(format!(
                "Image download failed ({}): {}",
                status.as_u16(),
                self.src
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Write the image into `dir` as `gen_<millis>.<ext>` and return the path.
    pub async fn save(&self, dir: &Path, http: &reqwest::Client) -> Result<PathBuf> {
        let bytes = self.bytes(http).await?;
        tokio::fs::create_dir_all(dir).await?;

        // Saves of consecutive slots can land in the same millisecond.
        let mut millis = chrono::Utc::now().timestamp_millis();
        let mut path = dir.join(self.file_name(millis));
        while tokio::fs::try_exists(&path).await? {
            millis += 1;
            path = dir.join(self.file_name(millis));
        }
        tokio::fs::write(&path, &bytes).await?;
        log::info!("💾 Image saved to: {}", path.display());
        Ok(path)
    }
}
