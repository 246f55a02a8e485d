use crate::{
    data_url::{self, DataUrl},
    error::{Result, StudioError},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

pub const MAX_REFERENCE_IMAGES: usize = 5;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An in-memory reference image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageAsset {
    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(StudioError::ValidationError(format!(
                "Unsupported file type: {}",
                mime_type
            )));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StudioError::ValidationError(
                "File size exceeds 10MB limit.".into(),
            ));
        }
        Ok(Self { bytes, mime_type })
    }

    /// Wraps a previous generation output so it can be reused as a reference.
    pub fn from_data_url(input: &str) -> Result<Self> {
        let parsed = DataUrl::parse(input)
            .ok_or_else(|| StudioError::ValidationError("Invalid image data URL.".into()))?;
        let mime_type = parsed.mime_type.unwrap_or("image/png").to_string();
        Self::from_bytes(parsed.decode()?, mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64_data(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        data_url::encode(&self.mime_type, &self.bytes)
    }
}

/// The active set of reference images, capped at [`MAX_REFERENCE_IMAGES`].
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: Vec<ImageAsset>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, asset: ImageAsset) -> Result<()> {
        if self.images.len() >= MAX_REFERENCE_IMAGES {
            return Err(StudioError::ValidationError(format!(
                "You can upload a maximum of {} images.",
                MAX_REFERENCE_IMAGES
            )));
        }
        self.images.push(asset);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<ImageAsset> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= MAX_REFERENCE_IMAGES
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter()
    }

    pub fn to_vec(&self) -> Vec<ImageAsset> {
        self.images.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait3x4,
        AspectRatio::Widescreen,
        AspectRatio::Tall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| StudioError::ValidationError(format!("Unsupported aspect ratio: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    #[default]
    TextToImage,
    ImageToImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    Fast,
    Pro,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Fast => f.write_str("fast"),
            QualityTier::Pro => f.write_str("pro"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A validated, immutable generation submission.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    id: Uuid,
    prompt: String,
    aspect_ratio: AspectRatio,
    mode: GenerationMode,
    tier: QualityTier,
    images: Vec<ImageAsset>,
}

impl GenerationRequest {
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            mode: GenerationMode::default(),
            tier: QualityTier::default(),
            images: Vec::new(),
        }
    }

    pub fn text_to_image(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Result<Self> {
        Self::builder(prompt).aspect_ratio(aspect_ratio).build()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    prompt: String,
    aspect_ratio: AspectRatio,
    mode: GenerationMode,
    tier: QualityTier,
    images: Vec<ImageAsset>,
}

impl GenerationRequestBuilder {
    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn tier(mut self, tier: QualityTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn image(mut self, image: ImageAsset) -> Self {
        self.images.push(image);
        self
    }

    pub fn images(mut self, images: impl IntoIterator<Item = ImageAsset>) -> Self {
        self.images.extend(images);
        self
    }

    pub fn quality_tier(&self) -> QualityTier {
        self.tier
    }

    pub fn build(self) -> Result<GenerationRequest> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::ValidationError("Please provide a prompt.".into()));
        }
        if self.mode == GenerationMode::ImageToImage && self.images.is_empty() {
            return Err(StudioError::ValidationError(
                "Please upload an image and provide a prompt.".into(),
            ));
        }
        if self.images.len() > MAX_REFERENCE_IMAGES {
            return Err(StudioError::ValidationError(format!(
                "You can upload a maximum of {} images.",
                MAX_REFERENCE_IMAGES
            )));
        }

        Ok(GenerationRequest {
            id: Uuid::new_v4(),
            prompt: self.prompt,
            aspect_ratio: self.aspect_ratio,
            mode: self.mode,
            tier: self.tier,
            images: self.images,
        })
    }
}

/// What the UI renders after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum GenerationResult {
    Image(String),
    Error(String),
}

impl GenerationResult {
    pub fn from_outcome(outcome: Result<String>, tier: QualityTier) -> Self {
        match outcome {
            Ok(data_url) => GenerationResult::Image(data_url),
            Err(e) => GenerationResult::Error(e.user_message(tier)),
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            GenerationResult::Image(url) => Some(url),
            GenerationResult::Error(_) => None,
        }
    }
}
