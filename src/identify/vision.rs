// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rock identification from photographs using a vision model

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{parse, IdentificationResult};
use crate::config::PromptConfig;
use crate::ollama::OllamaClient;
use crate::{AppConfig, Result, RockhoundError};

/// Longest side, in pixels, of an image sent to the model
pub const MAX_DIMENSION: u32 = 1024;

pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

/// Something that can name a rock from one or more photos of it
#[async_trait]
pub trait Identifier: Send + Sync {
    async fn identify(&self, images: &[PathBuf]) -> Result<IdentificationResult>;
}

/// True if the path has an image extension the decoder understands
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Resize large images and re-encode as JPEG
pub fn prepare_image(path: &Path) -> Result<Vec<u8>> {
    let img = image::open(path)?;
    let (width, height) = img.dimensions();

    let img = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Vec::new();
    rgb.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Jpeg)?;

    debug!("Prepared {:?}: {}x{} -> {} bytes", path, width, height, buffer.len());
    Ok(buffer)
}

/// Base64 payload for one image, falling back to the raw file bytes
pub fn encode_image(path: &Path) -> Result<String> {
    let data = match prepare_image(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Could not re-encode {:?} ({}), sending raw bytes", path, e);
            std::fs::read(path)?
        }
    };
    Ok(general_purpose::STANDARD.encode(&data))
}

/// [`Identifier`] backed by an Ollama vision model
pub struct VisionIdentifier {
    client: OllamaClient,
    model: String,
    prompts: PromptConfig,
}

impl VisionIdentifier {
    pub fn new(client: OllamaClient, model: impl Into<String>, prompts: PromptConfig) -> Self {
        Self {
            client,
            model: model.into(),
            prompts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            OllamaClient::new(&config.ai_engine)?,
            config.ai_engine.models.vision.clone(),
            config.prompts.clone(),
        ))
    }
}

#[async_trait]
impl Identifier for VisionIdentifier {
    async fn identify(&self, images: &[PathBuf]) -> Result<IdentificationResult> {
        if images.is_empty() {
            return Err(RockhoundError::InvalidInput("at least one image is required".to_string()));
        }

        info!("Identifying rock from {} image(s)", images.len());
        let encoded = images
            .iter()
            .map(|path| encode_image(path))
            .collect::<Result<Vec<_>>>()?;

        let prompt = self.prompts.identify_for(images.len());
        let reply = self.client
            .generate_with_retry(&self.model, &prompt, &encoded)
            .await?;

        Ok(parse(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([120, 90, 60, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_prepare_image_downscales() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", 2048, 512);

        let jpeg = prepare_image(&path).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (1024, 256));
    }

    #[test]
    fn test_prepare_image_keeps_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "small.png", 64, 48);

        let decoded = image::load_from_memory(&prepare_image(&path).unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_encode_falls_back_to_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let encoded = encode_image(&path).unwrap();
        assert_eq!(general_purpose::STANDARD.decode(encoded).unwrap(), b"not an image");
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("rock.JPG")));
        assert!(is_supported_image(Path::new("a/b/c.webp")));
        assert!(!is_supported_image(Path::new("rock.txt")));
        assert!(!is_supported_image(Path::new("rock")));
    }

    #[tokio::test]
    async fn test_empty_image_list_rejected() {
        let engine = EngineConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default().ai_engine
        };
        let identifier = VisionIdentifier::new(
            OllamaClient::new(&engine).unwrap(),
            "llava",
            PromptConfig::default(),
        );
        let err = identifier.identify(&[]).await.unwrap_err();
        assert!(matches!(err, RockhoundError::InvalidInput(_)));
    }
}
