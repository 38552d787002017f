//! Egui-backed image acquisition and preview textures.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use client_core::{PreviewHost, SelectedFile};
use eframe::egui;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const PREVIEW_MAX_DIMENSION: u32 = 1024;

/// What the selection surface hands over: a picked or dropped path, or raw
/// bytes when the platform delivers a drop without a path.
#[derive(Debug, Clone)]
pub enum PickedImage {
    Path(PathBuf),
    Dropped { name: String, bytes: Arc<[u8]> },
}

impl PickedImage {
    pub fn from_dropped(file: &egui::DroppedFile) -> Option<Self> {
        if let Some(path) = &file.path {
            return Some(Self::Path(path.clone()));
        }
        file.bytes.as_ref().map(|bytes| Self::Dropped {
            name: file.name.clone(),
            bytes: Arc::clone(bytes),
        })
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Dropped { name, .. } => name.clone(),
        }
    }
}

pub struct ImagePreview {
    pub texture: egui::TextureHandle,
    pub size: egui::Vec2,
}

impl ImagePreview {
    /// Scales the preview down to fit a `max` x `max` box, never up.
    pub fn fitted_size(&self, max: f32) -> egui::Vec2 {
        let largest = self.size.x.max(self.size.y).max(1.0);
        self.size * (max / largest).min(1.0)
    }
}

#[derive(Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub struct EguiPreviewHost {
    ctx: egui::Context,
    created: u64,
}

impl EguiPreviewHost {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx, created: 0 }
    }
}

impl PreviewHost for EguiPreviewHost {
    type Handle = PickedImage;
    type Preview = ImagePreview;

    fn acquire_file(&mut self, handle: &PickedImage) -> Result<SelectedFile> {
        let name = handle.display_name();
        let bytes = match handle {
            PickedImage::Path(path) => {
                fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?
            }
            PickedImage::Dropped { bytes, .. } => bytes.to_vec(),
        };
        let mime_type = mime_guess::from_path(&name).first_raw().map(str::to_string);
        Ok(SelectedFile {
            name,
            mime_type,
            bytes,
        })
    }

    fn create_preview(&mut self, file: &SelectedFile) -> Result<ImagePreview> {
        let image = decode_preview_image(&file.bytes)?;
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
        self.created += 1;
        let texture = self.ctx.load_texture(
            format!("selected-image:{}:{}", self.created, file.name),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        Ok(ImagePreview {
            texture,
            size: egui::vec2(image.width as f32, image.height as f32),
        })
    }

    fn revoke_preview(&mut self, preview: ImagePreview) {
        tracing::debug!(texture = ?preview.texture.id(), "releasing preview texture");
        // The texture is freed once its last handle is gone.
        drop(preview);
    }
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| anyhow!("undecodable image: {err}"))?;
    let resized = dynamic
        .thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
        .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub fn is_image_filename(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
