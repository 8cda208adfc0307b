//! QR code rendering
//!
//! Rendering is a pure function of the payload: no state, no randomness, so
//! the same short URL always produces the same PNG.

use base64::prelude::*;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

/// Smallest edge of the rendered image in pixels
const MIN_DIMENSION: u32 = 256;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(String),
    #[error("failed to write PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Build the short URL that a QR code for `slug` points at
pub fn short_url(public_base_url: &str, slug: &str) -> String {
    format!("{}/r/{}", public_base_url.trim_end_matches('/'), slug)
}

/// Render `payload` as a PNG-encoded QR code
pub fn render_png(payload: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render `payload` as a `data:image/png;base64,...` URI
pub fn render_data_uri(payload: &str) -> Result<String, QrError> {
    let png = render_png(payload)?;
    Ok(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png)))
}
