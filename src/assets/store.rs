use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use base64::Engine as _;

use crate::{
    assets::decode as assets_decode,
    foundation::error::{SlideError, SlideResult},
    model::{element::ElementKind, presentation::Presentation, slide::Background},
};

/// Container format of the original encoded bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Svg,
    Other,
}

impl ImageFormat {
    fn sniff(bytes: &[u8], hint: &str) -> Self {
        if bytes.starts_with(b"\x89PNG") {
            return Self::Png;
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]).to_ascii_lowercase();
        let hint = hint.to_ascii_lowercase();
        if head.contains("<svg")
            || hint.ends_with(".svg")
            || hint.starts_with("data:image/svg+xml")
        {
            return Self::Svg;
        }
        Self::Other
    }
}

#[derive(Clone, Debug)]
/// Decoded image plus the bytes it was decoded from.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
    /// Original encoded bytes.
    pub encoded: Arc<Vec<u8>>,
    pub format: ImageFormat,
    /// xxh3 of `encoded`, used to de-duplicate exported media.
    pub content_hash: u64,
}

impl PreparedImage {
    /// Bytes and file extension suitable for embedding in a document package.
    ///
    /// PNG and JPEG are passed through; anything else is re-encoded as PNG.
    pub fn embeddable(&self) -> SlideResult<(Arc<Vec<u8>>, &'static str)> {
        match self.format {
            ImageFormat::Png => Ok((self.encoded.clone(), "png")),
            ImageFormat::Jpeg => Ok((self.encoded.clone(), "jpeg")),
            ImageFormat::Svg | ImageFormat::Other => {
                let png = assets_decode::encode_png(self.width, self.height, &self.rgba8_premul)?;
                Ok((Arc::new(png), "png"))
            }
        }
    }
}

/// Resolves image sources into decoded pixels, caching by source string.
///
/// Sources are paths relative to the assets root (a leading `/` is ignored) or
/// `data:` URIs with a base64 payload. Failures are remembered as missing and
/// never fail a render.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    root: PathBuf,
    images: HashMap<String, PreparedImage>,
    missing: HashMap<String, String>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: HashMap::new(),
            missing: HashMap::new(),
        }
    }

    /// Root directory used when resolving relative sources.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, src: &str) -> Option<&PreparedImage> {
        self.images.get(src)
    }

    /// Why `src` could not be loaded, if it was attempted and failed.
    pub fn missing_reason(&self, src: &str) -> Option<&str> {
        self.missing.get(src).map(String::as_str)
    }

    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    /// Load every image source referenced by `presentation`. Returns how many are missing.
    #[tracing::instrument(skip(self, presentation), fields(root = %self.root.display()))]
    pub fn prefetch(&mut self, presentation: &Presentation) -> usize {
        let mut sources = Vec::new();
        for slide in presentation.slides() {
            if let Background::Image { src } = &slide.background {
                sources.push(src.clone());
            }
            slide.walk(|e, _| {
                if let ElementKind::Image(img) = &e.kind {
                    sources.push(img.src.clone());
                }
            });
        }
        for src in sources {
            self.ensure(&src);
        }
        self.missing.len()
    }

    /// Resolve and cache `src`; a failure is recorded and logged.
    pub fn ensure(&mut self, src: &str) -> Option<&PreparedImage> {
        if !self.images.contains_key(src) && !self.missing.contains_key(src) {
            match self.read_source(src).and_then(|bytes| prepare(src, bytes)) {
                Ok(img) => {
                    tracing::debug!(src, width = img.width, height = img.height, "image ready");
                    self.images.insert(src.to_owned(), img);
                }
                Err(err) => {
                    tracing::warn!(src, error = %err, "image source unavailable");
                    self.missing.insert(src.to_owned(), err.to_string());
                }
            }
        }
        self.images.get(src)
    }

    /// Register already-fetched bytes under `src`, replacing any previous entry.
    pub fn insert_bytes(&mut self, src: &str, bytes: Vec<u8>) -> SlideResult<&PreparedImage> {
        let img = prepare(src, bytes)?;
        self.missing.remove(src);
        self.images.insert(src.to_owned(), img);
        self.images
            .get(src)
            .ok_or_else(|| SlideError::validation(format!("image '{src}' vanished after insert")))
    }

    fn read_source(&self, src: &str) -> SlideResult<Vec<u8>> {
        if let Some(rest) = src.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(SlideError::validation(format!(
                "remote image '{src}' is not fetched"
            )));
        }
        let rel = normalize_rel_path(src)?;
        let path = self.root.join(Path::new(&rel));
        std::fs::read(&path)
            .with_context(|| format!("read image bytes from '{}'", path.display()))
            .map_err(SlideError::from)
    }
}

fn prepare(src: &str, bytes: Vec<u8>) -> SlideResult<PreparedImage> {
    let format = ImageFormat::sniff(&bytes, src);
    let decoded = match format {
        ImageFormat::Svg => assets_decode::rasterize_svg(&assets_decode::parse_svg(&bytes)?)?,
        _ => assets_decode::decode_image(&bytes)?,
    };
    Ok(PreparedImage {
        width: decoded.width,
        height: decoded.height,
        rgba8_premul: Arc::new(decoded.rgba8_premul),
        content_hash: xxhash_rust::xxh3::xxh3_64(&bytes),
        encoded: Arc::new(bytes),
        format,
    })
}

/// Payload of a `data:` URI (without the scheme). Only base64 payloads are accepted.
fn decode_data_uri(rest: &str) -> SlideResult<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| SlideError::validation("data uri has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(SlideError::validation("only base64 data uris are supported"));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decode base64 data uri")?;
    Ok(bytes)
}

/// Normalize an asset path relative to the assets root.
///
/// Uses `/` separators, drops a leading `/` and `.` segments, and rejects `..`.
pub(crate) fn normalize_rel_path(source: &str) -> SlideResult<String> {
    let s = source.replace('\\', "/");
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SlideError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SlideError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
