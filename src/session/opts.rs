use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    export::pdf::PdfMode,
    foundation::core::{CanvasSize, Rgba8},
    foundation::error::{SlideError, SlideResult},
    model::presentation::{PresentationSettings, Theme},
    render::text::read_font,
};

/// Overrides [`SessionOpts::font`].
pub const ENV_FONT: &str = "SLIDECANVAS_FONT";
/// Overrides [`SessionOpts::assets_root`].
pub const ENV_ASSETS_ROOT: &str = "SLIDECANVAS_ASSETS_ROOT";

/// Configuration of one canvas session.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOpts {
    /// Logical canvas size.
    pub canvas: CanvasSize,
    pub title: Option<String>,
    pub theme: Theme,
    /// Root that relative image sources resolve against.
    pub assets_root: PathBuf,
    /// TTF/OTF file used for text layout. Without one, text renders as line bars.
    pub font: Option<PathBuf>,
    pub pdf_mode: PdfMode,
    /// Worker threads for raster PDF export (`None` = rayon default).
    pub pdf_threads: Option<usize>,
    /// Surface creation attempts before the renderer settles on a placeholder.
    pub max_init_retries: u32,
    /// Fill of the placeholder frame and of missing images.
    pub placeholder: Rgba8,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            title: None,
            theme: Theme::default(),
            assets_root: PathBuf::from("."),
            font: None,
            pdf_mode: PdfMode::Vector,
            pdf_threads: None,
            max_init_retries: 3,
            placeholder: Rgba8::rgb(0xe2, 0xe8, 0xf0),
        }
    }
}

impl SessionOpts {
    /// Read options from a JSON file, then apply environment overrides.
    pub fn from_path(path: &Path) -> SlideResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read session options '{}'", path.display()))?;
        let mut opts: Self = serde_json::from_str(&text)
            .map_err(|e| SlideError::serde(format!("{}: {e}", path.display())))?;
        opts.apply_env(|k| std::env::var(k).ok());
        opts.validate()?;
        Ok(opts)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        opts.apply_env(|k| std::env::var(k).ok());
        opts
    }

    /// Apply `SLIDECANVAS_*` overrides read through `var`. Empty values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(font) = var(ENV_FONT).filter(|v| !v.trim().is_empty()) {
            self.font = Some(PathBuf::from(font));
        }
        if let Some(root) = var(ENV_ASSETS_ROOT).filter(|v| !v.trim().is_empty()) {
            self.assets_root = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> SlideResult<()> {
        CanvasSize::new(self.canvas.width, self.canvas.height)?;
        if self.max_init_retries == 0 {
            return Err(SlideError::validation("max_init_retries must be >= 1"));
        }
        if self.pdf_threads == Some(0) {
            return Err(SlideError::validation("pdf_threads must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn presentation_settings(&self) -> PresentationSettings {
        PresentationSettings {
            canvas: self.canvas,
            title: self.title.clone(),
            theme: self.theme.clone(),
        }
    }

    pub(crate) fn load_font(&self) -> SlideResult<Option<Arc<Vec<u8>>>> {
        self.font.as_deref().map(read_font).transpose()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
