//! PPTX package writer.
//!
//! Every slide becomes one slide part with native shapes, text boxes, pictures and
//! group shapes. Image media is stored once per distinct content hash.

mod parts;
mod shapes;

use std::io::{Cursor, Seek, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::{
    assets::store::AssetStore,
    export::{ExportFormat, Exporter},
    foundation::error::{SlideError, SlideResult},
    model::presentation::Presentation,
};

use shapes::{MediaTable, SlideWriter, emu};

#[derive(Clone, Copy, Debug, Default)]
pub struct PptxExporter;

impl PptxExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for PptxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pptx
    }

    #[tracing::instrument(skip_all, fields(slides = presentation.slide_count()))]
    fn export(&self, presentation: &Presentation, assets: &AssetStore) -> SlideResult<Vec<u8>> {
        let slides = presentation.slides();
        if slides.is_empty() {
            return Err(SlideError::export("pptx", "presentation has no slides"));
        }
        let settings = presentation.settings();

        let mut media = MediaTable::default();
        let mut slide_parts = Vec::with_capacity(slides.len());
        for slide in slides {
            let (xml, rels) = SlideWriter::new(&mut media, assets).slide(slide, settings)?;
            slide_parts.push((xml, parts::slide_rels(&rels)));
        }
        tracing::debug!(media = media.files.len(), "pptx media collected");

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let canvas = settings.canvas;
        put(
            &mut zip,
            "[Content_Types].xml",
            parts::content_types(slides.len(), &media.extensions()).as_bytes(),
            opts,
        )?;
        put(&mut zip, "_rels/.rels", parts::root_rels().as_bytes(), opts)?;
        put(
            &mut zip,
            "docProps/core.xml",
            parts::core_props(settings.title.as_deref()).as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "docProps/app.xml",
            parts::app_props(slides.len()).as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/presentation.xml",
            parts::presentation(
                slides.len(),
                emu(f64::from(canvas.width)),
                emu(f64::from(canvas.height)),
            )
            .as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            parts::presentation_rels(slides.len()).as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            parts::slide_master().as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            parts::slide_master_rels().as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            parts::slide_layout().as_bytes(),
            opts,
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            parts::slide_layout_rels().as_bytes(),
            opts,
        )?;
        let theme = &settings.theme;
        put(
            &mut zip,
            "ppt/theme/theme1.xml",
            parts::theme(
                &theme.background.hex_rgb(),
                &theme.text_color.hex_rgb(),
                &theme.font_family,
            )
            .as_bytes(),
            opts,
        )?;

        for (i, (xml, rels)) in slide_parts.iter().enumerate() {
            let n = i + 1;
            put(&mut zip, &format!("ppt/slides/slide{n}.xml"), xml.as_bytes(), opts)?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                rels.as_bytes(),
                opts,
            )?;
        }
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, bytes) in &media.files {
            put(&mut zip, &format!("ppt/media/{name}"), bytes, stored)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| SlideError::export("pptx", format!("finish package: {e}")))?;
        Ok(cursor.into_inner())
    }
}

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    opts: SimpleFileOptions,
) -> SlideResult<()> {
    zip.start_file(name, opts)
        .map_err(|e| SlideError::export("pptx", format!("start part '{name}': {e}")))?;
    zip.write_all(bytes)
        .map_err(|e| SlideError::export("pptx", format!("write part '{name}': {e}")))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../../tests/unit/export/pptx.rs"]
mod tests;
