//! Document export. Exporters only read the presentation and never touch the live
//! surface, so each can run (and fail) on its own.

pub(crate) mod pdf;
pub(crate) mod pptx;

use serde::{Deserialize, Serialize};

use crate::assets::store::AssetStore;
use crate::foundation::error::SlideResult;
use crate::model::presentation::Presentation;

/// Output document format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Pptx,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

/// Serializes a whole presentation into one document, slides in model order.
pub trait Exporter {
    fn format(&self) -> ExportFormat;

    fn export(&self, presentation: &Presentation, assets: &AssetStore) -> SlideResult<Vec<u8>>;
}

/// Independent results of exporting to every format.
#[derive(Debug)]
pub struct ExportReport {
    pub pdf: SlideResult<Vec<u8>>,
    pub pptx: SlideResult<Vec<u8>>,
}

impl ExportReport {
    pub fn all_ok(&self) -> bool {
        self.pdf.is_ok() && self.pptx.is_ok()
    }
}

/// Run one exporter, logging a failure at `error`.
pub fn run_exporter(
    exporter: &dyn Exporter,
    presentation: &Presentation,
    assets: &AssetStore,
) -> SlideResult<Vec<u8>> {
    let format = exporter.format();
    let span = tracing::info_span!("export", format = format.as_str());
    let _guard = span.enter();

    let result = exporter.export(presentation, assets);
    match &result {
        Ok(bytes) => tracing::info!(
            slides = presentation.slide_count(),
            bytes = bytes.len(),
            "export finished"
        ),
        Err(err) => tracing::error!(error = %err, "export failed"),
    }
    result
}

/// Export to PDF and PPTX. A failure in one never prevents the other.
pub fn export_all(
    presentation: &Presentation,
    assets: &AssetStore,
    pdf: &dyn Exporter,
    pptx: &dyn Exporter,
) -> ExportReport {
    ExportReport {
        pdf: run_exporter(pdf, presentation, assets),
        pptx: run_exporter(pptx, presentation, assets),
    }
}
