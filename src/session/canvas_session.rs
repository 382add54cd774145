use std::path::Path;
use std::sync::Arc;

use crate::{
    assets::store::AssetStore,
    edit::crop::CropEditor,
    edit::gesture::GesturePhase,
    edit::radius::{RadiusEditor, read_radius, write_radius},
    edit::reorder::{ReorderGesture, ReorderHandle, handle_at, handles},
    export::pdf::PdfExporter,
    export::pptx::PptxExporter,
    export::{ExportReport, export_all, run_exporter},
    foundation::core::{FrameRGBA, Point, Rect},
    foundation::error::{SlideError, SlideResult},
    model::element::{CornerRadius, Element, ElementId, Geometry},
    model::presentation::{EditOutcome, Presentation},
    parse::error::ParseDiagnostic,
    parse::parse_presentation,
    parse::source::{SourceUnit, collect_slides_dir},
    render::renderer::{CanvasRenderer, RenderOutcome},
    render::surface::{SurfaceHandle, SurfaceState, create_target},
    render::text::TextPainter,
    session::host::{HostEffect, HostMessage},
    session::opts::SessionOpts,
};

/// An image load started by [`CanvasSession::begin_image_insert`].
///
/// Completing it after the surface was disposed or re-attached drops the result.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingImageLoad {
    token: u64,
    slide: usize,
    src: String,
    geometry: Geometry,
}

impl PendingImageLoad {
    pub fn src(&self) -> &str {
        &self.src
    }
}

/// One viewing/editing session over a presentation.
///
/// The session owns the model, the asset store, the renderer and the three
/// editing affordances. Dropping it disposes the surface.
pub struct CanvasSession {
    opts: SessionOpts,
    font: Option<Arc<Vec<u8>>>,
    presentation: Presentation,
    diagnostics: Vec<ParseDiagnostic>,
    assets: AssetStore,
    renderer: CanvasRenderer,
    current: usize,
    fullscreen: bool,
    reorder: ReorderGesture,
    crop: CropEditor,
    radius: RadiusEditor,
}

impl CanvasSession {
    #[tracing::instrument(skip(opts))]
    pub fn new(opts: SessionOpts) -> SlideResult<Self> {
        opts.validate()?;
        let font = opts.load_font()?;
        let text = match &font {
            Some(bytes) => TextPainter::with_font(bytes.clone())?,
            None => TextPainter::new(),
        };
        let renderer = CanvasRenderer::new(
            opts.canvas,
            text,
            opts.placeholder,
            opts.max_init_retries,
        );
        Ok(Self {
            presentation: Presentation::new(Vec::new(), opts.presentation_settings()),
            assets: AssetStore::new(opts.assets_root.clone()),
            font,
            opts,
            diagnostics: Vec::new(),
            renderer,
            current: 0,
            fullscreen: false,
            reorder: ReorderGesture::default(),
            crop: CropEditor::default(),
            radius: RadiusEditor::default(),
        })
    }

    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn renderer(&self) -> &CanvasRenderer {
        &self.renderer
    }

    /// Diagnostics from the last load.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slide_count(&self) -> usize {
        self.presentation.slide_count()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Attach the live surface. Idempotent while attached.
    pub fn attach(&mut self, handle: SurfaceHandle) -> SurfaceState {
        let state = self.renderer.initialize(handle);
        self.sync();
        state
    }

    pub fn resize(&mut self, width: u32, height: u32) -> SurfaceState {
        self.renderer.resize(width, height)
    }

    /// Replace the presentation with `units`, parsed and ordered by path.
    ///
    /// Returns the number of slides. Parse problems never fail the load; they are
    /// kept in [`Self::diagnostics`].
    #[tracing::instrument(skip(self, units), fields(units = units.len()))]
    pub fn load_slides(&mut self, units: Vec<SourceUnit>) -> usize {
        self.cancel_gestures();
        let parsed = parse_presentation(units, self.opts.presentation_settings());
        self.presentation = parsed.presentation;
        self.diagnostics = parsed.diagnostics;
        let missing = self.assets.prefetch(&self.presentation);
        if missing > 0 {
            tracing::warn!(missing, "some images are unavailable and render as placeholders");
        }
        self.current = 0;
        self.renderer.invalidate();
        self.sync();
        tracing::info!(slides = self.slide_count(), "slides loaded");
        self.slide_count()
    }

    /// Load every file under `<root>/slides/`.
    pub fn load_slides_dir(&mut self, root: &Path) -> SlideResult<usize> {
        let units = collect_slides_dir(root)?;
        Ok(self.load_slides(units))
    }

    /// Show slide `index`. Active gestures are cancelled.
    pub fn go_to(&mut self, index: usize) -> SlideResult<usize> {
        if index >= self.slide_count() {
            return Err(SlideError::validation(format!(
                "slide index {index} out of range (len {})",
                self.slide_count()
            )));
        }
        if index != self.current {
            self.cancel_gestures();
            self.current = index;
        }
        self.sync();
        Ok(self.current)
    }

    /// Advance one slide; stays on the last one.
    pub fn next(&mut self) -> usize {
        let last = self.slide_count().saturating_sub(1);
        let _ = self.go_to((self.current + 1).min(last));
        self.current
    }

    /// Go back one slide; stays on the first one.
    pub fn previous(&mut self) -> usize {
        let _ = self.go_to(self.current.saturating_sub(1));
        self.current
    }

    fn sync(&mut self) {
        self.renderer.sync(&mut self.presentation, self.current);
    }

    fn cancel_gestures(&mut self) {
        self.reorder.cancel();
        self.crop.cancel(self.renderer.scene_mut());
        if let Err(err) = self.radius.cancel(&mut self.presentation) {
            tracing::warn!(error = %err, "radius edit could not be reverted");
        }
    }

    /// Paint the current slide with any active overlays.
    pub fn render(&mut self) -> SlideResult<RenderOutcome> {
        self.sync();
        let overlays: Vec<_> = self
            .crop
            .overlay()
            .into_iter()
            .chain(self.reorder.drop_indicator(&self.presentation))
            .collect();
        self.renderer
            .render(&self.presentation, &self.assets, &overlays)
    }

    /// Paint slide `index` into a standalone `width x height` frame.
    pub fn render_frame(&mut self, index: usize, width: u32, height: u32) -> SlideResult<FrameRGBA> {
        let target = create_target(self.opts.canvas, width, height)?;
        self.renderer
            .render_offscreen(&self.presentation, index, &self.assets, &target)?
            .ok_or_else(|| SlideError::validation(format!("slide index {index} out of range")))
    }

    fn pdf_exporter(&self) -> PdfExporter {
        PdfExporter {
            mode: self.opts.pdf_mode,
            font: self.font.clone(),
            threads: self.opts.pdf_threads,
            placeholder: self.opts.placeholder,
        }
    }

    /// Every slide, in model order, regardless of the one shown.
    pub fn export_pdf(&self) -> SlideResult<Vec<u8>> {
        run_exporter(&self.pdf_exporter(), &self.presentation, &self.assets)
    }

    pub fn export_pptx(&self) -> SlideResult<Vec<u8>> {
        run_exporter(&PptxExporter, &self.presentation, &self.assets)
    }

    pub fn export_all(&self) -> ExportReport {
        export_all(
            &self.presentation,
            &self.assets,
            &self.pdf_exporter(),
            &PptxExporter,
        )
    }

    /// One-page PDF of the current slide.
    pub fn print_current(&self) -> SlideResult<Vec<u8>> {
        self.pdf_exporter()
            .export_slide(&self.presentation, &self.assets, self.current)
    }

    /// React to a raw host message. Unknown kinds are ignored.
    pub fn handle_host_message(&mut self, raw: &str) -> SlideResult<HostEffect> {
        match HostMessage::parse(raw) {
            HostMessage::ExportPdf => {
                let bytes = self.print_current().inspect_err(|err| {
                    tracing::error!(error = %err, "print to pdf failed");
                })?;
                Ok(HostEffect::PrintToPdf(bytes))
            }
            HostMessage::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                tracing::debug!(fullscreen = self.fullscreen, "fullscreen toggled");
                Ok(HostEffect::FullscreenChanged(self.fullscreen))
            }
            HostMessage::Unknown => Ok(HostEffect::Ignored),
        }
    }

    /// Release the surface and drop any modal state. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.cancel_gestures();
        self.renderer.dispose();
    }

    /// Start inserting image `src` on the current slide. The bytes arrive later.
    pub fn begin_image_insert(
        &self,
        src: impl Into<String>,
        geometry: Geometry,
    ) -> SlideResult<PendingImageLoad> {
        if self.renderer.state() == SurfaceState::Detached {
            return Err(SlideError::validation("image insert requires an attached surface"));
        }
        if self.presentation.slide(self.current).is_none() {
            return Err(SlideError::validation("no slide to insert into"));
        }
        if !geometry.is_finite() {
            return Err(SlideError::validation("element geometry must be finite"));
        }
        Ok(PendingImageLoad {
            token: self.renderer.liveness(),
            slide: self.current,
            src: src.into(),
            geometry,
        })
    }

    /// Finish an insert on top of the slide it was started on.
    ///
    /// Returns `None` when the surface went away while the bytes were loading.
    pub fn complete_image_insert(
        &mut self,
        pending: PendingImageLoad,
        bytes: Vec<u8>,
    ) -> SlideResult<Option<ElementId>> {
        if !self.renderer.is_live(pending.token) {
            tracing::debug!(src = %pending.src, "image load finished after dispose; dropped");
            return Ok(None);
        }
        self.assets.insert_bytes(&pending.src, bytes)?;
        let top = self
            .presentation
            .slide(pending.slide)
            .map(|s| s.elements.len())
            .ok_or_else(|| SlideError::validation("slide removed during image load"))?;
        let id = self.presentation.insert_element(
            pending.slide,
            top,
            Element::image(pending.geometry, pending.src),
        )?;
        self.sync();
        Ok(Some(id))
    }

    /// Topmost interactive element under a device-space point.
    pub fn hit_test(&self, device: Point) -> Option<ElementId> {
        self.renderer.hit_test(device)
    }

    pub fn reorder_handles(&self, group: ElementId) -> Vec<ReorderHandle> {
        handles(&self.presentation, group)
    }

    pub fn reorder_phase(&self) -> GesturePhase {
        self.reorder.phase()
    }

    pub fn begin_reorder(&mut self, group: ElementId, from: usize) -> SlideResult<()> {
        self.reorder.begin(&self.presentation, group, from)
    }

    /// Pointer moved to `device` over `group`'s handles.
    pub fn hover_reorder(&mut self, group: ElementId, device: Point) -> GesturePhase {
        let hit = self.reorder_hit(group, device);
        self.reorder.hover(hit)
    }

    /// Drop at `device` (or on the last hovered handle when `None`).
    pub fn drop_reorder(&mut self, device: Option<Point>) -> SlideResult<EditOutcome> {
        let to = match (self.reorder.group(), device) {
            (Some(group), Some(p)) => self.reorder_hit(group, p),
            _ => None,
        };
        let outcome = self.reorder.drop_on(&mut self.presentation, to)?;
        self.sync();
        Ok(outcome)
    }

    pub fn cancel_reorder(&mut self) -> GesturePhase {
        self.reorder.cancel()
    }

    fn reorder_hit(&self, group: ElementId, device: Point) -> Option<usize> {
        let viewport = self.renderer.viewport()?;
        handle_at(&handles(&self.presentation, group), &viewport, device)
    }

    pub fn crop_phase(&self) -> GesturePhase {
        self.crop.phase()
    }

    /// Enter crop mode on `image`; returns the initial crop rectangle.
    pub fn enter_crop(&mut self, image: ElementId) -> SlideResult<Rect> {
        self.sync();
        self.crop
            .enter(&self.presentation, self.renderer.scene_mut(), image)
    }

    pub fn set_crop_rect(&mut self, rect: Rect) -> SlideResult<()> {
        self.crop.set_rect(rect)
    }

    pub fn apply_crop(&mut self) -> SlideResult<EditOutcome> {
        let outcome = self
            .crop
            .apply(&mut self.presentation, self.renderer.scene_mut())?;
        self.sync();
        Ok(outcome)
    }

    pub fn cancel_crop(&mut self) -> GesturePhase {
        self.crop.cancel(self.renderer.scene_mut())
    }

    /// Radius of `id` in canvas pixels; `None` without a rounded-rect primitive.
    pub fn corner_radius(&self, id: ElementId) -> Option<CornerRadius> {
        read_radius(&self.presentation, id)
    }

    /// Set the radius of `id` from canvas pixels in one step.
    pub fn set_corner_radius(
        &mut self,
        id: ElementId,
        entered: CornerRadius,
    ) -> SlideResult<EditOutcome> {
        let outcome = write_radius(&mut self.presentation, id, entered)?;
        self.sync();
        Ok(outcome)
    }

    pub fn begin_radius_edit(&mut self, id: ElementId) -> SlideResult<Option<CornerRadius>> {
        self.radius.begin(&mut self.presentation, id)
    }

    pub fn preview_radius(&mut self, entered: CornerRadius) -> SlideResult<EditOutcome> {
        let outcome = self.radius.preview(&mut self.presentation, entered)?;
        self.sync();
        Ok(outcome)
    }

    pub fn commit_radius(&mut self, entered: CornerRadius) -> SlideResult<EditOutcome> {
        let outcome = self.radius.commit(&mut self.presentation, entered)?;
        self.sync();
        Ok(outcome)
    }

    pub fn cancel_radius(&mut self) -> SlideResult<GesturePhase> {
        let phase = self.radius.cancel(&mut self.presentation)?;
        self.sync();
        Ok(phase)
    }

    /// The presentation as pretty-printed JSON.
    pub fn dump_json(&self) -> SlideResult<String> {
        serde_json::to_string_pretty(&self.presentation).map_err(|e| SlideError::serde(e.to_string()))
    }
}

impl Drop for CanvasSession {
    fn drop(&mut self) {
        self.renderer.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/canvas_session.rs"]
mod tests;
