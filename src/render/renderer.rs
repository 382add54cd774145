use crate::{
    assets::store::AssetStore,
    foundation::core::{CanvasSize, FrameRGBA, Point, Rgba8},
    foundation::error::SlideResult,
    geometry::transform::Viewport,
    model::element::ElementId,
    model::presentation::Presentation,
    model::slide::Slide,
    render::cpu::{FrameTarget, Overlay, SlidePainter, placeholder_frame},
    render::scene::SceneCache,
    render::surface::{Surface, SurfaceHandle, SurfaceState},
    render::text::TextPainter,
};

/// What a call to [`CanvasRenderer::render`] produced.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOutcome {
    /// A painted frame of the current slide.
    Frame(FrameRGBA),
    /// The surface is unavailable; a solid placeholder frame is shown instead.
    Placeholder(FrameRGBA),
    /// No surface attached; nothing to show.
    Detached,
}

impl RenderOutcome {
    pub fn frame(&self) -> Option<&FrameRGBA> {
        match self {
            Self::Frame(f) | Self::Placeholder(f) => Some(f),
            Self::Detached => None,
        }
    }
}

/// Session-scoped renderer: owns the live surface and its scene cache.
///
/// The scene is rebuilt only when the shown slide changes or is dirty; resizing
/// re-applies the viewport without touching it.
pub struct CanvasRenderer {
    surface: Surface,
    scene: SceneCache,
    painter: SlidePainter,
    canvas: CanvasSize,
    placeholder: Rgba8,
    shown: Option<usize>,
}

impl CanvasRenderer {
    pub(crate) fn new(
        canvas: CanvasSize,
        text: TextPainter,
        placeholder: Rgba8,
        max_init_retries: u32,
    ) -> Self {
        Self {
            surface: Surface::new(max_init_retries),
            scene: SceneCache::default(),
            painter: SlidePainter::new(text, placeholder),
            canvas,
            placeholder,
            shown: None,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.surface.state()
    }

    /// Liveness token of the current surface.
    pub fn liveness(&self) -> u64 {
        self.surface.generation()
    }

    pub fn is_live(&self, token: u64) -> bool {
        self.surface.is_live(token)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.surface.target().map(|t| t.viewport)
    }

    pub fn scene(&self) -> &SceneCache {
        &self.scene
    }

    pub(crate) fn scene_mut(&mut self) -> &mut SceneCache {
        &mut self.scene
    }

    /// Index of the slide the scene currently mirrors.
    pub fn shown(&self) -> Option<usize> {
        self.shown
    }

    /// Attach the surface. Calling again while attached is a no-op.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self, handle: SurfaceHandle) -> SurfaceState {
        self.surface.attach(handle, self.canvas)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> SurfaceState {
        self.surface.resize(width, height, self.canvas)
    }

    /// Release the surface and every cached view object.
    pub fn dispose(&mut self) {
        self.surface.dispose();
        self.scene.clear();
        self.shown = None;
    }

    /// Forget the mirrored slide so the next sync rebuilds unconditionally.
    pub(crate) fn invalidate(&mut self) {
        self.scene.clear();
        self.shown = None;
    }

    /// Bring the scene in line with slide `index`. Returns whether it was rebuilt.
    pub fn sync(&mut self, presentation: &mut Presentation, index: usize) -> bool {
        let dirty = presentation.take_dirty(index);
        if self.shown == Some(index) && !dirty {
            return false;
        }
        match presentation.slide(index) {
            Some(slide) => {
                self.scene.rebuild(slide);
                self.shown = Some(index);
                tracing::debug!(index, objects = self.scene.len(), dirty, "scene rebuilt");
            }
            None => {
                self.scene.clear();
                self.shown = None;
            }
        }
        true
    }

    /// Topmost interactive element under a device-space point.
    pub fn hit_test(&self, device: Point) -> Option<ElementId> {
        let viewport = self.viewport()?;
        self.scene.hit_test(viewport.from_device(device))
    }

    /// Paint the shown slide with `overlays` on top.
    pub fn render(
        &mut self,
        presentation: &Presentation,
        assets: &AssetStore,
        overlays: &[Overlay],
    ) -> SlideResult<RenderOutcome> {
        match self.surface.state() {
            SurfaceState::Detached => Ok(RenderOutcome::Detached),
            SurfaceState::Pending { .. } | SurfaceState::Placeholder => {
                let (w, h) = self
                    .surface
                    .handle()
                    .map(|h| (h.width.max(1), h.height.max(1)))
                    .unwrap_or((1, 1));
                let (w, h) = (w.min(u32::from(u16::MAX)), h.min(u32::from(u16::MAX)));
                Ok(RenderOutcome::Placeholder(placeholder_frame(
                    w,
                    h,
                    self.placeholder,
                )))
            }
            SurfaceState::Ready => {
                let Some(target) = self.surface.target().copied() else {
                    return Ok(RenderOutcome::Detached);
                };
                let empty;
                let slide = match self.shown.and_then(|i| presentation.slide(i)) {
                    Some(s) => s,
                    None => {
                        empty = Slide::empty("");
                        &empty
                    }
                };
                let frame = self.painter.paint(
                    slide,
                    presentation.settings(),
                    assets,
                    &target,
                    overlays,
                )?;
                Ok(RenderOutcome::Frame(frame))
            }
        }
    }

    /// Paint `slide` into a standalone frame without touching the live surface.
    pub fn render_offscreen(
        &mut self,
        presentation: &Presentation,
        index: usize,
        assets: &AssetStore,
        target: &FrameTarget,
    ) -> SlideResult<Option<FrameRGBA>> {
        let Some(slide) = presentation.slide(index) else {
            return Ok(None);
        };
        self.painter
            .paint(slide, presentation.settings(), assets, target, &[])
            .map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
