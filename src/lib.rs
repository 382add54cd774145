//! Slidecanvas turns generated slide sources into an editable, renderable presentation.
//!
//! The public API is session-oriented:
//!
//! - Parse a directory of slide sources into a [`Presentation`]
//! - Drive a [`CanvasSession`]: attach a surface, navigate, render, edit
//! - Export every slide to PDF ([`PdfExporter`]) or PPTX ([`PptxExporter`])
#![forbid(unsafe_code)]

mod assets;
mod edit;
mod export;
mod foundation;
mod geometry;
mod model;
mod parse;
mod render;
mod session;

pub use crate::foundation::core::{
    Affine, BezPath, CanvasSize, FrameRGBA, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{SlideError, SlideResult};

pub use crate::assets::store::{AssetStore, ImageFormat, PreparedImage};
pub use crate::edit::crop::CropEditor;
pub use crate::edit::gesture::GesturePhase;
pub use crate::edit::radius::{RadiusEditor, read_radius, write_radius};
pub use crate::edit::reorder::{
    HANDLE_HIT_RADIUS, ReorderGesture, ReorderHandle, handle_at, handles,
};
pub use crate::export::pdf::{PdfExporter, PdfMode};
pub use crate::export::pptx::PptxExporter;
pub use crate::export::{ExportFormat, ExportReport, Exporter, export_all, run_exporter};
pub use crate::geometry::transform::{
    GroupFrame, Viewport, crop_to_clip, display_radius, element_affine, element_bounds,
    fit_viewport, group_child_affine, initial_crop_rect, project_group_child, stored_radius,
    unproject_group_child, world_affine,
};
pub use crate::model::element::{
    ClipRegion, CornerRadius, CropData, Element, ElementId, ElementKind, FlexDirection,
    FlexboxTextGroup, Geometry, ImageElement, ObjectFit, ShapeElement, ShapeKind, TextAlign,
    TextElement, TextSource, TextStyle,
};
pub use crate::model::presentation::{
    EditOutcome, ElementLocation, Presentation, PresentationSettings, Theme, UnsupportedEdit,
};
pub use crate::model::slide::{Background, LayoutHint, Slide};
pub use crate::parse::error::ParseDiagnostic;
pub use crate::parse::source::{SourceUnit, collect_slides_dir};
pub use crate::parse::{ParsedPresentation, parse_presentation, parse_slide};
pub use crate::render::cpu::{FrameTarget, Overlay};
pub use crate::render::renderer::{CanvasRenderer, RenderOutcome};
pub use crate::render::scene::{Interactivity, SceneCache, SurfaceObject};
pub use crate::render::surface::{SurfaceHandle, SurfaceState};
pub use crate::session::canvas_session::{CanvasSession, PendingImageLoad};
pub use crate::session::host::{HostEffect, HostMessage};
pub use crate::session::opts::{ENV_ASSETS_ROOT, ENV_FONT, SessionOpts};
