use serde::{Deserialize, Serialize};

use crate::foundation::core::CanvasSize;
use crate::foundation::error::{SlideError, SlideResult};
use crate::render::cpu::FrameTarget;

/// Host-side description of the container a renderer draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceHandle {
    /// Opaque host identifier; re-attaching the same id is a no-op.
    pub id: u64,
    /// Container width in device pixels.
    pub width: u32,
    /// Container height in device pixels.
    pub height: u32,
}

/// Lifecycle of the live drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    /// No container attached.
    Detached,
    /// Attached, but the surface could not be created yet.
    Pending { attempts: u32 },
    /// Surface exists and frames can be painted.
    Ready,
    /// Retries exhausted; only placeholder frames are produced.
    Placeholder,
}

/// Surface lifecycle bookkeeping: state machine, retry budget and liveness token.
#[derive(Debug)]
pub(crate) struct Surface {
    handle: Option<SurfaceHandle>,
    state: SurfaceState,
    target: Option<FrameTarget>,
    max_retries: u32,
    generation: u64,
}

impl Surface {
    pub(crate) fn new(max_retries: u32) -> Self {
        Self {
            handle: None,
            state: SurfaceState::Detached,
            target: None,
            max_retries: max_retries.max(1),
            generation: 0,
        }
    }

    pub(crate) fn state(&self) -> SurfaceState {
        self.state
    }

    pub(crate) fn handle(&self) -> Option<SurfaceHandle> {
        self.handle
    }

    pub(crate) fn target(&self) -> Option<&FrameTarget> {
        self.target.as_ref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_live(&self, token: u64) -> bool {
        self.state != SurfaceState::Detached && token == self.generation
    }

    /// Attach to `handle`. Attaching while already attached keeps the current surface.
    pub(crate) fn attach(&mut self, handle: SurfaceHandle, canvas: CanvasSize) -> SurfaceState {
        if self.state != SurfaceState::Detached {
            if self.handle.map(|h| h.id) != Some(handle.id) {
                tracing::debug!(
                    current = ?self.handle.map(|h| h.id),
                    requested = handle.id,
                    "surface already attached; ignoring initialize"
                );
            }
            return self.state;
        }
        self.generation += 1;
        self.handle = Some(handle);
        self.state = SurfaceState::Pending { attempts: 0 };
        self.try_create(canvas);
        self.state
    }

    /// Container size changed: recompute the fit, or retry creation while pending.
    pub(crate) fn resize(&mut self, width: u32, height: u32, canvas: CanvasSize) -> SurfaceState {
        let Some(handle) = self.handle.as_mut() else {
            return self.state;
        };
        handle.width = width;
        handle.height = height;

        match self.state {
            SurfaceState::Detached | SurfaceState::Placeholder => {}
            SurfaceState::Ready => match create_target(canvas, width, height) {
                Ok(target) => self.target = Some(target),
                Err(err) => {
                    tracing::warn!(width, height, error = %err, "surface lost on resize");
                    self.target = None;
                    self.state = SurfaceState::Pending { attempts: 0 };
                }
            },
            SurfaceState::Pending { .. } => self.try_create(canvas),
        }
        self.state
    }

    /// Release the surface. Safe to call in any state.
    pub(crate) fn dispose(&mut self) {
        if self.state != SurfaceState::Detached {
            tracing::debug!(generation = self.generation, "surface disposed");
            self.generation += 1;
        }
        self.handle = None;
        self.target = None;
        self.state = SurfaceState::Detached;
    }

    fn try_create(&mut self, canvas: CanvasSize) {
        let SurfaceState::Pending { attempts } = self.state else {
            return;
        };
        let Some(handle) = self.handle else {
            return;
        };
        match create_target(canvas, handle.width, handle.height) {
            Ok(target) => {
                tracing::debug!(
                    width = handle.width,
                    height = handle.height,
                    zoom = target.viewport.zoom,
                    "surface ready"
                );
                self.target = Some(target);
                self.state = SurfaceState::Ready;
            }
            Err(err) => {
                let attempts = attempts + 1;
                if attempts >= self.max_retries {
                    tracing::warn!(attempts, error = %err, "surface init failed; showing placeholder");
                    self.state = SurfaceState::Placeholder;
                } else {
                    tracing::warn!(attempts, error = %err, "surface init failed; will retry on resize");
                    self.state = SurfaceState::Pending { attempts };
                }
            }
        }
    }
}

/// Fit the canvas into a `width x height` container, rejecting unusable sizes.
pub(crate) fn create_target(canvas: CanvasSize, width: u32, height: u32) -> SlideResult<FrameTarget> {
    if width == 0 || height == 0 {
        return Err(SlideError::surface(format!(
            "container {width}x{height} has zero area"
        )));
    }
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(SlideError::surface(format!(
            "container {width}x{height} exceeds the surface limit"
        )));
    }
    Ok(FrameTarget::fit(canvas, width, height))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
