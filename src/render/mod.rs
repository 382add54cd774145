//! Canvas rendering: the CPU slide painter, surface lifecycle, scene cache and the
//! session-scoped renderer tying them together.

pub(crate) mod cpu;
pub(crate) mod renderer;
pub(crate) mod scene;
pub(crate) mod surface;
pub(crate) mod text;
