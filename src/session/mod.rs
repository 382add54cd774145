//! Host-facing facade tying the model, assets, renderer and editing affordances
//! together for one viewing/editing session.

pub(crate) mod canvas_session;
pub(crate) mod host;
pub(crate) mod opts;
