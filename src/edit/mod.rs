//! Interactive editing affordances. Each one reads geometry from the scene and
//! writes committed mutations straight into the presentation.

pub(crate) mod crop;
pub(crate) mod gesture;
pub(crate) mod radius;
pub(crate) mod reorder;
