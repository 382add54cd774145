use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::model::element::{Element, ElementId};

/// Slide background descriptor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    #[default]
    None,
    Color {
        color: Rgba8,
    },
    Image {
        src: String,
    },
}

/// Slide-level layout hint recovered from the root container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutHint {
    #[default]
    Flow,
    TwoColumn,
    Centered,
}

/// One slide: ordered elements (paint order) plus background and layout hint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Source path the slide was parsed from (e.g. `/slides/001.tsx`).
    pub path: String,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub layout: LayoutHint,
    #[serde(skip)]
    pub(crate) revision: u64,
    #[serde(skip)]
    pub(crate) dirty: bool,
}

impl Slide {
    /// Empty slide for `path`.
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            elements: Vec::new(),
            background: Background::None,
            layout: LayoutHint::Flow,
            revision: 0,
            dirty: false,
        }
    }

    /// Whether the slide changed since the renderer last synchronized it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.dirty = true;
    }

    /// Top-level element index for `id`.
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Visit every element including group children, parents first.
    pub fn walk(&self, mut f: impl FnMut(&Element, Option<&Element>)) {
        for e in &self.elements {
            f(e, None);
            if let Some(g) = e.group() {
                for c in &g.children {
                    f(c, Some(e));
                }
            }
        }
    }

    /// Total number of elements including group children.
    pub fn element_count(&self) -> usize {
        let mut n = 0;
        self.walk(|_, _| n += 1);
        n
    }
}
