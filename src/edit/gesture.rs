/// Phase of an editing gesture.
///
/// `Committed` and `Cancelled` are reported by the call that ends a gesture; the
/// affordance itself is back at `Idle` afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GesturePhase {
    #[default]
    Idle,
    Hover,
    Dragging,
    Committed,
    Cancelled,
}

impl GesturePhase {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Dragging)
    }
}
