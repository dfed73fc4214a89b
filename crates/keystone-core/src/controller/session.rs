//! Interaction sessions: one per press/move/release cycle.

use serde::{Deserialize, Serialize};

use crate::crop::{CropBox, CropHandle};
use crate::error::CropError;
use crate::space::{Logical, NormalisedRect, Point};

/// What kind of drag a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Dragging a crop handle or the crop body
    Free,
    /// Dragging a perspective or straighten slider
    Perspective,
    /// A handle drag that reached the viewport edge zone
    Edge,
}

/// Controller state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingFree,
    DraggingPerspective,
    DraggingEdge,
}

impl From<Option<&InteractionSession>> for InteractionState {
    fn from(session: Option<&InteractionSession>) -> Self {
        match session.map(|s| s.mode) {
            None => InteractionState::Idle,
            Some(SessionMode::Free) => InteractionState::DraggingFree,
            Some(SessionMode::Perspective) => InteractionState::DraggingPerspective,
            Some(SessionMode::Edge) => InteractionState::DraggingEdge,
        }
    }
}

/// Values captured when a drag starts and dropped when it ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub mode: SessionMode,
    /// Crop width over height at press time
    pub locked_aspect_ratio: f64,
    pub baseline_width: f64,
    pub baseline_height: f64,
    /// Handle being dragged, for free and edge sessions
    pub handle: Option<CropHandle>,
}

impl InteractionSession {
    /// Start a perspective slider session from the current crop.
    pub fn perspective(crop: &CropBox) -> Result<Self, CropError> {
        Self::capture(SessionMode::Perspective, crop, None)
    }

    /// Start a handle drag session from the current crop.
    pub fn free(crop: &CropBox, handle: CropHandle) -> Result<Self, CropError> {
        Self::capture(SessionMode::Free, crop, Some(handle))
    }

    fn capture(
        mode: SessionMode,
        crop: &CropBox,
        handle: Option<CropHandle>,
    ) -> Result<Self, CropError> {
        let (width, height) = (crop.width, crop.height);
        let usable = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
        if !usable {
            return Err(CropError::DegenerateBaseline { width, height });
        }
        Ok(Self {
            mode,
            locked_aspect_ratio: width / height,
            baseline_width: width,
            baseline_height: height,
            handle,
        })
    }

    /// Switch a free drag into edge-push mode. Other modes are unchanged.
    pub fn escalate_to_edge(&mut self) -> bool {
        if self.mode == SessionMode::Free {
            self.mode = SessionMode::Edge;
            true
        } else {
            false
        }
    }

    /// Swap the baseline axes after an odd number of quarter turns, so the
    /// baseline keeps describing the same texture-space crop.
    pub fn transpose(&mut self) {
        std::mem::swap(&mut self.baseline_width, &mut self.baseline_height);
        self.locked_aspect_ratio = self.baseline_width / self.baseline_height;
    }

    /// True for handle drags, including ones in the edge zone.
    pub fn is_handle_drag(&self) -> bool {
        matches!(self.mode, SessionMode::Free | SessionMode::Edge)
    }

    /// Baseline-sized rectangle with the locked aspect ratio, centred at
    /// `center`.
    pub fn baseline_rect(&self, center: Point) -> NormalisedRect<Logical> {
        let width = self.baseline_width;
        let height = width / self.locked_aspect_ratio;
        NormalisedRect::from_center(center.x, center.y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop(w: f64, h: f64) -> CropBox {
        let mut c = CropBox::full(0.01);
        c.set(0.5, 0.5, w, h);
        c
    }

    #[test]
    fn test_perspective_session_captures_baseline() {
        let session = InteractionSession::perspective(&crop(0.6, 0.3)).unwrap();
        assert_eq!(session.mode, SessionMode::Perspective);
        assert!((session.locked_aspect_ratio - 2.0).abs() < 1e-12);
        assert_eq!(session.baseline_width, 0.6);
        assert_eq!(session.baseline_height, 0.3);
        assert_eq!(session.handle, None);
    }

    #[test]
    fn test_degenerate_baseline_is_rejected() {
        let mut c = crop(0.5, 0.5);
        c.height = 0.0;
        let err = InteractionSession::perspective(&c).unwrap_err();
        assert_eq!(
            err,
            CropError::DegenerateBaseline {
                width: 0.5,
                height: 0.0
            }
        );
    }

    #[test]
    fn test_escalate_only_from_free() {
        let mut free = InteractionSession::free(&crop(0.5, 0.5), CropHandle::Left).unwrap();
        assert!(free.escalate_to_edge());
        assert_eq!(free.mode, SessionMode::Edge);
        assert!(free.is_handle_drag());
        assert!(!free.escalate_to_edge());

        let mut perspective = InteractionSession::perspective(&crop(0.5, 0.5)).unwrap();
        assert!(!perspective.escalate_to_edge());
        assert!(!perspective.is_handle_drag());
    }

    #[test]
    fn test_baseline_rect_uses_locked_aspect() {
        let session = InteractionSession::perspective(&crop(0.8, 0.4)).unwrap();
        let rect = session.baseline_rect(Point::new(0.4, 0.6));
        assert!((rect.width() - 0.8).abs() < 1e-12);
        assert!((rect.height() - 0.4).abs() < 1e-12);
        assert!((rect.center().x - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_transpose_swaps_baseline() {
        let mut session = InteractionSession::perspective(&crop(0.6, 0.3)).unwrap();
        session.transpose();
        assert_eq!(session.baseline_width, 0.3);
        assert_eq!(session.baseline_height, 0.6);
        assert!((session.locked_aspect_ratio - 0.5).abs() < 1e-12);

        let rect = session.baseline_rect(Point::new(0.5, 0.5));
        assert!((rect.width() - 0.3).abs() < 1e-12);
        assert!((rect.height() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_state_from_session() {
        assert_eq!(InteractionState::from(None), InteractionState::Idle);
        let session = InteractionSession::perspective(&crop(0.5, 0.5)).unwrap();
        assert_eq!(
            InteractionState::from(Some(&session)),
            InteractionState::DraggingPerspective
        );
    }
}
