//! Undo history for the label mask.
//!
//! Each polygon commit pushes a full copy of the mask as it was before the
//! commit. Undo pops the most recent copy and the caller swaps it in.

use std::collections::VecDeque;

use image::GrayImage;

#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: VecDeque<GrayImage>,
    /// Maximum number of snapshots kept; `None` grows without bound
    max_depth: Option<usize>,
}

impl History {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            snapshots: VecDeque::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, snapshot: GrayImage) {
        self.snapshots.push_back(snapshot);
        if let Some(max) = self.max_depth {
            while self.snapshots.len() > max {
                self.snapshots.pop_front();
            }
        }
        log::debug!("History: pushed snapshot ({} stored)", self.snapshots.len());
    }

    pub fn pop(&mut self) -> Option<GrayImage> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
