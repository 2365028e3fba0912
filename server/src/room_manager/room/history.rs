use comms::segment::Segment;

/// Mutations of [BoardHistory] that turned out to be no-ops. The caller is
/// expected to swallow these without broadcasting anything; a client may
/// request an undo or redo based on stale local knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("there is nothing to undo")]
    NothingToUndo,
    #[error("there is nothing to redo")]
    NothingToRedo,
}

/// [BoardHistory] owns the ordered segment log and the undo/redo cursor of a
/// single room. It performs no I/O and never panics; the room decides what
/// to broadcast based on the outcome of each mutation, which keeps the
/// synchronization logic testable without any network in the picture.
///
/// `cursor == None` means an empty visible canvas (`current_index == -1` on
/// the wire). Segments beyond the cursor are retained as redo candidates
/// until the next append discards them.
#[derive(Debug, Default)]
pub struct BoardHistory {
    segments: Vec<Segment>,
    cursor: Option<usize>,
}

impl BoardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently visible segments, i.e. `cursor + 1`.
    fn visible_len(&self) -> usize {
        self.cursor.map_or(0, |cursor| cursor + 1)
    }

    /// Index of the last visible segment, `-1` for an empty canvas.
    pub fn current_index(&self) -> i64 {
        self.cursor.map_or(-1, |cursor| cursor as i64)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment as the new last visible one.
    ///
    /// Any redo candidates beyond the cursor are discarded first: the
    /// history is a single branch, never a tree. A redo requested after this
    /// returns [HistoryError::NothingToRedo].
    pub fn append(&mut self, segment: Segment) {
        self.segments.truncate(self.visible_len());
        self.segments.push(segment);
        self.cursor = Some(self.segments.len() - 1);
    }

    /// Hide the last visible segment. The segment data is retained so a
    /// redo can restore it.
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        match self.cursor {
            None => Err(HistoryError::NothingToUndo),
            Some(0) => {
                self.cursor = None;
                Ok(())
            }
            Some(cursor) => {
                self.cursor = Some(cursor - 1);
                Ok(())
            }
        }
    }

    /// Restore the first hidden segment beyond the cursor.
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        if self.visible_len() >= self.segments.len() {
            return Err(HistoryError::NothingToRedo);
        }

        self.cursor = Some(self.visible_len());
        Ok(())
    }

    /// Reset to an empty history. Not undoable; the log is discarded rather
    /// than tombstoned.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.cursor = None;
    }

    /// The full log (redo candidates included) and the current index, as
    /// sent to clients for a resync. Receivers render only `0..=index`.
    pub fn snapshot(&self) -> (Vec<Segment>, i64) {
        (self.segments.clone(), self.current_index())
    }
}
