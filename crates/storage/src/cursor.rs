//! Forward and reverse record cursors
//!
//! A cursor is a lazy, seekable walk over a store's records in key order
//! (ascending for [`ForwardCursor`], descending for [`ReverseCursor`]).
//!
//! # Save/restore
//!
//! Callers may release their lock between [`SeekableRecordCursor::save`] and
//! [`SeekableRecordCursor::restore`]; anything can happen to the mapping in
//! between, including capped eviction and truncate. A cursor therefore
//! never holds a structural position into the mapping. It remembers only
//! the id it last returned and re-seeks by value on every step.
//!
//! On restore, a forward cursor lands on the smallest id `>=` the saved id
//! and a reverse cursor on the largest id `<=` it. If the saved record is
//! gone, the landing record is returned by the next `next()` call instead
//! of being skipped. Capped stores refuse to resume past lost records:
//! restore reports failure and the cursor must be discarded.

use std::ops::Bound;

use recstore_core::{Record, RecordData, RecordId};
use tracing::debug;

use crate::state::{SharedState, StoreData};

/// Seekable cursor contract used by the query layer
pub trait SeekableRecordCursor: Send {
    /// Advance and return the next record, or `None` at end of sequence
    ///
    /// The first call positions the cursor at the start of the sequence.
    fn next(&mut self) -> Option<Record>;

    /// Position exactly at `id`
    ///
    /// Returns `None` if no such record exists; the cursor is then
    /// unpositioned and the following `next()` returns `None`.
    fn seek_exact(&mut self, id: RecordId) -> Option<Record>;

    /// Remember the current position as the restore point
    fn save(&mut self);

    /// Set the restore point to "unpositioned"; restore then yields end of sequence
    fn save_unpositioned(&mut self);

    /// Re-resolve the position from the restore point
    ///
    /// Returns `false` if the cursor is dead and must be discarded.
    fn restore(&mut self) -> bool;

    /// Detach from the caller's execution context. Nothing is context-bound here.
    fn detach_from_context(&mut self) {}

    /// Reattach to the caller's execution context.
    fn reattach_to_context(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// `next()` has not been called yet
    NeedFirstSeek,
    /// At the record with this id
    At(RecordId),
    /// After a failed `seek_exact`
    Unpositioned,
    /// Past the last record
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavedPosition {
    Unpositioned,
    At(RecordId),
}

/// Direction-agnostic cursor state machine
#[derive(Debug)]
struct CursorCore {
    state: SharedState,
    is_capped: bool,
    direction: Direction,
    position: Position,
    /// The last restore landed on a different id than the saved one;
    /// the next `next()` returns that id instead of stepping past it.
    last_move_was_restore: bool,
    saved: SavedPosition,
}

impl CursorCore {
    fn new(state: SharedState, is_capped: bool, direction: Direction) -> Self {
        CursorCore {
            state,
            is_capped,
            direction,
            position: Position::NeedFirstSeek,
            last_move_was_restore: false,
            saved: SavedPosition::Unpositioned,
        }
    }

    /// First record of the sequence
    fn first<'a>(&self, data: &'a StoreData) -> Option<(&'a RecordId, &'a RecordData)> {
        match self.direction {
            Direction::Forward => data.records.iter().next(),
            Direction::Reverse => data.records.iter().next_back(),
        }
    }

    /// First record at or beyond `from` in cursor direction
    fn seek_from<'a>(
        &self,
        data: &'a StoreData,
        from: RecordId,
        inclusive: bool,
    ) -> Option<(&'a RecordId, &'a RecordData)> {
        let bound = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        match self.direction {
            Direction::Forward => data.records.range((bound, Bound::Unbounded)).next(),
            Direction::Reverse => data.records.range((Bound::Unbounded, bound)).next_back(),
        }
    }

    fn next(&mut self) -> Option<Record> {
        let data = self.state.read();
        let found = match self.position {
            Position::NeedFirstSeek => self.first(&data),
            Position::At(id) => self.seek_from(&data, id, self.last_move_was_restore),
            Position::Unpositioned | Position::Eof => None,
        };
        self.last_move_was_restore = false;

        match found {
            Some((id, record)) => {
                self.position = Position::At(*id);
                Some(Record::new(*id, record.clone()))
            }
            None => {
                self.position = Position::Eof;
                None
            }
        }
    }

    fn seek_exact(&mut self, id: RecordId) -> Option<Record> {
        self.last_move_was_restore = false;
        let data = self.state.read();
        match data.records.get(&id) {
            Some(record) => {
                self.position = Position::At(id);
                Some(Record::new(id, record.clone()))
            }
            None => {
                self.position = Position::Unpositioned;
                None
            }
        }
    }

    fn save(&mut self) {
        // Saving again right after a restore keeps the original restore point.
        if self.last_move_was_restore {
            return;
        }
        match self.position {
            Position::NeedFirstSeek => {}
            Position::At(id) => self.saved = SavedPosition::At(id),
            Position::Unpositioned | Position::Eof => self.saved = SavedPosition::Unpositioned,
        }
    }

    fn save_unpositioned(&mut self) {
        self.saved = SavedPosition::Unpositioned;
    }

    fn restore(&mut self) -> bool {
        if self.position == Position::NeedFirstSeek {
            return true;
        }

        let saved = match self.saved {
            SavedPosition::Unpositioned => {
                self.position = Position::Eof;
                return true;
            }
            SavedPosition::At(id) => id,
        };

        let data = self.state.read();
        let landed = self.seek_from(&data, saved, true).map(|(id, _)| *id);
        self.last_move_was_restore = landed != Some(saved);
        self.position = landed.map_or(Position::Eof, Position::At);

        if self.last_move_was_restore {
            debug!(
                target: "recstore::cursor",
                saved = %saved,
                landed = ?landed,
                capped = self.is_capped,
                "Saved record vanished while cursor was suspended"
            );
        }

        // Capped cursors die on invalidation rather than advancing.
        !(self.is_capped && self.last_move_was_restore)
    }
}

/// Ascending cursor
#[derive(Debug)]
pub struct ForwardCursor {
    core: CursorCore,
}

impl ForwardCursor {
    pub(crate) fn new(state: SharedState, is_capped: bool) -> Self {
        ForwardCursor {
            core: CursorCore::new(state, is_capped, Direction::Forward),
        }
    }
}

impl SeekableRecordCursor for ForwardCursor {
    fn next(&mut self) -> Option<Record> {
        self.core.next()
    }

    fn seek_exact(&mut self, id: RecordId) -> Option<Record> {
        self.core.seek_exact(id)
    }

    fn save(&mut self) {
        self.core.save()
    }

    fn save_unpositioned(&mut self) {
        self.core.save_unpositioned()
    }

    fn restore(&mut self) -> bool {
        self.core.restore()
    }
}

/// Descending cursor
#[derive(Debug)]
pub struct ReverseCursor {
    core: CursorCore,
}

impl ReverseCursor {
    pub(crate) fn new(state: SharedState, is_capped: bool) -> Self {
        ReverseCursor {
            core: CursorCore::new(state, is_capped, Direction::Reverse),
        }
    }
}

impl SeekableRecordCursor for ReverseCursor {
    fn next(&mut self) -> Option<Record> {
        self.core.next()
    }

    fn seek_exact(&mut self, id: RecordId) -> Option<Record> {
        self.core.seek_exact(id)
    }

    fn save(&mut self) {
        self.core.save()
    }

    fn save_unpositioned(&mut self) {
        self.core.save_unpositioned()
    }

    fn restore(&mut self) -> bool {
        self.core.restore()
    }
}
