//! Play queue
//!
//! Ordered tracks plus a cursor. The cursor is either unset or points into
//! the list, and every mutation re-derives it so it keeps pointing at the
//! same logical track:
//!
//! ```text
//! tracks: [A, B, C, D]      index: Some(2) → C
//! remove(0)  → [B, C, D]    index: Some(1) → C
//! reorder(2, 0) → [D, B, C] index: Some(2) → C
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use trio_core::{RepeatMode, Track};

/// Play queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    /// Tracks in play order
    tracks: Vec<Track>,

    /// Current position, `None` when nothing is selected
    index: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with the cursor at `index` (ignored if out of range)
    pub fn from_tracks(tracks: Vec<Track>, index: Option<usize>) -> Self {
        let mut queue = Self {
            tracks,
            index: None,
        };
        if let Some(index) = index {
            queue.set_index(index);
        }
        queue
    }

    /// All tracks
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track at a position
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current position
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.index.and_then(|i| self.tracks.get(i))
    }

    /// Position of the first track with the given ID
    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track.id)
    }

    /// Move the cursor; out-of-range positions are ignored
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.index = Some(index);
            true
        } else {
            false
        }
    }

    /// Replace all tracks and the cursor
    pub fn replace(&mut self, tracks: Vec<Track>, index: Option<usize>) {
        *self = Self::from_tracks(tracks, index);
    }

    /// Append a track; the cursor does not move
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Remove the track at `index`
    ///
    /// Entries before the cursor shift it down by one. Removing the current
    /// entry leaves the cursor on the following track, or on the new last
    /// entry when the removed one was last. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }

        let removed = self.tracks.remove(index);
        let len = self.tracks.len();

        self.index = match self.index {
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current && current >= len => len.checked_sub(1),
            other => other,
        };

        Some(removed)
    }

    /// Move one entry from `from` to `to`
    ///
    /// `to` is clamped to the last position. The cursor follows the track it
    /// pointed at. Returns false when nothing moved.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.tracks.len();
        if from >= len {
            return false;
        }
        let to = to.min(len - 1);
        if from == to {
            return false;
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if let Some(current) = self.index {
            self.index = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }

        true
    }

    /// Remove every track and unset the cursor
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.index = None;
    }

    /// Position `next` should move to
    ///
    /// With shuffle, any position is picked uniformly, the current one
    /// included. Otherwise the cursor advances by one, wrapping past the end
    /// only with `RepeatMode::All`. `None` means "stay where you are".
    pub fn next_index<R: Rng + ?Sized>(
        &self,
        shuffle: bool,
        repeat: RepeatMode,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        if shuffle {
            return Some(rng.gen_range(0..len));
        }

        match self.index {
            None => Some(0),
            Some(current) if current + 1 < len => Some(current + 1),
            Some(_) if repeat == RepeatMode::All => Some(0),
            Some(_) => None,
        }
    }

    /// Position `previous` should move to
    ///
    /// Always wraps from the first entry to the last, whatever the repeat mode.
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        match self.index {
            Some(current) if current > 0 => Some(current - 1),
            _ => Some(len - 1),
        }
    }
}
