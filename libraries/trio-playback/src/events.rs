//! Engine events
//!
//! Every load is numbered. Events carry that number so consumers can drop
//! events that belong to a source which has since been replaced.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStage {
    /// Output context creation or resume
    Initialization,
    /// Reading, fetching, or decoding a source
    Load,
    /// Reading samples during playback
    Playback,
}

/// Failure payload of `EngineEvent::Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFailure {
    /// Stage that failed
    pub stage: FailureStage,
    /// Load the failure belongs to, if any
    pub load_id: Option<u64>,
    /// Human-readable cause
    pub message: String,
}

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Periodic position update while playing, and after every seek
    Progress {
        load_id: u64,
        position: Duration,
        duration: Duration,
    },

    /// Source reached its natural end
    Ended { load_id: u64 },

    /// A new source started loading
    LoadingStarted { load_id: u64 },

    /// Source is ready to play
    Loaded { load_id: u64, duration: Duration },

    /// Any stage failed
    Error(EngineFailure),
}

impl EngineEvent {
    /// Load the event belongs to
    pub fn load_id(&self) -> Option<u64> {
        match self {
            Self::Progress { load_id, .. }
            | Self::Ended { load_id }
            | Self::LoadingStarted { load_id }
            | Self::Loaded { load_id, .. } => Some(*load_id),
            Self::Error(failure) => failure.load_id,
        }
    }
}
