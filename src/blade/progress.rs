use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;

/// Phases of a slice as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceState {
    Initializing,
    /// Reserved for sources that must be uploaded first. Never emitted today.
    Uploading,
    Queued,
    Slicing,
    Downloading,
    Complete,
    Failed,
}

impl SliceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Uploading => "uploading",
            Self::Queued => "queued",
            Self::Slicing => "slicing",
            Self::Downloading => "downloading",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// True while work is still in flight.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for SliceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives progress updates from a running slice.
#[async_trait]
pub trait Progress: Send + Sync {
    async fn update(&self, state: SliceState, message: &str);
}

/// Discards every update.
pub struct Silent;

#[async_trait]
impl Progress for Silent {
    async fn update(&self, _state: SliceState, _message: &str) {}
}

/// Records every update. Handy for tests and for replaying a run.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<(SliceState, String)>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(SliceState, String)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn states(&self) -> Vec<SliceState> {
        self.events().into_iter().map(|(state, _)| state).collect()
    }
}

#[async_trait]
impl Progress for Recorder {
    async fn update(&self, state: SliceState, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((state, message.to_string()));
        }
    }
}
