//! Playback request states.

use std::fmt;

/// Where a playback request currently stands.
///
/// ```text
/// Idle -> Queuing -> AwaitingConfirmation -> Playing
///            ^                |
///            +--- Retrying <--+--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Play (or enqueue) command in flight
    Queuing { attempt: u32 },
    /// Polling the device for the requested track
    AwaitingConfirmation { attempt: u32 },
    /// Confirmation window elapsed, about to re-issue the command
    Retrying { attempt: u32 },
    /// Device reported the requested track
    Playing { attempts: u32 },
    Failed { attempts: u32 },
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Queuing { attempt } => write!(f, "queuing (attempt {})", attempt),
            PlaybackState::AwaitingConfirmation { attempt } => {
                write!(f, "awaiting confirmation (attempt {})", attempt)
            }
            PlaybackState::Retrying { attempt } => write!(f, "retrying after attempt {}", attempt),
            PlaybackState::Playing { attempts } => write!(f, "playing after {} attempts", attempts),
            PlaybackState::Failed { attempts } => write!(f, "failed after {} attempts", attempts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            PlaybackState::AwaitingConfirmation { attempt: 2 }.to_string(),
            "awaiting confirmation (attempt 2)"
        );
    }
}
