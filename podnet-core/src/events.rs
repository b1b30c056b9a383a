//! Sandbox network lifecycle events with structured tracing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::SandboxId;

/// Events emitted while attaching or detaching a sandbox network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// Attach is about to be issued
    AttachStarted {
        /// Sandbox ID
        id: SandboxId,
        /// Network namespace path
        netns: PathBuf,
        /// Number of option entries handed to the manager
        options: usize,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Network attached
    Attached {
        /// Sandbox ID
        id: SandboxId,
        /// Interfaces reported by the manager
        interfaces: Vec<String>,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Network detached
    Detached {
        /// Sandbox ID
        id: SandboxId,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Attach or detach failed
    Failed {
        /// Sandbox ID
        id: SandboxId,
        /// Operation that failed
        operation: String,
        /// Error message
        message: String,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },
}

impl NetworkEvent {
    /// Get the sandbox ID from any event
    #[must_use]
    pub const fn sandbox_id(&self) -> &SandboxId {
        match self {
            Self::AttachStarted { id, .. }
            | Self::Attached { id, .. }
            | Self::Detached { id, .. }
            | Self::Failed { id, .. } => id,
        }
    }

    /// Get the timestamp from any event
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        match self {
            Self::AttachStarted { timestamp, .. }
            | Self::Attached { timestamp, .. }
            | Self::Detached { timestamp, .. }
            | Self::Failed { timestamp, .. } => *timestamp,
        }
    }

    /// Check if this is a failure event
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Emit structured tracing event
    pub fn emit_trace(&self) {
        match self {
            Self::AttachStarted {
                id, netns, options, ..
            } => {
                tracing::info!(
                    sandbox_id = %id,
                    netns = %netns.display(),
                    options,
                    event = "attach_started",
                    "Attaching sandbox network"
                );
            }
            Self::Attached { id, interfaces, .. } => {
                tracing::info!(
                    sandbox_id = %id,
                    interfaces = ?interfaces,
                    event = "attached",
                    "Sandbox network attached"
                );
            }
            Self::Detached { id, .. } => {
                tracing::info!(
                    sandbox_id = %id,
                    event = "detached",
                    "Sandbox network detached"
                );
            }
            Self::Failed {
                id,
                operation,
                message,
                ..
            } => {
                tracing::error!(
                    sandbox_id = %id,
                    operation = %operation,
                    message = %message,
                    event = "failed",
                    "Sandbox network operation failed"
                );
            }
        }
    }
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttachStarted { id, netns, .. } => {
                write!(f, "Sandbox {id} attaching to {}", netns.display())
            }
            Self::Attached { id, interfaces, .. } => {
                write!(f, "Sandbox {id} attached ({})", interfaces.join(", "))
            }
            Self::Detached { id, .. } => write!(f, "Sandbox {id} detached"),
            Self::Failed {
                id,
                operation,
                message,
                ..
            } => write!(f, "Sandbox {id} {operation} failed: {message}"),
        }
    }
}

// Seconds since the epoch
mod systemtime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(since_epoch.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_event_sandbox_id() {
        let id = SandboxId::new("sandbox").unwrap();
        let event = NetworkEvent::Detached {
            id: id.clone(),
            timestamp: SystemTime::now(),
        };

        assert_eq!(event.sandbox_id(), &id);
        assert!(!event.is_failure());
    }

    #[test]
    fn test_event_display() {
        let event = NetworkEvent::Failed {
            id: SandboxId::new("sandbox").unwrap(),
            operation: "attach".to_string(),
            message: "plugin failed".to_string(),
            timestamp: SystemTime::now(),
        };

        assert!(event.is_failure());
        assert_eq!(event.to_string(), "Sandbox sandbox attach failed: plugin failed");
    }

    #[test]
    fn test_event_serde() {
        let event = NetworkEvent::Attached {
            id: SandboxId::new("sandbox").unwrap(),
            interfaces: vec!["lo".to_string(), "eth0".to_string()],
            timestamp: SystemTime::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"attached\""));

        let deserialized: NetworkEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.sandbox_id(), deserialized.sandbox_id());
    }

    #[test]
    fn test_timestamp_keeps_whole_seconds() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_750);
        let event = NetworkEvent::AttachStarted {
            id: SandboxId::new("sandbox").unwrap(),
            netns: PathBuf::from("/var/run/netns/test"),
            options: 5,
            timestamp: at,
        };
        assert_eq!(event.timestamp(), at);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000);

        let deserialized: NetworkEvent = serde_json::from_value(json).unwrap();
        assert_eq!(
            deserialized.timestamp(),
            UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
    }
}
