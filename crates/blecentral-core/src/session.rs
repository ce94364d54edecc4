//! Scan Session State Machine
//!
//! Governs the legal start/stop transitions of scanning. Every accepted trigger
//! produces a [`ScanTransition`] listing the effects the owner must execute, in
//! order, plus an audit entry describing the move. Rejected triggers leave the
//! state untouched.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::errors::ScanError;
use crate::event_bus::{InterruptCause, ScanEvent};
use crate::registry::DiscoveryRegistry;
use crate::types::AdapterState;

// ----------------------------------------------------------------------------
// States, Triggers and Effects
// ----------------------------------------------------------------------------

/// Scanning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "Idle"),
            ScanState::Scanning => write!(f, "Scanning"),
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTrigger {
    /// Caller asked to start; carries the adapter state at that moment
    Start { adapter_state: AdapterState },
    /// Caller asked to stop (or the manager is shutting down)
    Stop,
    /// The adapter reported a new state
    AdapterChanged { state: AdapterState },
    /// The platform reported that the begin issued for `generation` failed
    PlatformFailed { generation: u64, reason: String },
}

impl ScanTrigger {
    fn name(&self) -> &'static str {
        match self {
            ScanTrigger::Start { .. } => "Start",
            ScanTrigger::Stop => "Stop",
            ScanTrigger::AdapterChanged { .. } => "AdapterChanged",
            ScanTrigger::PlatformFailed { .. } => "PlatformFailed",
        }
    }
}

/// Side effects the owner of the controller must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEffect {
    /// Empty the discovery registry
    ClearRegistry,
    /// Instruct the platform to begin scanning for session `generation`
    BeginScan { generation: u64 },
    /// Instruct the platform to end scanning
    EndScan,
    /// Publish an event to subscribers
    Emit(ScanEvent),
}

pub type ScanEffects = SmallVec<[ScanEffect; 4]>;

/// Result of an accepted trigger
#[derive(Debug, Clone)]
pub struct ScanTransition {
    pub new_state: ScanState,
    pub effects: ScanEffects,
    pub audit_entry: AuditEntry,
}

impl ScanTransition {
    /// Whether the trigger changed the state
    pub fn changed_state(&self) -> bool {
        self.audit_entry.from_state != self.audit_entry.to_state
    }
}

/// Audit trail entry for one transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: SystemTime,
    pub generation: u64,
    pub from_state: ScanState,
    pub to_state: ScanState,
    pub trigger: String,
    pub effects_count: usize,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> {} on {} ({} effects)",
            self.generation, self.from_state, self.to_state, self.trigger, self.effects_count
        )
    }
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// Idle/Scanning state machine
#[derive(Debug, Default)]
pub struct ScanSessionController {
    state: ScanState,
    generation: u64,
}

impl ScanSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    /// Generation of the current or most recent session (0 before the first start)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a trigger, returning the effects to execute
    pub fn transition(&mut self, trigger: ScanTrigger) -> Result<ScanTransition, ScanError> {
        let from_state = self.state;
        let trigger_name = trigger.name();

        let (new_state, effects): (ScanState, ScanEffects) = match (self.state, trigger) {
            (_, ScanTrigger::Start { adapter_state }) if !adapter_state.is_powered_on() => {
                return Err(ScanError::AdapterNotReady {
                    current_state: adapter_state,
                });
            }
            (ScanState::Scanning, ScanTrigger::Start { .. }) => {
                return Err(ScanError::AlreadyScanning);
            }
            (ScanState::Idle, ScanTrigger::Start { .. }) => {
                self.generation += 1;
                let effects = smallvec![
                    ScanEffect::ClearRegistry,
                    ScanEffect::BeginScan {
                        generation: self.generation,
                    },
                    ScanEffect::Emit(ScanEvent::ScanStarted {
                        generation: self.generation,
                    }),
                ];
                (ScanState::Scanning, effects)
            }

            (ScanState::Scanning, ScanTrigger::Stop) => {
                let effects = smallvec![
                    ScanEffect::EndScan,
                    ScanEffect::Emit(ScanEvent::ScanStopped {
                        generation: self.generation,
                    }),
                ];
                (ScanState::Idle, effects)
            }

            (ScanState::Scanning, ScanTrigger::AdapterChanged { state })
                if !state.is_powered_on() =>
            {
                (
                    ScanState::Idle,
                    self.interrupt(InterruptCause::AdapterDegraded(state)),
                )
            }

            (ScanState::Scanning, ScanTrigger::PlatformFailed { generation, reason })
                if generation == self.generation =>
            {
                (
                    ScanState::Idle,
                    self.interrupt(InterruptCause::PlatformFailure(reason)),
                )
            }

            // Stop while idle, adapter reports that leave scanning unaffected, and
            // failures belonging to a session that already ended
            (state, _) => (state, SmallVec::new()),
        };

        self.state = new_state;
        let audit_entry = AuditEntry {
            timestamp: SystemTime::now(),
            generation: self.generation,
            from_state,
            to_state: new_state,
            trigger: trigger_name.to_string(),
            effects_count: effects.len(),
        };

        Ok(ScanTransition {
            new_state,
            effects,
            audit_entry,
        })
    }

    fn interrupt(&self, cause: InterruptCause) -> ScanEffects {
        smallvec![
            ScanEffect::EndScan,
            ScanEffect::Emit(ScanEvent::ScanInterrupted {
                generation: self.generation,
                cause,
            }),
        ]
    }
}

// ----------------------------------------------------------------------------
// Scan Session
// ----------------------------------------------------------------------------

/// How the most recent session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEnd {
    Stopped,
    Interrupted(InterruptCause),
}

/// The most recent scan session and the devices it found
///
/// The registry survives a stop so results stay inspectable, and is cleared
/// when the next session starts.
#[derive(Debug, Default)]
pub struct ScanSession {
    pub(crate) registry: DiscoveryRegistry,
    pub(crate) end: Option<SessionEnd>,
}

impl ScanSession {
    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    pub fn end(&self) -> Option<&SessionEnd> {
        self.end.as_ref()
    }
}

/// Point-in-time description of the scan session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub generation: u64,
    pub active: bool,
    pub device_count: usize,
    pub end: Option<SessionEnd>,
}
