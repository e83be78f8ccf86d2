//! Command state machine
//!
//! Pure bookkeeping for the shutter button, bulb exposures, UI lock and
//! direct-transfer mode. [`CommandState::plan`] validates a command and
//! returns the state to adopt once the device acknowledges it; nothing is
//! mutated when a command is refused.

use std::fmt;

use thiserror::Error;

use eds_api::{CameraCommand, ShutterButton, StatusCommand};

/// Lifecycle of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Open,
    /// The camera reported an internal error; only closing is allowed
    Faulted,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Open => "open",
            SessionState::Faulted => "faulted",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShutterState {
    #[default]
    Idle,
    Halfway,
    Completely,
}

impl fmt::Display for ShutterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutterState::Idle => "idle",
            ShutterState::Halfway => "pressed halfway",
            ShutterState::Completely => "pressed completely",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("session is {0}")]
    SessionNotOpen(SessionState),

    /// Second phase issued without its first phase
    #[error("{command} requires {requires} first")]
    OutOfSequence {
        command: &'static str,
        requires: &'static str,
    },

    /// Command is valid but not in the current device mode
    #[error("{command} is not allowed while {state}")]
    NotAllowed {
        command: &'static str,
        state: String,
    },

    #[error("{param:#x} is not a valid parameter for {command}")]
    InvalidParameter { command: &'static str, param: u32 },
}

/// Everything the command machine tracks for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandState {
    pub session: SessionState,
    pub shutter: ShutterState,
    pub bulb: bool,
    pub ui_locked: bool,
    pub direct_transfer: bool,
}

impl Default for CommandState {
    fn default() -> Self {
        Self {
            session: SessionState::Open,
            shutter: ShutterState::Idle,
            bulb: false,
            ui_locked: false,
            direct_transfer: false,
        }
    }
}

impl CommandState {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_open(&self) -> Result<(), CommandError> {
        match self.session {
            SessionState::Open => Ok(()),
            other => Err(CommandError::SessionNotOpen(other)),
        }
    }

    fn not_allowed(command: CameraCommand, state: impl ToString) -> CommandError {
        CommandError::NotAllowed {
            command: command.name(),
            state: state.to_string(),
        }
    }

    /// State after `command` succeeds, or why it must not be sent
    pub fn plan(&self, command: CameraCommand, param: u32) -> Result<CommandState, CommandError> {
        self.require_open()?;
        let mut next = *self;

        match command {
            CameraCommand::PressShutterButton => {
                let button = ShutterButton::from_wire(param).ok_or(
                    CommandError::InvalidParameter {
                        command: command.name(),
                        param,
                    },
                )?;
                if self.bulb {
                    return Err(Self::not_allowed(command, "a bulb exposure is running"));
                }
                next.shutter = match (self.shutter, button.position()) {
                    (_, ShutterButton::Off) => ShutterState::Idle,
                    (ShutterState::Completely, ShutterButton::Halfway) => {
                        return Err(Self::not_allowed(command, self.shutter));
                    }
                    (_, ShutterButton::Halfway) => ShutterState::Halfway,
                    (_, _) => ShutterState::Completely,
                };
            }
            CameraCommand::TakePicture => {
                if self.bulb {
                    return Err(Self::not_allowed(command, "a bulb exposure is running"));
                }
            }
            CameraCommand::BulbStart => {
                if self.bulb {
                    return Err(Self::not_allowed(command, "a bulb exposure is running"));
                }
                if self.shutter != ShutterState::Idle {
                    return Err(Self::not_allowed(command, self.shutter));
                }
                next.bulb = true;
            }
            CameraCommand::BulbEnd => {
                if !self.bulb {
                    return Err(CommandError::OutOfSequence {
                        command: command.name(),
                        requires: CameraCommand::BulbStart.name(),
                    });
                }
                next.bulb = false;
                next.shutter = ShutterState::Idle;
            }
            _ => {}
        }

        Ok(next)
    }

    /// State after `command` succeeds, or why it must not be sent
    pub fn plan_status(&self, command: StatusCommand) -> Result<CommandState, CommandError> {
        self.require_open()?;
        let mut next = *self;

        match command {
            StatusCommand::UiLock => next.ui_locked = true,
            StatusCommand::UiUnlock => next.ui_locked = false,
            StatusCommand::EnterDirectTransfer => next.direct_transfer = true,
            StatusCommand::ExitDirectTransfer => {
                if !self.direct_transfer {
                    return Err(CommandError::OutOfSequence {
                        command: command.name(),
                        requires: StatusCommand::EnterDirectTransfer.name(),
                    });
                }
                next.direct_transfer = false;
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn press(state: &CommandState, button: ShutterButton) -> Result<CommandState, CommandError> {
        state.plan(CameraCommand::PressShutterButton, button.wire())
    }

    #[rstest]
    #[case(ShutterState::Idle, ShutterButton::Halfway, ShutterState::Halfway)]
    #[case(ShutterState::Idle, ShutterButton::Completely, ShutterState::Completely)]
    #[case(ShutterState::Halfway, ShutterButton::CompletelyNonAf, ShutterState::Completely)]
    #[case(ShutterState::Completely, ShutterButton::Off, ShutterState::Idle)]
    #[case(ShutterState::Halfway, ShutterButton::Off, ShutterState::Idle)]
    #[case(ShutterState::Idle, ShutterButton::Off, ShutterState::Idle)]
    fn test_shutter_transitions(
        #[case] from: ShutterState,
        #[case] button: ShutterButton,
        #[case] to: ShutterState,
    ) {
        let state = CommandState {
            shutter: from,
            ..CommandState::new()
        };
        assert_eq!(press(&state, button).unwrap().shutter, to);
    }

    #[test]
    fn test_halfway_after_completely_is_refused() {
        let state = CommandState {
            shutter: ShutterState::Completely,
            ..CommandState::new()
        };
        assert!(matches!(
            press(&state, ShutterButton::Halfway),
            Err(CommandError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_bulb_sequence() {
        let idle = CommandState::new();
        assert!(matches!(
            idle.plan(CameraCommand::BulbEnd, 0),
            Err(CommandError::OutOfSequence { .. })
        ));

        let exposing = idle.plan(CameraCommand::BulbStart, 0).unwrap();
        assert!(exposing.bulb);
        assert!(exposing.plan(CameraCommand::BulbStart, 0).is_err());
        assert!(exposing.plan(CameraCommand::TakePicture, 0).is_err());
        assert!(press(&exposing, ShutterButton::Completely).is_err());

        let done = exposing.plan(CameraCommand::BulbEnd, 0).unwrap();
        assert!(!done.bulb);
    }

    #[test]
    fn test_unknown_shutter_parameter() {
        let err = CommandState::new()
            .plan(CameraCommand::PressShutterButton, 2)
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidParameter {
                command: "PressShutterButton",
                param: 2
            }
        );
    }

    #[test]
    fn test_faulted_session_refuses_everything() {
        let state = CommandState {
            session: SessionState::Faulted,
            ..CommandState::new()
        };
        assert_eq!(
            state.plan(CameraCommand::ExtendShutDownTimer, 0),
            Err(CommandError::SessionNotOpen(SessionState::Faulted))
        );
        assert!(state.plan_status(StatusCommand::UiLock).is_err());
    }

    #[test]
    fn test_direct_transfer_toggle() {
        let state = CommandState::new();
        assert!(state.plan_status(StatusCommand::ExitDirectTransfer).is_err());
        let entered = state.plan_status(StatusCommand::EnterDirectTransfer).unwrap();
        assert!(entered.direct_transfer);
        assert!(!entered
            .plan_status(StatusCommand::ExitDirectTransfer)
            .unwrap()
            .direct_transfer);
    }
}
