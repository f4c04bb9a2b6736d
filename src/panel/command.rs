//! Serializable commands over the workspace.
//!
//! Scenario files, the HTTP surface, and scripted runs all funnel through
//! [`Workspace::apply`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::slots::MovePlan;
use super::store::Workspace;
use super::types::{ComponentKind, Pole};
use crate::catalog::DeviceSpec;
use crate::error::PanelError;
use crate::sim::types::TimeSpeed;

/// One command against the active panel (or the panel list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    PlaceBreaker {
        slot: u32,
        pole: Pole,
    },
    ResizeBreaker {
        breaker_id: String,
        rating: u32,
    },
    MoveBreaker {
        breaker_id: String,
        target_slot: u32,
    },
    DeleteBreaker {
        breaker_id: String,
    },
    ToggleBreaker {
        breaker_id: String,
    },
    RenameBreaker {
        breaker_id: String,
        name: String,
    },
    AddRun {
        breaker_id: String,
    },
    AddComponent {
        breaker_id: String,
        run: usize,
        kind: ComponentKind,
    },
    RemoveComponent {
        breaker_id: String,
        run: usize,
        component: usize,
    },
    ToggleSwitch {
        breaker_id: String,
        run: usize,
        component: usize,
    },
    ToggleGround {
        breaker_id: String,
        run: usize,
        component: usize,
    },
    AddDevice {
        breaker_id: String,
        run: usize,
        component: usize,
        device: DeviceSpec,
    },
    ToggleDevice {
        breaker_id: String,
        run: usize,
        component: usize,
        device_uid: String,
    },
    RemoveDevice {
        breaker_id: String,
        run: usize,
        component: usize,
        device_uid: String,
    },
    ToggleMainPower,
    ChangeServiceLimit {
        limit: u32,
    },
    SetTimeSpeed {
        speed: TimeSpeed,
    },
    AddPanel,
    DeletePanel {
        panel_id: String,
    },
    RenamePanel {
        panel_id: String,
        name: String,
    },
    SelectPanel {
        panel_id: String,
    },
}

impl Command {
    /// Snake-case command name, as used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceBreaker { .. } => "place_breaker",
            Self::ResizeBreaker { .. } => "resize_breaker",
            Self::MoveBreaker { .. } => "move_breaker",
            Self::DeleteBreaker { .. } => "delete_breaker",
            Self::ToggleBreaker { .. } => "toggle_breaker",
            Self::RenameBreaker { .. } => "rename_breaker",
            Self::AddRun { .. } => "add_run",
            Self::AddComponent { .. } => "add_component",
            Self::RemoveComponent { .. } => "remove_component",
            Self::ToggleSwitch { .. } => "toggle_switch",
            Self::ToggleGround { .. } => "toggle_ground",
            Self::AddDevice { .. } => "add_device",
            Self::ToggleDevice { .. } => "toggle_device",
            Self::RemoveDevice { .. } => "remove_device",
            Self::ToggleMainPower => "toggle_main_power",
            Self::ChangeServiceLimit { .. } => "change_service_limit",
            Self::SetTimeSpeed { .. } => "set_time_speed",
            Self::AddPanel => "add_panel",
            Self::DeletePanel { .. } => "delete_panel",
            Self::RenamePanel { .. } => "rename_panel",
            Self::SelectPanel { .. } => "select_panel",
        }
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    /// A breaker, component, device, or panel was created with this id.
    Created(String),
    /// A run was appended at this index.
    RunAdded(usize),
    /// New position of a toggled breaker, switch, ground, device, or main.
    Toggled(bool),
    Moved(MovePlan),
}

impl CommandOutcome {
    /// Id of the created entity, if any.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::Created(id) => Some(id),
            _ => None,
        }
    }
}

impl Workspace {
    /// Dispatches a command. Rejections are logged and returned; the
    /// workspace is unchanged when this returns `Err`.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, PanelError> {
        let name = command.name();
        let result = self.dispatch(command);
        match &result {
            Ok(outcome) => debug!(command = name, ?outcome, "command applied"),
            Err(e) => warn!(command = name, reason = %e, "command rejected"),
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, PanelError> {
        use CommandOutcome::{Created, Done, Moved, RunAdded, Toggled};

        Ok(match command {
            Command::PlaceBreaker { slot, pole } => Created(self.place_breaker(slot, pole)?),
            Command::ResizeBreaker { breaker_id, rating } => {
                self.resize_breaker(&breaker_id, rating)?;
                Done
            }
            Command::MoveBreaker {
                breaker_id,
                target_slot,
            } => Moved(self.move_breaker(&breaker_id, target_slot)?),
            Command::DeleteBreaker { breaker_id } => {
                self.delete_breaker(&breaker_id)?;
                Done
            }
            Command::ToggleBreaker { breaker_id } => Toggled(self.toggle_breaker(&breaker_id)?),
            Command::RenameBreaker { breaker_id, name } => {
                self.rename_breaker(&breaker_id, &name)?;
                Done
            }
            Command::AddRun { breaker_id } => RunAdded(self.add_run(&breaker_id)?),
            Command::AddComponent {
                breaker_id,
                run,
                kind,
            } => Created(self.add_component(&breaker_id, run, kind)?),
            Command::RemoveComponent {
                breaker_id,
                run,
                component,
            } => {
                self.remove_component(&breaker_id, run, component)?;
                Done
            }
            Command::ToggleSwitch {
                breaker_id,
                run,
                component,
            } => Toggled(self.toggle_switch(&breaker_id, run, component)?),
            Command::ToggleGround {
                breaker_id,
                run,
                component,
            } => Toggled(self.toggle_ground(&breaker_id, run, component)?),
            Command::AddDevice {
                breaker_id,
                run,
                component,
                device,
            } => Created(self.add_device(&breaker_id, run, component, device)?),
            Command::ToggleDevice {
                breaker_id,
                run,
                component,
                device_uid,
            } => Toggled(self.toggle_device(&breaker_id, run, component, &device_uid)?),
            Command::RemoveDevice {
                breaker_id,
                run,
                component,
                device_uid,
            } => {
                self.remove_device(&breaker_id, run, component, &device_uid)?;
                Done
            }
            Command::ToggleMainPower => Toggled(self.toggle_main_power()),
            Command::ChangeServiceLimit { limit } => {
                self.change_service_limit(limit)?;
                Done
            }
            Command::SetTimeSpeed { speed } => {
                self.set_time_speed(speed);
                Done
            }
            Command::AddPanel => Created(self.add_panel()),
            Command::DeletePanel { panel_id } => {
                self.delete_panel(&panel_id)?;
                Done
            }
            Command::RenamePanel { panel_id, name } => {
                self.rename_panel(&panel_id, &name)?;
                Done
            }
            Command::SelectPanel { panel_id } => {
                self.select_panel(&panel_id)?;
                Done
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::slots::SwapPolicy;
    use crate::panel::types::{Panel, ServiceRating};

    fn workspace() -> Workspace {
        let panel = Panel::new("main".into(), "Main Panel", ServiceRating::Amps200);
        Workspace::new(panel, TimeSpeed::X1, SwapPolicy::default(), 3)
    }

    #[test]
    fn commands_use_snake_case_tags() {
        let json = r#"{"type":"move_breaker","breaker_id":"b1","target_slot":4}"#;
        let cmd: Result<Command, _> = serde_json::from_str(json);
        assert_eq!(
            cmd.ok(),
            Some(Command::MoveBreaker {
                breaker_id: "b1".into(),
                target_slot: 4
            })
        );
        let unit: Result<Command, _> = serde_json::from_str(r#"{"type":"toggle_main_power"}"#);
        assert_eq!(unit.ok(), Some(Command::ToggleMainPower));
    }

    #[test]
    fn tag_matches_name() {
        let cmd = Command::ChangeServiceLimit { limit: 400 };
        let json = serde_json::to_value(&cmd).ok();
        assert_eq!(
            json.as_ref().and_then(|v| v["type"].as_str()),
            Some(cmd.name())
        );
    }

    #[test]
    fn apply_returns_created_ids() {
        let mut ws = workspace();
        let placed = ws.apply(Command::PlaceBreaker {
            slot: 1,
            pole: Pole::Single,
        });
        let id = placed.ok().and_then(|o| o.created_id().map(str::to_string));
        assert!(id.is_some());
        assert_eq!(ws.active_panel().breakers.len(), 1);
    }

    #[test]
    fn rejected_command_is_reported() {
        let mut ws = workspace();
        let before = ws.active_panel().clone();
        let err = ws.apply(Command::MoveBreaker {
            breaker_id: "ghost".into(),
            target_slot: 3,
        });
        assert_eq!(err, Err(PanelError::BreakerNotFound("ghost".into())));
        assert_eq!(ws.active_panel(), &before);
    }

    #[test]
    fn double_pole_commands_at_u32_max_are_rejected() {
        let mut ws = workspace();
        let place = r#"{"type":"place_breaker","slot":4294967295,"pole":"double"}"#;
        let cmd: Result<Command, _> = serde_json::from_str(place);
        assert!(matches!(
            cmd.map(|c| ws.apply(c)),
            Ok(Err(PanelError::SlotOutOfBounds { .. }))
        ));

        let id = ws
            .apply(Command::PlaceBreaker {
                slot: 2,
                pole: Pole::Double,
            })
            .ok()
            .and_then(|o| o.created_id().map(str::to_string))
            .unwrap_or_default();
        let before = ws.active_panel().clone();
        let err = ws.apply(Command::MoveBreaker {
            breaker_id: id,
            target_slot: u32::MAX,
        });
        assert_eq!(err, Err(PanelError::MoveOutOfBounds));
        assert_eq!(ws.active_panel(), &before);
    }

    #[test]
    fn set_time_speed_changes_workspace_speed() {
        let mut ws = workspace();
        let json = r#"{"type":"set_time_speed","speed":50}"#;
        let cmd: Result<Command, _> = serde_json::from_str(json);
        assert!(cmd.is_ok());
        if let Ok(cmd) = cmd {
            assert!(ws.apply(cmd).is_ok());
        }
        assert_eq!(ws.time_speed(), TimeSpeed::X50);
    }
}
