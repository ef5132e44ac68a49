// Mission plan: a fixed list of maneuvers run in order
//
// Plans are JSON, one externally tagged object per step, e.g.
// {"steps": [{"calibrate": {"target_degrees": 400, "spin": "right"}}, "brake"]}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actuator::{self, ServoId, Servos};
use crate::calibration::CalibrationReport;
use crate::error::{self, MissionError};
use crate::hal::{Board, ServoOutput};
use crate::maneuver::{ManeuverSequencer, Rotation};

fn default_scan() -> bool {
    true
}

fn default_step_delay_ms() -> u64 {
    15
}

/// One maneuver of a mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Calibrate {
        target_degrees: i64,
        spin: Rotation,
    },
    LineFollowCross {
        speed: i32,
        count: u32,
        #[serde(default = "default_scan")]
        scan: bool,
    },
    LineFollowDistance {
        speed: i32,
        degrees: i64,
    },
    Turn {
        side: Rotation,
    },
    Arc {
        speed: i32,
        degrees: i64,
    },
    Brake,
    Pause {
        millis: u64,
    },
    ServoSweep {
        servo: ServoId,
        angle: u8,
        #[serde(default = "default_step_delay_ms")]
        step_delay_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub steps: Vec<Step>,
}

impl Mission {
    pub fn from_json(json: &str) -> Result<Self, MissionError> {
        let mission: Mission = serde_json::from_str(json)?;
        if mission.steps.is_empty() {
            return Err(MissionError::Empty);
        }
        Ok(mission)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let path = path.as_ref();
        info!("Loading mission from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Calibrate, count two crosses while scanning, turn right, one more cross,
    /// a short encoder run, then lower the arm
    pub fn default_run() -> Self {
        Self {
            steps: vec![
                Step::Calibrate {
                    target_degrees: 400,
                    spin: Rotation::Right,
                },
                Step::LineFollowCross {
                    speed: 150,
                    count: 2,
                    scan: true,
                },
                Step::Turn {
                    side: Rotation::Right,
                },
                Step::LineFollowCross {
                    speed: 120,
                    count: 1,
                    scan: false,
                },
                Step::LineFollowDistance {
                    speed: 100,
                    degrees: 300,
                },
                Step::ServoSweep {
                    servo: ServoId::A,
                    angle: 120,
                    step_delay_ms: default_step_delay_ms(),
                },
                Step::Brake,
            ],
        }
    }
}

/// What a finished mission went through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionReport {
    pub steps: usize,
    pub crosses: u32,
    pub cubes: u32,
    pub calibration: Option<CalibrationReport>,
}

/// Run every step in order on the control thread. Stops at the first error.
pub fn execute<B, S>(
    seq: &mut ManeuverSequencer<B>,
    servos: &mut Servos<S>,
    mission: &Mission,
) -> error::Result<MissionReport>
where
    B: Board,
    S: ServoOutput,
{
    let mut report = MissionReport::default();
    let total = mission.steps.len();

    for (i, step) in mission.steps.iter().enumerate() {
        info!("Step {}/{}: {:?}", i + 1, total, step);
        match *step {
            Step::Calibrate {
                target_degrees,
                spin,
            } => {
                report.calibration = Some(seq.calibrate(target_degrees, spin)?);
            }
            Step::LineFollowCross { speed, count, scan } => {
                let summary = seq.line_follow_cross(speed, count, scan)?;
                report.crosses += summary.crosses;
                report.cubes += summary.cubes;
            }
            Step::LineFollowDistance { speed, degrees } => seq.line_follow_distance(speed, degrees)?,
            Step::Turn { side } => seq.turn(side)?,
            Step::Arc { speed, degrees } => seq.arc(speed, degrees)?,
            Step::Brake => seq.brake(),
            Step::Pause { millis } => seq.pause(Duration::from_millis(millis)),
            Step::ServoSweep {
                servo,
                angle,
                step_delay_ms,
            } => {
                actuator::sweep(
                    servos.get_mut(servo),
                    seq.board(),
                    angle,
                    Duration::from_millis(step_delay_ms),
                );
            }
        }
        report.steps += 1;
    }

    info!(
        "Mission done: {} steps, {} crosses, {} cubes",
        report.steps, report.crosses, report.cubes
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PIN_ROLES;
    use crate::fakes::{FakeBoard, FakeServo};
    use crate::maneuver::{ManeuverState, SequencerConfig};

    #[test]
    fn test_parse_mission() {
        let json = r#"{
            "steps": [
                {"calibrate": {"target_degrees": 400, "spin": "left"}},
                {"line_follow_cross": {"speed": 150, "count": 2}},
                {"turn": {"side": "right"}},
                {"arc": {"speed": 80, "degrees": 500}},
                "brake",
                {"pause": {"millis": 250}},
                {"servo_sweep": {"servo": "b", "angle": 30}}
            ]
        }"#;
        let mission = Mission::from_json(json).unwrap();

        assert_eq!(mission.steps.len(), 7);
        assert_eq!(
            mission.steps[0],
            Step::Calibrate {
                target_degrees: 400,
                spin: Rotation::Left
            }
        );
        // Scanning is on unless switched off
        assert_eq!(
            mission.steps[1],
            Step::LineFollowCross {
                speed: 150,
                count: 2,
                scan: true
            }
        );
        assert_eq!(mission.steps[4], Step::Brake);
        assert_eq!(
            mission.steps[6],
            Step::ServoSweep {
                servo: ServoId::B,
                angle: 30,
                step_delay_ms: 15
            }
        );
    }

    #[test]
    fn test_empty_mission_rejected() {
        assert!(matches!(
            Mission::from_json(r#"{"steps": []}"#),
            Err(MissionError::Empty)
        ));
    }

    #[test]
    fn test_unknown_step_rejected() {
        let result = Mission::from_json(r#"{"steps": [{"fly": {"height": 3}}]}"#);
        assert!(matches!(result, Err(MissionError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Mission::load("/nonexistent/linebot/mission.json");
        assert!(matches!(result, Err(MissionError::Io(_))));
    }

    #[test]
    fn test_default_run_serializes() {
        let mission = Mission::default_run();
        let json = serde_json::to_string(&mission).unwrap();
        assert_eq!(Mission::from_json(&json).unwrap(), mission);
    }

    #[test]
    fn test_execute_runs_steps_in_order() {
        let board = FakeBoard::new();
        // Both sensors over a marker from the start
        board.inputs.set(PIN_ROLES.right_line, 1000);
        board.inputs.set(PIN_ROLES.left_line, 1000);
        let odometry = board.odometry();
        let delays = board.log();
        let mut seq = ManeuverSequencer::new(board, odometry, SequencerConfig::default());
        let mut servos = Servos {
            a: FakeServo::at(90),
            b: FakeServo::at(0),
        };

        let mission = Mission {
            steps: vec![
                Step::LineFollowCross {
                    speed: 120,
                    count: 2,
                    scan: false,
                },
                Step::Pause { millis: 40 },
                Step::ServoSweep {
                    servo: ServoId::B,
                    angle: 3,
                    step_delay_ms: 1,
                },
                Step::Arc {
                    speed: 90,
                    degrees: 50,
                },
            ],
        };
        let report = execute(&mut seq, &mut servos, &mission).unwrap();

        assert_eq!(report.steps, 4);
        assert_eq!(report.crosses, 2);
        assert_eq!(report.cubes, 0);
        assert!(report.calibration.is_none());
        assert_eq!(servos.b.writes, vec![1, 2, 3]);
        assert_eq!(servos.a.writes, Vec::<u8>::new());
        assert_eq!(delays.delays()[0], Duration::from_millis(40));
        assert_eq!(seq.state(), ManeuverState::Stopped);
    }
}
