// Mission runtime: simulated plant on the async executor, control core on a
// blocking thread
//
// The control core busy-waits, so it never runs on an executor worker. The plant
// steps on a tokio interval and a watcher task logs every maneuver transition.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task;
use tracing::{info, warn};

use crate::config::DEFAULT_TIME_LIMIT;
use crate::error::RuntimeError;
use crate::maneuver::{ManeuverSequencer, SequencerConfig};
use crate::mission::{self, Mission, MissionReport};
use crate::odometry::Odometry;
use crate::sim::{Plant, Track};

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Mission file; the built-in run when absent
    pub mission: Option<PathBuf>,
    pub strict_calibration: bool,
    pub wait_timeout: Option<Duration>,
    /// Wall-clock budget for the whole mission
    pub time_limit: Duration,
    /// Cube positions along the starting line
    pub cubes: Vec<f32>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            mission: None,
            strict_calibration: false,
            wait_timeout: None,
            time_limit: DEFAULT_TIME_LIMIT,
            cubes: Vec::new(),
        }
    }
}

pub async fn run(options: RuntimeOptions) -> Result<MissionReport, RuntimeError> {
    let mission = match &options.mission {
        Some(path) => Mission::load(path)?,
        None => {
            info!("No mission file given, using the built-in run");
            Mission::default_run()
        }
    };

    let odometry = Odometry::new();
    let plant = Plant::new(odometry.clone(), Track::with_cubes(&options.cubes));
    let plant_task = tokio::spawn(plant.clone().run());

    let config = SequencerConfig {
        wait_timeout: options.wait_timeout,
        strict_calibration: options.strict_calibration,
    };
    let mut seq = ManeuverSequencer::new(plant.board(), odometry, config);
    let mut servos = plant.servos();

    let mut states = seq.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            info!("Maneuver: {:?}", state);
        }
    });

    info!(
        "Runtime started: {} steps, {:?} time limit, wait timeout {:?}",
        mission.steps.len(),
        options.time_limit,
        options.wait_timeout
    );

    let control = task::spawn_blocking(move || mission::execute(&mut seq, &mut servos, &mission));
    let outcome = tokio::time::timeout(options.time_limit, control).await;

    plant_task.abort();
    let result = match outcome {
        Ok(joined) => Ok(joined??),
        Err(_) => {
            // The blocking thread cannot be cancelled; cutting the plant leaves
            // it polling a vehicle that no longer moves
            warn!("Mission exceeded {:?}", options.time_limit);
            Err(RuntimeError::TimeLimit(options.time_limit))
        }
    };
    watcher.abort();

    if let Ok(report) = &result {
        let pose = plant.pose();
        info!(
            "Final pose ({:.0}, {:.0}), heading {:.2} rad",
            pose.x, pose.y, pose.heading
        );
        if let Some(calibration) = &report.calibration {
            info!("Calibration: {:?}", calibration.calibration);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_mission_file() {
        let options = RuntimeOptions {
            mission: Some(PathBuf::from("/nonexistent/linebot/mission.json")),
            ..RuntimeOptions::default()
        };
        let result = run(options).await;
        assert!(matches!(result, Err(RuntimeError::Mission(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_short_mission_completes() {
        let path = std::env::temp_dir().join(format!("linebot-mission-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"steps": [{"pause": {"millis": 20}}, {"servo_sweep": {"servo": "a", "angle": 92, "step_delay_ms": 1}}, "brake"]}"#,
        )
        .unwrap();

        let options = RuntimeOptions {
            mission: Some(path.clone()),
            time_limit: Duration::from_secs(10),
            ..RuntimeOptions::default()
        };
        let report = run(options).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.steps, 3);
        assert_eq!(report.crosses, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_time_limit_reported() {
        let path = std::env::temp_dir().join(format!("linebot-slow-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"steps": [{"pause": {"millis": 2000}}]}"#).unwrap();

        let options = RuntimeOptions {
            mission: Some(path.clone()),
            time_limit: Duration::from_millis(100),
            ..RuntimeOptions::default()
        };
        let result = run(options).await;
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(RuntimeError::TimeLimit(_))));
    }
}
