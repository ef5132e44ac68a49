// Track geometry and the sensor response over it
//
// The track is a square grid of dark lines. Distances are in encoder units (one
// unit of wheel travel per edge). Heading is counter-clockwise from +x.

use crate::config::ADC_MAX;

/// Vehicle pose on the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Pose {
    /// World position of a point given in the vehicle frame
    /// (`forward` along the heading, `left` to its left)
    pub fn transform(&self, forward: f32, left: f32) -> (f32, f32) {
        let (sin, cos) = self.heading.sin_cos();
        (
            self.x + forward * cos - left * sin,
            self.y + forward * sin + left * cos,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    /// Distance between parallel grid lines
    pub spacing: f32,
    /// Width of the sensor response around a line
    pub line_width: f32,
    /// Line sensors sit this far ahead of the axle...
    pub sensor_forward: f32,
    /// ...and this far to either side of the center line
    pub sensor_lateral: f32,
    /// Raw reading over bare floor and over the line center
    pub floor_raw: u16,
    pub line_raw: u16,
    /// Cube centers
    pub cubes: Vec<(f32, f32)>,
    /// Auxiliary sensor sees nothing beyond this distance
    pub aux_max_distance: f32,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            spacing: 1500.0,
            line_width: 20.0,
            sensor_forward: 60.0,
            sensor_lateral: 25.0,
            floor_raw: 120,
            line_raw: 880,
            cubes: Vec::new(),
            aux_max_distance: 400.0,
        }
    }
}

impl Track {
    /// Grid track with cubes beside the starting line at the given x positions
    pub fn with_cubes(positions: &[f32]) -> Self {
        Self {
            cubes: positions.iter().map(|&x| (x, 100.0)).collect(),
            ..Self::default()
        }
    }

    /// Distance from a point to the nearest grid line
    pub fn distance_to_line(&self, x: f32, y: f32) -> f32 {
        let off = |v: f32| {
            let r = v.rem_euclid(self.spacing);
            r.min(self.spacing - r)
        };
        off(x).min(off(y))
    }

    /// Raw reflectance at a point: high over the line, low over the floor
    pub fn line_raw_at(&self, x: f32, y: f32) -> u16 {
        let d = self.distance_to_line(x, y) / self.line_width;
        let darkness = (-d * d).exp();
        let span = f32::from(self.line_raw - self.floor_raw);
        self.floor_raw + (span * darkness) as u16
    }

    /// (right, left) raw line-sensor readings at a pose
    pub fn line_sensors(&self, pose: &Pose) -> (u16, u16) {
        let (rx, ry) = pose.transform(self.sensor_forward, -self.sensor_lateral);
        let (lx, ly) = pose.transform(self.sensor_forward, self.sensor_lateral);
        (self.line_raw_at(rx, ry), self.line_raw_at(lx, ly))
    }

    /// Raw auxiliary reading for the nearest cube. With nothing in view the
    /// sensor reports its maximum distance; it never reads 0, which the scan
    /// would take as a close target.
    ///
    /// Inverts the range estimate so that `sensors::aux_range` reports the
    /// distance in tens of units.
    pub fn aux_raw(&self, pose: &Pose) -> u16 {
        let nearest = self
            .cubes
            .iter()
            .map(|&(cx, cy)| ((cx - pose.x).powi(2) + (cy - pose.y).powi(2)).sqrt())
            .fold(f32::INFINITY, f32::min)
            .min(self.aux_max_distance);
        let range = (nearest / 10.0).max(0.5);
        let raw = (range / 32.0).powf(1.0 / -1.1) * 1024.0 / 5.0;
        raw.clamp(1.0, f32::from(ADC_MAX)) as u16
    }
}
