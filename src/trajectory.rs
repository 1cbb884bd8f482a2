use itertools::Itertools;
use log::debug;
use uom::si::f64::{Length, Time};
use uom::si::length::meter;
use uom::si::time::second;

use crate::errors::EgoPlotError;
use crate::scenario::{Scenario, Track};

/// Track states are sampled at 10Hz
pub const SAMPLES_PER_SECOND: u64 = 10;

/// Represents a 2D coordinate point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Bounding box for coordinate calculations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, point: Point2D) {
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Valid positions of the ego vehicle, in stored order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct EgoTrajectory {
    points: Vec<Point2D>,
    start: Point2D,
    end: Point2D,
}

impl EgoTrajectory {
    /// Returns `None` for an empty point list
    pub fn from_points(points: Vec<Point2D>) -> Option<Self> {
        let start = *points.first()?;
        let end = *points.last()?;
        Some(Self { points, start, end })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First valid sample
    pub fn start(&self) -> Point2D {
        self.start
    }

    /// Last valid sample
    pub fn end(&self) -> Point2D {
        self.end
    }

    /// Duration covered by the valid samples, in tenths of a second
    pub fn duration_tenths(&self) -> u64 {
        self.points.len() as u64 * 10 / SAMPLES_PER_SECOND
    }

    pub fn duration(&self) -> Time {
        Time::new::<second>(self.points.len() as f64 / SAMPLES_PER_SECOND as f64)
    }

    pub fn duration_label(&self) -> String {
        duration_label(self.points.len())
    }

    /// Distance travelled along the path
    pub fn path_length(&self) -> Length {
        let meters: f64 = self
            .points
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum();
        Length::new::<meter>(meters)
    }

    pub fn bounds(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for point in &self.points {
            bbox.update(*point);
        }
        bbox
    }
}

/// Duration in seconds with one decimal for `samples` states at 10Hz,
/// computed in integer tenths so 37 samples print as exactly "3.7"
pub fn duration_label(samples: usize) -> String {
    let tenths = samples as u64 * 10 / SAMPLES_PER_SECOND;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Result of collecting the valid states of a track
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Path(EgoTrajectory),
    /// The track has no valid state
    Empty,
}

impl Extraction {
    pub fn from_track(track: &Track) -> Self {
        let points: Vec<Point2D> = track
            .valid_states()
            .map(|state| Point2D::new(state.center_x, state.center_y))
            .collect();
        debug!(
            "Track {} has {} valid states out of {}",
            track.id,
            points.len(),
            track.states.len()
        );
        match EgoTrajectory::from_points(points) {
            Some(trajectory) => Extraction::Path(trajectory),
            None => Extraction::Empty,
        }
    }

    /// Number of valid samples, zero when empty
    pub fn valid_count(&self) -> usize {
        match self {
            Extraction::Path(trajectory) => trajectory.len(),
            Extraction::Empty => 0,
        }
    }
}

/// Locate the ego track of `scenario` and collect its valid positions
pub fn extract_ego_trajectory(scenario: &Scenario) -> Result<Extraction, EgoPlotError> {
    let track = scenario.ego_track()?;
    Ok(Extraction::from_track(track))
}
