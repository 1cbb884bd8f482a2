// Trajectory plot rendering
// Turns an ego trajectory into a standalone SVG figure

pub mod svg_generator;

use serde::{Deserialize, Serialize};

pub use svg_generator::TrajectoryPlotter;

/// Configuration for trajectory figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Canvas dimensions (width, height) in pixels
    pub canvas_size: (u32, u32),
    /// Stroke width for the trajectory line
    pub stroke_width: f32,
    /// Radius of the start and end markers
    pub marker_radius: f32,
    /// Padding around the data as a fraction of its extent
    pub margin_percentage: f32,
    pub show_grid: bool,
    pub show_legend: bool,
    pub path_color: String,
    pub start_color: String,
    pub end_color: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            // 6x6 inch figure at 100 dpi
            canvas_size: (600, 600),
            stroke_width: 2.0,
            marker_radius: 5.0,
            margin_percentage: 0.05,
            show_grid: true,
            show_legend: true,
            path_color: "blue".to_string(),
            start_color: "green".to_string(),
            end_color: "red".to_string(),
        }
    }
}

/// Scenario level data shown in the figure title
#[derive(Debug, Clone, Copy)]
pub struct PlotMeta<'a> {
    pub scenario_id: &'a str,
    pub agent_count: usize,
}
