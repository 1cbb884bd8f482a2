// SVG figure generator for ego vehicle trajectories

use std::fmt::Write;

use log::debug;

use super::{PlotConfig, PlotMeta};
use crate::errors::EgoPlotError;
use crate::trajectory::{EgoTrajectory, Point2D};

pub const X_LABEL: &str = "Global X (m)";
pub const Y_LABEL: &str = "Global Y (m)";

// Space reserved around the axes for title, tick labels and axis labels
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 60.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;

// Smallest data span drawn, so that a single point or a straight line still
// gets a usable scale
const MIN_SPAN_M: f64 = 1.0;
const TARGET_TICKS: f64 = 6.0;
const MAX_TICKS: usize = 50;

/// Generator for SVG trajectory figures
pub struct TrajectoryPlotter {
    config: PlotConfig,
}

/// Maps data coordinates to canvas coordinates with a single scale for
/// both axes, so the figure keeps an equal aspect ratio
#[derive(Debug, Clone, Copy)]
struct Viewport {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    scale: f64,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Viewport {
    fn to_canvas(&self, point: Point2D) -> Point2D {
        Point2D::new(
            self.left + (point.x - self.min_x) * self.scale,
            self.top + (self.max_y - point.y) * self.scale,
        )
    }
}

impl TrajectoryPlotter {
    pub fn new() -> Self {
        Self {
            config: PlotConfig::default(),
        }
    }

    pub fn with_config(config: PlotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Render the trajectory as an SVG document.
    ///
    /// The path is drawn in stored order with markers on its first and last
    /// point. The title carries the scenario id and the number of agents.
    pub fn render(
        &self,
        trajectory: &EgoTrajectory,
        meta: &PlotMeta<'_>,
    ) -> Result<String, EgoPlotError> {
        self.validate_config()?;
        if let Some((index, point)) = trajectory
            .points()
            .iter()
            .enumerate()
            .find(|(_, p)| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(EgoPlotError::PlotRenderError {
                reason: format!(
                    "Point {} has non-finite coordinates: ({}, {})",
                    index, point.x, point.y
                ),
            });
        }

        let viewport = self.viewport(trajectory);
        debug!(
            "Rendering {} points for scenario {} at scale {:.4} px/m",
            trajectory.len(),
            meta.scenario_id,
            viewport.scale
        );

        let (width, height) = self.config.canvas_size;
        let mut svg = String::with_capacity(2048 + trajectory.len() * 24);
        // fmt::Write into a String does not fail
        let _ = write!(
            svg,
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">
  <defs>
    <style>
      .title {{ font-family: sans-serif; font-size: 14px; text-anchor: middle; }}
      .axis-label {{ font-family: sans-serif; font-size: 12px; text-anchor: middle; }}
      .tick-label {{ font-family: sans-serif; font-size: 10px; }}
      .grid {{ stroke: #b0b0b0; stroke-width: 0.8; stroke-opacity: 0.6; }}
      .frame {{ stroke: #000; stroke-width: 1; fill: none; }}
      .trajectory {{ stroke: {path}; stroke-width: {stroke:.2}; fill: none; stroke-linecap: round; stroke-linejoin: round; }}
    </style>
    <clipPath id="plot-area">
      <rect x="{l:.2}" y="{t:.2}" width="{pw:.2}" height="{ph:.2}" />
    </clipPath>
  </defs>
  <rect width="100%" height="100%" fill="white" />"#,
            w = width,
            h = height,
            path = escape_xml(&self.config.path_color),
            stroke = self.config.stroke_width,
            l = viewport.left,
            t = viewport.top,
            pw = viewport.width,
            ph = viewport.height,
        );

        self.push_title(&mut svg, meta);
        self.push_axes(&mut svg, &viewport);
        self.push_trajectory(&mut svg, &viewport, trajectory);
        if self.config.show_legend {
            self.push_legend(&mut svg, &viewport);
        }

        let _ = write!(
            svg,
            "\n  <!-- Generated from {} points -->\n</svg>",
            trajectory.len()
        );
        Ok(svg)
    }

    fn validate_config(&self) -> Result<(), EgoPlotError> {
        let (width, height) = self.config.canvas_size;
        if (width as f64) < MARGIN_LEFT + MARGIN_RIGHT + 50.0
            || (height as f64) < MARGIN_TOP + MARGIN_BOTTOM + 50.0
        {
            return Err(EgoPlotError::PlotRenderError {
                reason: format!("Canvas too small: {}x{}", width, height),
            });
        }
        if self.config.stroke_width <= 0.0 || self.config.stroke_width > 50.0 {
            return Err(EgoPlotError::PlotRenderError {
                reason: format!(
                    "Invalid stroke width: {} (must be 0.1-50.0)",
                    self.config.stroke_width
                ),
            });
        }
        if !(0.0..0.5).contains(&self.config.margin_percentage) {
            return Err(EgoPlotError::PlotRenderError {
                reason: format!(
                    "Invalid margin percentage: {} (must be 0.0-0.5)",
                    self.config.margin_percentage
                ),
            });
        }
        Ok(())
    }

    fn viewport(&self, trajectory: &EgoTrajectory) -> Viewport {
        let (width, height) = self.config.canvas_size;
        let plot_width = width as f64 - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = height as f64 - MARGIN_TOP - MARGIN_BOTTOM;

        let bbox = trajectory.bounds();
        let center = bbox.center();
        let padding = 1.0 + 2.0 * self.config.margin_percentage as f64;
        let span_x = (bbox.width() * padding).max(MIN_SPAN_M);
        let span_y = (bbox.height() * padding).max(MIN_SPAN_M);

        // one scale for both axes, the tighter one wins
        let scale = (plot_width / span_x).min(plot_height / span_y);
        let half_x = plot_width / scale / 2.0;
        let half_y = plot_height / scale / 2.0;

        Viewport {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: plot_width,
            height: plot_height,
            scale,
            min_x: center.x - half_x,
            max_x: center.x + half_x,
            min_y: center.y - half_y,
            max_y: center.y + half_y,
        }
    }

    fn push_title(&self, svg: &mut String, meta: &PlotMeta<'_>) {
        let center_x = self.config.canvas_size.0 as f64 / 2.0;
        let _ = write!(
            svg,
            "\n  <text class=\"title\" x=\"{x:.2}\" y=\"25\">Scenario ID: {id}</text>\
             \n  <text class=\"title\" x=\"{x:.2}\" y=\"45\">Num Agents: {agents}</text>",
            x = center_x,
            id = escape_xml(meta.scenario_id),
            agents = meta.agent_count,
        );
    }

    fn push_axes(&self, svg: &mut String, viewport: &Viewport) {
        let bottom = viewport.top + viewport.height;
        let right = viewport.left + viewport.width;

        for x in ticks(viewport.min_x, viewport.max_x) {
            let canvas_x = viewport.to_canvas(Point2D::new(x.value, viewport.min_y)).x;
            if self.config.show_grid {
                let _ = write!(
                    svg,
                    "\n  <line class=\"grid\" x1=\"{cx:.2}\" y1=\"{t:.2}\" x2=\"{cx:.2}\" y2=\"{b:.2}\" />",
                    cx = canvas_x,
                    t = viewport.top,
                    b = bottom,
                );
            }
            let _ = write!(
                svg,
                "\n  <text class=\"tick-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
                canvas_x,
                bottom + 15.0,
                x.label
            );
        }

        for y in ticks(viewport.min_y, viewport.max_y) {
            let canvas_y = viewport.to_canvas(Point2D::new(viewport.min_x, y.value)).y;
            if self.config.show_grid {
                let _ = write!(
                    svg,
                    "\n  <line class=\"grid\" x1=\"{l:.2}\" y1=\"{cy:.2}\" x2=\"{r:.2}\" y2=\"{cy:.2}\" />",
                    l = viewport.left,
                    r = right,
                    cy = canvas_y,
                );
            }
            let _ = write!(
                svg,
                "\n  <text class=\"tick-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
                viewport.left - 5.0,
                canvas_y + 3.5,
                y.label
            );
        }

        let _ = write!(
            svg,
            "\n  <rect class=\"frame\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" />",
            viewport.left, viewport.top, viewport.width, viewport.height
        );

        let label_x = viewport.left + viewport.width / 2.0;
        let label_y = viewport.top + viewport.height / 2.0;
        let _ = write!(
            svg,
            "\n  <text class=\"axis-label\" x=\"{:.2}\" y=\"{:.2}\">{}</text>\
             \n  <text class=\"axis-label\" x=\"20\" y=\"{:.2}\" transform=\"rotate(-90 20 {:.2})\">{}</text>",
            label_x,
            bottom + 40.0,
            X_LABEL,
            label_y,
            label_y,
            Y_LABEL
        );
    }

    fn push_trajectory(&self, svg: &mut String, viewport: &Viewport, trajectory: &EgoTrajectory) {
        svg.push_str("\n  <polyline class=\"trajectory\" clip-path=\"url(#plot-area)\" points=\"");
        for (i, point) in trajectory.points().iter().enumerate() {
            let canvas = viewport.to_canvas(*point);
            if i > 0 {
                svg.push(' ');
            }
            let _ = write!(svg, "{:.2},{:.2}", canvas.x, canvas.y);
        }
        svg.push_str("\" />");

        let start = viewport.to_canvas(trajectory.start());
        let end = viewport.to_canvas(trajectory.end());
        let _ = write!(
            svg,
            "\n  <circle class=\"start-marker\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" />\
             \n  <circle class=\"end-marker\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" />",
            start.x,
            start.y,
            self.config.marker_radius,
            escape_xml(&self.config.start_color),
            end.x,
            end.y,
            self.config.marker_radius,
            escape_xml(&self.config.end_color),
        );
    }

    fn push_legend(&self, svg: &mut String, viewport: &Viewport) {
        let x = viewport.left + viewport.width - 130.0;
        let y = viewport.top + 10.0;
        let _ = write!(
            svg,
            "\n  <g class=\"legend\">\
             \n    <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"120\" height=\"66\" fill=\"white\" fill-opacity=\"0.8\" stroke=\"#ccc\" />\
             \n    <line x1=\"{lx1:.2}\" y1=\"{ly1:.2}\" x2=\"{lx2:.2}\" y2=\"{ly1:.2}\" stroke=\"{path}\" stroke-width=\"{stroke:.2}\" />\
             \n    <text class=\"tick-label\" x=\"{tx:.2}\" y=\"{ty1:.2}\">AV Trajectory</text>\
             \n    <circle cx=\"{cx:.2}\" cy=\"{ly2:.2}\" r=\"{r:.2}\" fill=\"{start}\" />\
             \n    <text class=\"tick-label\" x=\"{tx:.2}\" y=\"{ty2:.2}\">Start</text>\
             \n    <circle cx=\"{cx:.2}\" cy=\"{ly3:.2}\" r=\"{r:.2}\" fill=\"{end}\" />\
             \n    <text class=\"tick-label\" x=\"{tx:.2}\" y=\"{ty3:.2}\">End</text>\
             \n  </g>",
            x = x,
            y = y,
            lx1 = x + 8.0,
            lx2 = x + 28.0,
            cx = x + 18.0,
            tx = x + 36.0,
            ly1 = y + 14.0,
            ly2 = y + 33.0,
            ly3 = y + 52.0,
            ty1 = y + 17.5,
            ty2 = y + 36.5,
            ty3 = y + 55.5,
            r = self.config.marker_radius,
            path = escape_xml(&self.config.path_color),
            stroke = self.config.stroke_width,
            start = escape_xml(&self.config.start_color),
            end = escape_xml(&self.config.end_color),
        );
    }
}

impl Default for TrajectoryPlotter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tick {
    value: f64,
    label: String,
}

/// Round tick step (1, 2 or 5 times a power of ten) for a data range
fn nice_step(range: f64) -> f64 {
    let raw = (range / TARGET_TICKS).max(f64::MIN_POSITIVE);
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let factor = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

fn ticks(min: f64, max: f64) -> Vec<Tick> {
    let step = nice_step(max - min);
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    let first = (min / step).ceil();
    (0..MAX_TICKS)
        .map(|i| (first + i as f64) * step)
        .take_while(|value| *value <= max + step * 1e-9)
        .map(|value| Tick {
            value,
            // avoid "-0" labels
            label: format!("{:.*}", decimals, if value == 0.0 { 0.0 } else { value }),
        })
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
