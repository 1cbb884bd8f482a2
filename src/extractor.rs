// Scenario extraction and plotting run
//
// Reads records in stored order, plots the ego trajectory of each scenario and
// prints a one-line summary, stopping once the scenario limit is reached.

use std::{io::Write, path::Path, path::PathBuf};

use log::{info, warn};
use uom::si::length::meter;

use crate::config::DEFAULT_SCENARIO_LIMIT;
use crate::errors::EgoPlotError;
use crate::plot::{PlotMeta, TrajectoryPlotter};
use crate::scenario::Scenario;
use crate::tfrecord::{self, Compression};
use crate::trajectory::{self, Extraction, extract_ego_trajectory};
use crate::writer::PlotSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of scenarios to process, at least 1
    pub limit: usize,
    pub compression: Compression,
    pub verify_checksums: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SCENARIO_LIMIT,
            compression: Compression::None,
            verify_checksums: true,
        }
    }
}

/// What a run learned about one scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    /// 1-based position within the run
    pub index: usize,
    pub scenario_id: String,
    pub agent_count: usize,
    pub valid_states: usize,
}

impl ScenarioSummary {
    pub fn duration_label(&self) -> String {
        trajectory::duration_label(self.valid_states)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Plotted {
        summary: ScenarioSummary,
        plot: PathBuf,
    },
    /// The ego track had no valid state, nothing was drawn
    SkippedEmpty { summary: ScenarioSummary },
}

impl ScenarioOutcome {
    pub fn summary(&self) -> &ScenarioSummary {
        match self {
            ScenarioOutcome::Plotted { summary, .. } => summary,
            ScenarioOutcome::SkippedEmpty { summary } => summary,
        }
    }

    /// Console line for this scenario
    pub fn summary_line(&self) -> String {
        let summary = self.summary();
        match self {
            ScenarioOutcome::Plotted { .. } => format!(
                "[{}] Scenario ID: {} - Duration: {} sec",
                summary.index,
                summary.scenario_id,
                summary.duration_label()
            ),
            ScenarioOutcome::SkippedEmpty { .. } => format!(
                "[{}] Scenario ID: {} - skipped, ego track has no valid states",
                summary.index, summary.scenario_id
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    /// Scenarios processed, skipped ones included
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn plotted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScenarioOutcome::Plotted { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.processed() - self.plotted()
    }
}

/// Plot up to `options.limit` scenarios from the container at `path`.
///
/// Figures go to `sink`, summary lines to `console`. The first error ends the
/// run and is returned as is.
pub fn extract_and_plot<S: PlotSink, W: Write>(
    path: &Path,
    options: &RunOptions,
    plotter: &TrajectoryPlotter,
    sink: &mut S,
    console: &mut W,
) -> Result<RunReport, EgoPlotError> {
    if options.limit == 0 {
        return Err(EgoPlotError::InvalidScenarioLimit);
    }
    info!("Reading scenarios from {:?}", path);
    let records = tfrecord::open_records(path, options.compression, options.verify_checksums)?;
    process_records(records, options.limit, plotter, sink, console)
}

/// Run loop over already opened records. Stops pulling from `records` as soon
/// as `limit` scenarios have been processed.
pub fn process_records<I, S, W>(
    records: I,
    limit: usize,
    plotter: &TrajectoryPlotter,
    sink: &mut S,
    console: &mut W,
) -> Result<RunReport, EgoPlotError>
where
    I: IntoIterator<Item = Result<Vec<u8>, EgoPlotError>>,
    S: PlotSink,
    W: Write,
{
    if limit == 0 {
        return Err(EgoPlotError::InvalidScenarioLimit);
    }

    let mut report = RunReport::default();
    for (record_no, record) in records.into_iter().enumerate() {
        let payload = record?;
        let scenario = Scenario::from_record(record_no, &payload)?;
        let outcome = process_scenario(report.processed() + 1, &scenario, plotter, sink)?;

        writeln!(console, "{}", outcome.summary_line())
            .map_err(|e| EgoPlotError::ConsoleWriteError { source: e })?;
        report.outcomes.push(outcome);

        if report.processed() >= limit {
            break;
        }
    }

    info!(
        "Processed {} scenarios, {} plotted, {} skipped",
        report.processed(),
        report.plotted(),
        report.skipped()
    );
    Ok(report)
}

/// Extract, render and store the ego trajectory of one scenario
pub fn process_scenario<S: PlotSink>(
    index: usize,
    scenario: &Scenario,
    plotter: &TrajectoryPlotter,
    sink: &mut S,
) -> Result<ScenarioOutcome, EgoPlotError> {
    let extraction = extract_ego_trajectory(scenario)?;
    let summary = ScenarioSummary {
        index,
        scenario_id: scenario.scenario_id.clone(),
        agent_count: scenario.agent_count(),
        valid_states: extraction.valid_count(),
    };

    match extraction {
        Extraction::Empty => {
            warn!(
                "Scenario {} has no valid ego states, skipping plot",
                scenario.scenario_id
            );
            Ok(ScenarioOutcome::SkippedEmpty { summary })
        }
        Extraction::Path(trajectory) => {
            let meta = PlotMeta {
                scenario_id: &scenario.scenario_id,
                agent_count: summary.agent_count,
            };
            let svg = plotter.render(&trajectory, &meta)?;
            let plot = sink.write_plot(index, &scenario.scenario_id, &svg)?;
            info!(
                "Scenario {}: {} valid states, {:.1} m travelled, plot at {:?}",
                scenario.scenario_id,
                trajectory.len(),
                trajectory.path_length().get::<meter>(),
                plot
            );
            Ok(ScenarioOutcome::Plotted { summary, plot })
        }
    }
}
