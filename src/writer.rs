use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;

use crate::EgoPlotError;

/// Destination for rendered figures
pub trait PlotSink {
    /// Store the figure of the `index`-th scenario of the run (1-based) and
    /// return where it went
    fn write_plot(
        &mut self,
        index: usize,
        scenario_id: &str,
        svg: &str,
    ) -> Result<PathBuf, EgoPlotError>;
}

/// File name of a figure: run index plus the scenario id reduced to
/// characters that are safe in paths
pub fn plot_file_name(index: usize, scenario_id: &str) -> String {
    let mut safe_id: String = scenario_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe_id.is_empty() {
        safe_id.push_str("scenario");
    }
    format!("{:03}_{}.svg", index, safe_id)
}

/// Writes every figure as an SVG file in one directory
pub struct SvgFileSink {
    output_dir: PathBuf,
}

impl SvgFileSink {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl PlotSink for SvgFileSink {
    fn write_plot(
        &mut self,
        index: usize,
        scenario_id: &str,
        svg: &str,
    ) -> Result<PathBuf, EgoPlotError> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).map_err(|e| EgoPlotError::PlotWriteError {
                path: self.output_dir.clone(),
                source: e,
            })?;
        }

        let path = self.output_dir.join(plot_file_name(index, scenario_id));
        let file = File::create(&path).map_err(|e| EgoPlotError::PlotWriteError {
            path: path.clone(),
            source: e,
        })?;
        let mut plot_writer = BufWriter::new(file);
        plot_writer
            .write_all(svg.as_bytes())
            .and_then(|_| plot_writer.flush())
            .map_err(|e| EgoPlotError::PlotWriteError {
                path: path.clone(),
                source: e,
            })?;
        debug!("Wrote {} bytes to {:?}", svg.len(), path);
        Ok(path)
    }
}

/// Keeps figures in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub plots: Vec<(String, String)>,
}

impl PlotSink for MemorySink {
    fn write_plot(
        &mut self,
        index: usize,
        scenario_id: &str,
        svg: &str,
    ) -> Result<PathBuf, EgoPlotError> {
        let name = plot_file_name(index, scenario_id);
        self.plots.push((name.clone(), svg.to_string()));
        Ok(PathBuf::from(name))
    }
}
