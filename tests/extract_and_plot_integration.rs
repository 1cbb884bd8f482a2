// Integration tests for the scenario extraction run
//
// Each test writes a TFRecord container of synthetic scenarios to a temporary
// file and runs the full read → decode → extract → render → write pipeline.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use egoplot::{
    Compression, EgoPlotError, ObjectState, ObjectType, RecordWriter, RunOptions,
    RunReport, Scenario, ScenarioOutcome, SvgFileSink, Track, TrajectoryPlotter, extract_and_plot,
};
use prost::Message;
use tempfile::{NamedTempFile, TempDir};

/// Scenario with a curved ego path of `valid` states followed by `invalid` ones
fn create_scenario(id: &str, valid: usize, invalid: usize) -> Scenario {
    let mut states: Vec<ObjectState> = (0..valid)
        .map(|i| {
            let t = i as f64 * 0.1;
            ObjectState::at(8_000.0 + 10.0 * t, -1_200.0 + 0.5 * t * t)
        })
        .collect();
    states.extend((0..invalid).map(|_| ObjectState::default()));

    let other_agent = Track {
        id: 100,
        object_type: ObjectType::Cyclist as i32,
        states: vec![ObjectState::at(8_010.0, -1_190.0)],
    };
    Scenario {
        scenario_id: id.to_string(),
        sdc_track_index: 0,
        tracks: vec![
            Track {
                id: 1,
                object_type: ObjectType::Vehicle as i32,
                states,
            },
            other_agent.clone(),
            other_agent,
        ],
        timestamps_seconds: (0..valid + invalid).map(|i| i as f64 * 0.1).collect(),
        current_time_index: 10,
        ..Default::default()
    }
}

fn write_container(scenarios: &[Scenario]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut writer = RecordWriter::new(file.reopen().unwrap());
    for scenario in scenarios {
        writer.write_record(&scenario.encode_to_vec()).unwrap();
    }
    writer.into_inner().unwrap();
    file
}

fn run(
    path: &Path,
    output_dir: &Path,
    limit: usize,
) -> (Result<RunReport, EgoPlotError>, String) {
    let options = RunOptions {
        limit,
        ..Default::default()
    };
    let mut sink = SvgFileSink::new(output_dir);
    let mut console = Vec::new();
    let result = extract_and_plot(
        path,
        &options,
        &TrajectoryPlotter::new(),
        &mut sink,
        &mut console,
    );
    (result, String::from_utf8(console).unwrap())
}

fn svg_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "svg"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_three_records_with_limit_five() {
    let scenarios: Vec<Scenario> = (0..3)
        .map(|i| create_scenario(&format!("scenario-{}", i), 91, 0))
        .collect();
    let container = write_container(&scenarios);
    let output = TempDir::new().unwrap();

    let (result, console) = run(container.path(), output.path(), 5);
    let report = result.unwrap();

    assert_eq!(report.processed(), 3);
    assert_eq!(report.plotted(), 3);
    assert_eq!(console.lines().count(), 3);
    assert_eq!(
        console.lines().next().unwrap(),
        "[1] Scenario ID: scenario-0 - Duration: 9.1 sec"
    );

    let files = svg_files(output.path());
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("001_scenario-0.svg"));
    assert!(files[2].ends_with("003_scenario-2.svg"));

    let svg = fs::read_to_string(&files[1]).unwrap();
    assert!(svg.contains("Scenario ID: scenario-1"));
    assert!(svg.contains("Num Agents: 3"));
    assert!(svg.contains("Global X (m)"));
    assert!(svg.contains("Global Y (m)"));
}

#[test]
fn test_ten_records_with_limit_five() {
    let scenarios: Vec<Scenario> = (0..10)
        .map(|i| create_scenario(&format!("s{}", i), 20, 0))
        .collect();
    let container = write_container(&scenarios);
    let output = TempDir::new().unwrap();

    let (result, console) = run(container.path(), output.path(), 5);
    let report = result.unwrap();

    assert_eq!(report.processed(), 5);
    assert_eq!(console.lines().count(), 5);
    assert_eq!(svg_files(output.path()).len(), 5);
    let ids: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.summary().scenario_id.as_str())
        .collect();
    assert_eq!(ids, vec!["s0", "s1", "s2", "s3", "s4"]);
}

#[test]
fn test_limit_stops_before_corrupt_record() {
    // records past the limit are never read, so their damage is never seen
    let container = write_container(&[create_scenario("good", 10, 0)]);
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(container.path())
        .unwrap();
    file.write_all(b"definitely not a record").unwrap();
    let output = TempDir::new().unwrap();

    let (result, _) = run(container.path(), output.path(), 1);
    assert_eq!(result.unwrap().processed(), 1);

    let (result, _) = run(container.path(), output.path(), 2);
    assert!(matches!(
        result,
        Err(EgoPlotError::ChecksumMismatch { record_no: 1, .. })
    ));
}

#[test]
fn test_duration_counts_only_valid_states() {
    let container = write_container(&[create_scenario("partial", 37, 54)]);
    let output = TempDir::new().unwrap();

    let (result, console) = run(container.path(), output.path(), 5);
    let report = result.unwrap();

    assert_eq!(report.outcomes[0].summary().valid_states, 37);
    assert_eq!(console.trim_end(), "[1] Scenario ID: partial - Duration: 3.7 sec");
}

#[test]
fn test_scenario_without_valid_states_is_not_plotted() {
    let container = write_container(&[
        create_scenario("ghost", 0, 91),
        create_scenario("real", 91, 0),
    ]);
    let output = TempDir::new().unwrap();

    let (result, console) = run(container.path(), output.path(), 5);
    let report = result.unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(report.skipped(), 1);
    assert!(matches!(
        &report.outcomes[0],
        ScenarioOutcome::SkippedEmpty { summary } if summary.scenario_id == "ghost"
    ));
    assert!(console.contains("ghost - skipped"));

    let files = svg_files(output.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("002_real.svg"));
}

#[test]
fn test_out_of_range_ego_index_ends_run() {
    let mut broken = create_scenario("broken", 10, 0);
    broken.sdc_track_index = 7;
    let container = write_container(&[create_scenario("first", 10, 0), broken]);
    let output = TempDir::new().unwrap();

    let (result, console) = run(container.path(), output.path(), 5);

    match result {
        Err(EgoPlotError::EgoTrackIndexOutOfRange {
            scenario_id,
            index,
            track_count,
        }) => {
            assert_eq!(scenario_id, "broken");
            assert_eq!(index, 7);
            assert_eq!(track_count, 3);
        }
        other => panic!("Expected EgoTrackIndexOutOfRange, got {:?}", other),
    }
    // the scenario before the broken one was still handled
    assert_eq!(console.lines().count(), 1);
    assert_eq!(svg_files(output.path()).len(), 1);
}

#[test]
fn test_missing_input_file() {
    let output = TempDir::new().unwrap();
    let (result, console) = run(
        Path::new("/nonexistent/YOUR_DOWNLOADED_FILE_NAME.tfrecord"),
        output.path(),
        5,
    );
    assert!(matches!(result, Err(EgoPlotError::MissingScenarioFile { .. })));
    assert!(console.is_empty());
    assert!(svg_files(output.path()).is_empty());
}

#[test]
fn test_record_that_is_not_a_scenario() {
    let file = NamedTempFile::new().unwrap();
    let mut writer = RecordWriter::new(file.reopen().unwrap());
    writer.write_record(&[0x12, 0x50, 0x01]).unwrap();
    writer.into_inner().unwrap();
    let output = TempDir::new().unwrap();

    let (result, _) = run(file.path(), output.path(), 5);
    assert!(matches!(result, Err(EgoPlotError::ScenarioDecode { record_no: 0, .. })));
}

#[test]
fn test_gzip_container() {
    use flate2::write::GzEncoder;

    let mut writer = RecordWriter::new(Vec::new());
    for i in 0..2 {
        writer
            .write_record(&create_scenario(&format!("gz{}", i), 15, 0).encode_to_vec())
            .unwrap();
    }
    let bytes = writer.into_inner().unwrap();

    let file = NamedTempFile::new().unwrap();
    let mut encoder = GzEncoder::new(file.reopen().unwrap(), flate2::Compression::default());
    encoder.write_all(&bytes).unwrap();
    encoder.finish().unwrap();

    let output = TempDir::new().unwrap();
    let options = RunOptions {
        compression: Compression::Gzip,
        ..Default::default()
    };
    let mut sink = SvgFileSink::new(output.path());
    let report = extract_and_plot(
        file.path(),
        &options,
        &TrajectoryPlotter::new(),
        &mut sink,
        &mut std::io::sink(),
    )
    .unwrap();
    assert_eq!(report.plotted(), 2);
}
