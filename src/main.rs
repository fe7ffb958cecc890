use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use flate2::read::GzDecoder;
use serde::Serialize;

use trajectory_cleaner_rs::{
    CleanedTrajectory, CleaningSummary, CleanerConfig, DisplayFrame, KalmanParams,
    PreparedInput, ReferencePolicy, RejectedLine, Strategy, Thresholds, TrackPoint,
    TrajectoryCleaner,
};

#[derive(Parser, Debug)]
#[command(name = "trajectory_cleaner")]
#[command(about = "Clean GPS telemetry with outlier rejection or Kalman smoothing", long_about = None)]
struct Args {
    /// Telemetry file (lat,lng,timestamp_ms[,accuracy_m] per line; .gz accepted). Reads stdin if omitted or "-"
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cleaning strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Minimum distance in meters between kept points
    #[arg(long)]
    distance_threshold: Option<f64>,

    /// Maximum reported accuracy in meters for a point to be kept
    #[arg(long)]
    accuracy_threshold: Option<f64>,

    /// Point the outlier filter measures distance from
    #[arg(long, value_enum)]
    reference: Option<ReferenceArg>,

    /// Kalman measurement noise (R)
    #[arg(long)]
    measurement_noise: Option<f64>,

    /// Kalman process variance (Q)
    #[arg(long)]
    process_variance: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Outlier,
    Kalman,
    Raw,
    /// Outlier and Kalman results side by side
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReferenceArg {
    LastRetained,
    PreviousRaw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Serialize)]
struct PointView {
    latitude: f64,
    longitude: f64,
    timestamp_millis: i64,
    time: Option<String>,
    accuracy_meters: Option<f64>,
}

impl From<&TrackPoint> for PointView {
    fn from(p: &TrackPoint) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
            timestamp_millis: p.timestamp_millis,
            time: DateTime::<Utc>::from_timestamp_millis(p.timestamp_millis)
                .map(|t| t.to_rfc3339()),
            accuracy_meters: p.accuracy_meters,
        }
    }
}

#[derive(Serialize)]
struct TrajectoryView<'a> {
    strategy: Strategy,
    summary: &'a CleaningSummary,
    frame: Option<&'a DisplayFrame>,
    rejected: &'a [RejectedLine],
    points: Vec<PointView>,
}

impl<'a> From<&'a CleanedTrajectory> for TrajectoryView<'a> {
    fn from(t: &'a CleanedTrajectory) -> Self {
        Self {
            strategy: t.strategy,
            summary: &t.summary,
            frame: t.frame.as_ref(),
            rejected: &t.rejected,
            points: t.points.iter().map(PointView::from).collect(),
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut text = String::new();
    match path {
        None => {
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
        }
        Some(p) if p == Path::new("-") => {
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
        }
        Some(p) => {
            let file = File::open(p).with_context(|| format!("Failed to open {}", p.display()))?;
            if p.extension().map(|e| e == "gz").unwrap_or(false) {
                BufReader::new(GzDecoder::new(file))
                    .read_to_string(&mut text)
                    .with_context(|| format!("Failed to decompress {}", p.display()))?;
            } else {
                BufReader::new(file)
                    .read_to_string(&mut text)
                    .with_context(|| format!("Failed to read {}", p.display()))?;
            }
        }
    }
    Ok(text)
}

fn build_config(args: &Args) -> Result<CleanerConfig> {
    if args.strategy == Some(StrategyArg::Both) && args.format == OutputFormat::Csv {
        bail!("--strategy both only supports --format json");
    }

    let mut config = match &args.config {
        Some(path) => CleanerConfig::load(path)?,
        None => CleanerConfig::default(),
    };

    match args.strategy {
        Some(StrategyArg::Outlier) => config.strategy = Strategy::Outlier,
        Some(StrategyArg::Kalman) => config.strategy = Strategy::Kalman,
        Some(StrategyArg::Raw) => config.strategy = Strategy::Raw,
        Some(StrategyArg::Both) | None => {}
    }

    let reference = match args.reference {
        Some(ReferenceArg::LastRetained) => ReferencePolicy::LastRetained,
        Some(ReferenceArg::PreviousRaw) => ReferencePolicy::PreviousRaw,
        None => config.thresholds.reference(),
    };
    config.thresholds = Thresholds::new(
        args.distance_threshold
            .unwrap_or(config.thresholds.distance_meters()),
        args.accuracy_threshold
            .unwrap_or(config.thresholds.accuracy_meters()),
    )?
    .with_reference(reference);
    config.kalman = KalmanParams::new(
        args.measurement_noise
            .unwrap_or(config.kalman.measurement_noise()),
        args.process_variance
            .unwrap_or(config.kalman.process_variance()),
    )?;

    Ok(config)
}

fn write_csv(out: &mut dyn Write, trajectory: &CleanedTrajectory) -> Result<()> {
    for p in &trajectory.points {
        match p.accuracy_meters {
            Some(acc) => writeln!(out, "{},{},{},{}", p.latitude, p.longitude, p.timestamp_millis, acc)?,
            None => writeln!(out, "{},{},{}", p.latitude, p.longitude, p.timestamp_millis)?,
        }
    }
    Ok(())
}

/// Clean `text` with `config` and write the result in the format chosen by `args`.
fn run(args: &Args, config: &CleanerConfig, text: &str, out: &mut dyn Write) -> Result<()> {
    let both = args.strategy == Some(StrategyArg::Both);
    let prepared = PreparedInput::from_text(text);
    log::info!(
        "Parsed {} samples ({} malformed lines dropped)",
        prepared.samples.len(),
        prepared.rejected.len()
    );

    let results: Vec<CleanedTrajectory> = if both {
        vec![
            prepared.clean_with(&TrajectoryCleaner::OutlierReject(config.thresholds)),
            prepared.clean_with(&TrajectoryCleaner::KalmanSmooth(config.kalman)),
        ]
    } else {
        vec![prepared.clean_with(&TrajectoryCleaner::from_config(config))]
    };

    match args.format {
        OutputFormat::Csv => write_csv(out, &results[0])?,
        OutputFormat::Json => {
            let views: Vec<TrajectoryView> = results.iter().map(TrajectoryView::from).collect();
            if both {
                serde_json::to_writer_pretty(&mut *out, &views)?;
            } else {
                serde_json::to_writer_pretty(&mut *out, &views[0])?;
            }
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let text = read_input(args.input.as_deref())?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    run(&args, &config, &text, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use trajectory_cleaner_rs::parse_records;

    const SCENARIO: &str = "0,0.01,2000,10\n0,0,0\n0,0.0005,1000,10\n";

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("trajectory_cleaner").chain(extra.iter().copied()))
    }

    fn run_to_string(args: &Args, text: &str) -> String {
        let config = build_config(args).unwrap();
        let mut out = Vec::new();
        run(args, &config, text, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn json_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = build_config(&args(&[])).unwrap();
        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = json_config(
            r#"{
                "strategy": "kalman",
                "thresholds": { "distance_meters": 30, "accuracy_meters": 20, "reference": "previous-raw" },
                "kalman": { "measurement_noise": 0.5, "process_variance": 2 }
            }"#,
        );
        let path = file.path().to_str().unwrap();

        let config = build_config(&args(&["--config", path])).unwrap();
        assert_eq!(config.strategy, Strategy::Kalman);
        assert_eq!(config.thresholds.distance_meters(), 30.0);
        assert_eq!(config.kalman.measurement_noise(), 0.5);

        let config = build_config(&args(&[
            "--config",
            path,
            "--strategy",
            "outlier",
            "--distance-threshold",
            "75",
            "--process-variance",
            "4",
        ]))
        .unwrap();
        assert_eq!(config.strategy, Strategy::Outlier);
        assert_eq!(config.thresholds.distance_meters(), 75.0);
        // untouched values come from the file
        assert_eq!(config.thresholds.accuracy_meters(), 20.0);
        assert_eq!(config.thresholds.reference(), ReferencePolicy::PreviousRaw);
        assert_eq!(config.kalman.measurement_noise(), 0.5);
        assert_eq!(config.kalman.process_variance(), 4.0);

        let config = build_config(&args(&["--config", path, "--reference", "last-retained"])).unwrap();
        assert_eq!(config.thresholds.reference(), ReferencePolicy::LastRetained);
        assert_eq!(config.thresholds.distance_meters(), 30.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(build_config(&args(&["--distance-threshold=-5"])).is_err());
        assert!(build_config(&args(&["--measurement-noise=-1.5"])).is_err());
        let file = json_config(r#"{ "thresholds": { "accuracy_meters": -1 } }"#);
        assert!(build_config(&args(&["--config", file.path().to_str().unwrap()])).is_err());
    }

    #[test]
    fn test_both_with_csv_rejected() {
        let err = build_config(&args(&["--strategy", "both", "--format", "csv"])).unwrap_err();
        assert!(err.to_string().contains("--strategy both"));
        assert!(build_config(&args(&["--strategy", "both"])).is_ok());
    }

    #[test]
    fn test_both_writes_outlier_and_kalman() {
        let out = run_to_string(&args(&["--strategy", "both"]), SCENARIO);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        let results = json.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["strategy"], "outlier");
        assert_eq!(results[0]["points"].as_array().unwrap().len(), 2);
        assert_eq!(results[1]["strategy"], "kalman");
        assert_eq!(results[1]["points"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_json_output_has_rfc3339_times() {
        let out = run_to_string(&args(&["--strategy", "raw"]), SCENARIO);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["summary"]["input_count"], 3);
        assert_eq!(json["points"][1]["time"], "1970-01-01T00:00:01+00:00");
        assert!(json["points"][0]["accuracy_meters"].is_null());
    }

    #[test]
    fn test_csv_output_parses_back() {
        for strategy in ["raw", "kalman"] {
            let a = args(&["--strategy", strategy, "--format", "csv"]);
            let out = run_to_string(&a, SCENARIO);
            let parsed = parse_records(&out);
            assert!(parsed.rejected.is_empty());

            let expected = PreparedInput::from_text(SCENARIO)
                .clean_with(&TrajectoryCleaner::from_config(&build_config(&a).unwrap()));
            assert_eq!(parsed.samples.len(), expected.points.len());
            for (sample, point) in parsed.samples.iter().zip(&expected.points) {
                assert_eq!(TrackPoint::from(sample), *point);
            }
        }
    }

    #[test]
    fn test_read_plain_and_gzipped_files() {
        let mut plain = tempfile::NamedTempFile::new().unwrap();
        plain.write_all(SCENARIO.as_bytes()).unwrap();
        assert_eq!(read_input(Some(plain.path())).unwrap(), SCENARIO);

        let gz = tempfile::Builder::new().suffix(".gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(gz.reopen().unwrap(), Compression::default());
        encoder.write_all(SCENARIO.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_input(Some(gz.path())).unwrap(), SCENARIO);

        let a = args(&[gz.path().to_str().unwrap(), "--strategy", "raw"]);
        let text = read_input(a.input.as_deref()).unwrap();
        assert_eq!(parse_records(&text).samples.len(), 3);
    }

    #[test]
    fn test_missing_input_file() {
        let err = read_input(Some(Path::new("/nonexistent/track.csv"))).unwrap_err();
        assert!(err.to_string().contains("track.csv"));
    }
}
