//! Timed pipeline behaviour against an in-memory corpus: the stdout
//! contract, the timeout sentinel, and parsing the output back.

use std::thread;
use std::time::Duration;

use tsbench_bench::{Benchmark, PipelineConfig, Stage, TimedPipeline};
use tsbench_dtw::TimeSeries;
use tsbench_io::{CorpusProvider, DatasetName, IoError, Report, Split};
use tsbench_models::{CancelFlag, ClassLabel, Inference, LabeledSplit, Model, ModelError};

/// Two well-separated classes, same data for every dataset name.
struct SyntheticCorpus;

impl CorpusProvider for SyntheticCorpus {
    fn load(&self, _name: DatasetName, split: Split) -> Result<LabeledSplit, IoError> {
        let offset = match split {
            Split::Train => 0.0,
            Split::Test => 0.05,
        };
        let mut series = Vec::new();
        let mut labels = Vec::new();
        for k in 0..4 {
            for (label, level) in [("low", 0.0), ("high", 5.0)] {
                let values = (0..24)
                    .map(|t| level + offset + ((t + k) as f64 * 0.4).sin() * 0.1)
                    .collect();
                series.push(TimeSeries::new(values).expect("finite"));
                labels.push(ClassLabel::new(label));
            }
        }
        Ok(LabeledSplit::new(series, labels).expect("paired"))
    }
}

/// Fits instantly, then spins until cancelled.
struct StallingModel;

impl Model for StallingModel {
    fn name(&self) -> &'static str {
        "stalling"
    }

    fn fit(&mut self, _train: &LabeledSplit) -> Result<(), ModelError> {
        Ok(())
    }

    fn infer(
        &self,
        _train: &LabeledSplit,
        _test: &LabeledSplit,
        cancel: &CancelFlag,
    ) -> Result<Inference, ModelError> {
        while !cancel.is_cancelled() {
            thread::sleep(Duration::from_millis(5));
        }
        Err(ModelError::Cancelled)
    }
}

fn names(raw: &[&str]) -> Vec<DatasetName> {
    raw.iter().map(|n| DatasetName::new(n).unwrap()).collect()
}

fn config() -> PipelineConfig {
    PipelineConfig::new(Duration::from_secs(60)).unwrap().with_warmup(false)
}

#[test]
fn knn_run_prints_six_lines_after_name() {
    let corpus = SyntheticCorpus;
    let pipeline = TimedPipeline::new(&corpus, Benchmark::KnnDtw, config());
    let mut out = Vec::new();
    let results = pipeline.run_batch(&names(&["Coffee"]), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "Coffee");
    for line in &lines[1..6] {
        assert!(line.starts_with("  ") && line.ends_with(" seconds"), "{line:?}");
    }
    assert_eq!(lines[6], "1.0");

    let result = &results[0];
    assert!(!result.sentinel);
    assert_eq!(result.accuracy, 1.0);
    assert_eq!(result.stages.entries().len(), 5);
    assert!(result.stages.get(Stage::Predict).is_some());
}

#[test]
fn minirocket_reports_zero_accuracy() {
    let corpus = SyntheticCorpus;
    let pipeline = TimedPipeline::new(&corpus, Benchmark::MiniRocket, config());
    let mut out = Vec::new();
    let results = pipeline.run_batch(&names(&["Beef"]), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().last(), Some("0.0"));
    assert!(!results[0].sentinel);
}

#[test]
fn stalled_inference_yields_sentinel() {
    let corpus = SyntheticCorpus;
    let config = PipelineConfig::new(Duration::from_millis(100))
        .unwrap()
        .with_warmup(false);
    let pipeline = TimedPipeline::with_builder(&corpus, config, |_| {
        Ok(Box::new(StallingModel) as Box<dyn Model>)
    });

    let mut out = Vec::new();
    let results = pipeline.run_batch(&names(&["Ham", "Wine"]), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 14);
    for block in lines.chunks(7) {
        assert_eq!(block[5], "-1");
        assert_eq!(block[6], "0.0");
    }
    assert!(results.iter().all(|r| r.sentinel && r.accuracy == 0.0));
    assert!(results[0].stages.get(Stage::Predict).is_none());
}

#[test]
fn output_with_warmup_parses_back() {
    let corpus = SyntheticCorpus;
    let config = PipelineConfig::new(Duration::from_secs(60)).unwrap();
    let pipeline = TimedPipeline::new(&corpus, Benchmark::KnnDtw, config);
    let mut out = Vec::new();
    pipeline.run_batch(&names(&["Wine", "Adiac"]), &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Precompilation done.\n"));

    let mut report = Report::new();
    report.ingest(text.as_bytes()).unwrap();
    let parsed: Vec<&str> = report.records().map(|r| r.name.as_str()).collect();
    assert_eq!(parsed, ["Adiac", "Wine"]);
    assert!(report.records().all(|r| r.accuracy == 1.0 && r.predict >= 0.0));
}

#[test]
fn load_failure_is_fatal() {
    struct Missing;
    impl CorpusProvider for Missing {
        fn load(&self, name: DatasetName, _split: Split) -> Result<LabeledSplit, IoError> {
            Err(IoError::UnknownDataset {
                name: name.to_string(),
            })
        }
    }

    let pipeline = TimedPipeline::new(&Missing, Benchmark::KnnDtw, config());
    let mut out = Vec::new();
    assert!(pipeline.run_batch(&names(&["Car"]), &mut out).is_err());
}
