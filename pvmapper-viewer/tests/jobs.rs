mod common;

use std::sync::mpsc::sync_channel;

use approx::assert_relative_eq;
use common::TestDataset;
use pvmapper_algorithms::{ModuleTemperatureConfig, MEAN_TEMP, MEAN_TEMP_CORRECTED};
use pvmapper_core::{raw_to_celsius, Error};
use pvmapper_viewer::pipeline::run_module_temperatures_worker;
use pvmapper_viewer::{
    AnalysisJob, AnalysisJobRunner, CancelToken, DatasetModel, JobMessage, JobState,
};

fn open(dataset: &TestDataset) -> DatasetModel {
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    model
}

fn job(dataset: &TestDataset, name: &str) -> AnalysisJob {
    AnalysisJob {
        dataset: dataset.path().to_path_buf(),
        name: name.to_string(),
        config: ModuleTemperatureConfig::default(),
    }
}

#[test]
fn test_existing_name_is_rejected_before_any_work() {
    let dataset = TestDataset::standard();
    let model = open(&dataset);
    let mut runner = AnalysisJobRunner::new();

    let err = runner
        .start(&model, "A", ModuleTemperatureConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::NameConflict(_)));
    assert_eq!(runner.state(), &JobState::Idle);
    assert!(!dataset.layout().staging_dir("A").exists());
    assert_eq!(dataset.layout().list_analyses().unwrap(), vec!["A"]);

    let err = runner
        .start(&model, ".hidden", ModuleTemperatureConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidName(_)));
}

#[test]
fn test_completed_job_becomes_selectable() {
    let dataset = TestDataset::standard();
    let mut model = open(&dataset);
    let mut runner = AnalysisJobRunner::new();

    runner
        .start(&model, "Run 1", ModuleTemperatureConfig::default())
        .unwrap();
    assert!(runner.is_running());
    let err = runner
        .start(&model, "Run 2", ModuleTemperatureConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Busy));

    let state = runner.wait(&mut model).clone();
    assert_eq!(
        state,
        JobState::Completed {
            name: "Run 1".to_string()
        }
    );
    assert!(model.source_names().iter().any(|n| n == "Run 1"));
    assert!(!dataset.layout().staging_dir("Run 1").exists());

    model.select_source("Run 1").unwrap();
    let meta = model.meta().unwrap();
    assert_eq!(meta.kind, "module_temperatures");
    assert_eq!(meta.params["border_margin"], serde_json::json!(5));
    assert_eq!(
        model.column_names(),
        vec!["max_temp", "max_temp_corrected", "mean_temp", "mean_temp_corrected"]
    );

    let mean = model.column(MEAN_TEMP);
    let median_t1 = (raw_to_celsius(7829) + raw_to_celsius(7879)) / 2.0;
    assert_relative_eq!(mean["T1"].as_f64().unwrap(), median_t1, epsilon = 1e-9);
    assert_relative_eq!(mean["T2"].as_f64().unwrap(), raw_to_celsius(7854), epsilon = 1e-9);
    let corrected = model.column(MEAN_TEMP_CORRECTED);
    assert_relative_eq!(corrected["T1"].as_f64().unwrap(), 0.0, epsilon = 1e-9);

    assert!(runner.acknowledge());
    assert_eq!(runner.state(), &JobState::Idle);
}

#[test]
fn test_cancel_leaves_no_partial_source() {
    let dataset = TestDataset::standard();
    let mut model = open(&dataset);
    let mut runner = AnalysisJobRunner::new();

    runner
        .start(&model, "Analysis X", ModuleTemperatureConfig::default())
        .unwrap();
    assert!(runner.cancel());
    let state = runner.wait(&mut model).clone();
    model.refresh_source_names().unwrap();

    let listed = model.source_names().iter().any(|n| n == "Analysis X");
    match state {
        JobState::Cancelled { reason, .. } => {
            assert!(!reason.is_empty());
            assert!(!listed);
            assert!(!dataset.layout().analysis_dir("Analysis X").exists());
        }
        JobState::Completed { .. } => assert!(listed),
        other => panic!("unexpected state {other:?}"),
    }
    assert!(!dataset.layout().staging_dir("Analysis X").exists());
    assert!(!runner.cancel());
}

#[test]
fn test_dropping_runner_cancels_running_job() {
    let dataset = TestDataset::standard();
    let model = open(&dataset);
    let mut runner = AnalysisJobRunner::new();
    runner
        .start(&model, "Orphan", ModuleTemperatureConfig::default())
        .unwrap();
    drop(runner);

    // drop joins the worker, so the outcome is final here
    assert!(!dataset.layout().analysis_dir("Orphan").exists());
    assert!(!dataset.layout().staging_dir("Orphan").exists());
    assert_eq!(dataset.layout().list_analyses().unwrap(), vec!["A"]);
}

#[test]
fn test_cancelled_worker_reports_last() {
    let dataset = TestDataset::standard();
    let (tx, rx) = sync_channel(1024);
    let cancel = CancelToken::new();
    cancel.cancel();

    run_module_temperatures_worker(&job(&dataset, "Analysis X"), &tx, &cancel);
    drop(tx);
    let messages: Vec<JobMessage> = rx.iter().collect();

    let Some(JobMessage::Progress(last)) = messages.last() else {
        panic!("no final report: {messages:?}");
    };
    assert!(last.cancelled);
    assert!(last.status.is_some());
    assert_eq!(
        messages
            .iter()
            .filter(|m| matches!(m, JobMessage::Progress(p) if p.cancelled))
            .count(),
        1
    );
    assert!(!messages.iter().any(|m| matches!(m, JobMessage::Completed { .. })));
    assert!(!dataset.layout().analysis_dir("Analysis X").exists());
    assert!(!dataset.layout().staging_dir("Analysis X").exists());
}

#[test]
fn test_worker_progress_is_monotonic() {
    let dataset = TestDataset::standard();
    let (tx, rx) = sync_channel(1024);
    run_module_temperatures_worker(&job(&dataset, "B"), &tx, &CancelToken::new());
    drop(tx);
    let messages: Vec<JobMessage> = rx.iter().collect();

    let fractions: Vec<f32> = messages
        .iter()
        .filter_map(|m| match m {
            JobMessage::Progress(p) => Some(p.fraction),
            _ => None,
        })
        .collect();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    assert!(matches!(messages.last(), Some(JobMessage::Completed { name, .. }) if name == "B"));
    assert!(dataset.layout().results_path("B").is_file());
    assert!(dataset.layout().meta_path("B").is_file());
}

#[test]
fn test_job_writes_into_dataset_captured_at_start() {
    let first = TestDataset::standard();
    let second = TestDataset::standard();
    let mut model = open(&first);
    let mut runner = AnalysisJobRunner::new();

    runner
        .start(&model, "Run", ModuleTemperatureConfig::default())
        .unwrap();
    model.close();
    model.open(second.path()).unwrap();

    let state = runner.wait(&mut model).clone();
    assert_eq!(state, JobState::Completed { name: "Run".to_string() });
    assert!(first.layout().analysis_dir("Run").is_dir());
    assert!(!second.layout().analysis_dir("Run").exists());
    assert!(!model.source_names().iter().any(|n| n == "Run"));
}

#[test]
fn test_worker_failure_is_terminal() {
    let dataset = TestDataset::standard();
    let mut model = open(&dataset);
    std::fs::remove_file(dataset.layout().module_layout_path()).unwrap();
    let mut runner = AnalysisJobRunner::new();

    runner
        .start(&model, "Broken", ModuleTemperatureConfig::default())
        .unwrap();
    let state = runner.wait(&mut model).clone();
    assert!(matches!(state, JobState::Failed { ref name, .. } if name == "Broken"));
    assert!(!dataset.layout().analysis_dir("Broken").exists());
    assert!(!dataset.layout().staging_dir("Broken").exists());
    assert_eq!(model.source_names().len(), 2);
}
