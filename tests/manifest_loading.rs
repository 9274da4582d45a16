//! Run manifest loading and adapter registry construction

mod common;

use common::task_registry;
use loramux::config::{build_adapters, load_spec, validate_spec, RunSpec, SpecError};
use loramux::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn manifest(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

const TWO_ADAPTERS: &str = r"
base_model: test/base-model
adapters:
  - lora:
      name: a
    train:
      batch_size: 8
      micro_batch_size: 2
      lr: 0.0003
      loraplus_lr_ratio: 16
      task_name: sst2
    validation:
      task_name: sst2
  - lora:
      name: b
    train:
      batch_size: 4
      lr: 0.001
      task_name: arc-c
";

#[test]
fn test_load_and_build_registry() {
    let file = manifest(TWO_ADAPTERS);
    let spec = load_spec(file.path()).unwrap();
    let registry = build_adapters(&spec, &task_registry()).unwrap();

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    let a = registry.get("a").unwrap();
    assert_eq!(a.train_state().task().name(), "sst2");
    assert_eq!(a.train_state().config().loraplus_lr_ratio, 16.0);
    assert!(!a.train_state().is_prepared());
    assert_eq!(a.validation().unwrap().batch_size(), 16);
    assert!(registry.get("b").unwrap().validation().is_none());
}

#[test]
fn test_unregistered_task_fails_build() {
    let file = manifest(&TWO_ADAPTERS.replace("task_name: arc-c", "task_name: mnli"));
    let spec = load_spec(file.path()).unwrap();
    assert!(matches!(
        build_adapters(&spec, &task_registry()),
        Err(Error::UnknownTask(name)) if name == "mnli"
    ));
}

#[test]
fn test_casual_without_factory_fails_build() {
    let yaml = TWO_ADAPTERS.replace("task_name: arc-c", "task_name: casual\n      data: alpaca.json");
    let spec = load_spec(manifest(&yaml).path()).unwrap();
    assert!(matches!(build_adapters(&spec, &task_registry()), Err(Error::UnknownTask(_))));
}

#[test]
fn test_indivisible_batch_rejected_at_load() {
    let file = manifest(&TWO_ADAPTERS.replace("micro_batch_size: 2", "micro_batch_size: 3"));
    let err = load_spec(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid config"));
}

#[test]
fn test_duplicate_adapter_names() {
    let mut spec: RunSpec = serde_yaml::from_str(TWO_ADAPTERS).unwrap();
    spec.adapters[1].lora.name = "a".to_string();
    assert_eq!(validate_spec(&spec), Err(SpecError::DuplicateAdapter("a".to_string())));
}

#[test]
fn test_malformed_yaml() {
    let file = manifest("base_model: [unterminated\n");
    let err = load_spec(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse YAML config"));
}
