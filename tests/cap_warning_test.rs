// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The agglomeration cap warns once per run, however many patterns it drops.
//!
//! Kept alone in its binary: the recording logger is process-wide.

mod common;

use closed_nsets::{Miner, MinerConfig};
use common::crisp_dataset;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;

struct Recorder {
    warnings: Mutex<Vec<String>>,
}

impl Log for Recorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.warnings.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder {
    warnings: Mutex::new(Vec::new()),
};

#[test]
fn test_cap_warning_is_logged_once() {
    log::set_logger(&RECORDER).unwrap();
    log::set_max_level(LevelFilter::Warn);

    // A diagonal: every single cell is a closed pattern.
    let cells: Vec<Vec<u32>> = (0..6).map(|element| vec![element, element]).collect();
    let dataset = crisp_dataset(&[6, 6], &cells);
    let config = MinerConfig::new().with_max_closed_nsets(2);
    let outcome = Miner::new(&dataset, &config).unwrap().run();
    assert_eq!(outcome.patterns.len(), 6);
    assert!(outcome.dendrogram.unwrap().is_truncated());

    let warnings = RECORDER.warnings.lock().unwrap();
    let cap_warnings = warnings.iter().filter(|warning| warning.contains("agglomerated")).count();
    assert_eq!(cap_warnings, 1, "warnings: {warnings:?}");
}
