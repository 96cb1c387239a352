//! Shared fixtures for the chart journal integration tests.
//!
//! `setup_journal()` builds an in-memory journal wired to a [`RecordingHost`]
//! so tests can observe every upload and delete sent to the file host.
//! `seed_sample()` adds two strategy types and four charts, one of them a
//! legacy record that references its strategy by name.

#![allow(dead_code)]

use chart_journal::{
    ChartJournal, FileHost, HostedFile, JournalError, NewChart, Result, StrategyType,
};
use std::sync::{Arc, Mutex};

/// In-process file host that records calls and fails on request.
#[derive(Default)]
pub struct RecordingHost {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    /// URLs or file names for which calls fail.
    pub fail_on: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn fail_on(&self, target: &str) {
        self.fail_on.lock().unwrap().push(target.to_string());
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    fn should_fail(&self, target: &str) -> bool {
        self.fail_on.lock().unwrap().iter().any(|t| t == target)
    }
}

impl FileHost for RecordingHost {
    fn upload(&self, file_name: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<HostedFile> {
        if self.should_fail(file_name) {
            return Err(JournalError::FileHost(format!("refused {file_name}")));
        }
        let mut uploaded = self.uploaded.lock().unwrap();
        uploaded.push(file_name.to_string());
        let key = format!("key-{}", uploaded.len());
        Ok(HostedFile {
            url: format!("https://utfs.io/f/{key}"),
            key,
        })
    }

    fn delete(&self, url: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(url.to_string());
        if self.should_fail(url) {
            return Err(JournalError::FileHost(format!("refused {url}")));
        }
        Ok(())
    }
}

/// In-memory journal plus a handle on its recording file host.
pub fn setup_journal() -> (ChartJournal, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let journal = ChartJournal::builder()
        .in_memory()
        .file_host(host.clone())
        .build()
        .unwrap();
    (journal, host)
}

pub struct Sample {
    pub breakout: StrategyType,
    pub gap: StrategyType,
    /// AAPL, 2024-03-01, breakout by id, executed, large cap, one image.
    pub aapl: String,
    /// TSLA, 2024-03-02 15:30Z, gap by id, not executed, small cap, two images.
    pub tsla: String,
    /// 2024-02-15, breakout by legacy name, executed unrecorded.
    pub legacy: String,
    /// "aapl weekly", 2024-03-01 (same instant as `aapl`, inserted after),
    /// breakout by lower-cased legacy name, executed.
    pub aapl_weekly: String,
}

pub fn new_chart(strategy: &str, date: &str, images: &[&str]) -> NewChart {
    NewChart {
        images: images.iter().map(|s| s.to_string()).collect(),
        strategy_type: Some(strategy.to_string()),
        date: Some(date.to_string()),
        ..Default::default()
    }
}

pub fn seed_sample(journal: &ChartJournal) -> Sample {
    let st = journal.strategy_types();
    let breakout = st.create("Breakout Trading").unwrap();
    let gap = st.create("Gap Trading").unwrap();

    let charts = journal.charts();

    let aapl = charts
        .create(&NewChart {
            stock_name: Some("AAPL".into()),
            market_cap: Some("large".into()),
            executed: Some(true),
            description: Some("Clean breakout over resistance".into()),
            ..new_chart(&breakout.id, "2024-03-01", &["https://utfs.io/f/aapl-1"])
        })
        .unwrap();

    let tsla = charts
        .create(&NewChart {
            stock_name: Some("TSLA".into()),
            market_cap: Some("small".into()),
            executed: Some(false),
            ..new_chart(
                &gap.id,
                "2024-03-02T15:30:00Z",
                &["https://utfs.io/f/tsla-1", "https://utfs.io/f/tsla-2"],
            )
        })
        .unwrap();

    let legacy = charts
        .create(&NewChart {
            image: Some("https://utfs.io/f/legacy-1".into()),
            strategy_type: Some("Breakout Trading".into()),
            date: Some("2024-02-15".into()),
            ..Default::default()
        })
        .unwrap();

    let aapl_weekly = charts
        .create(&NewChart {
            stock_name: Some("aapl weekly".into()),
            executed: Some(true),
            ..new_chart("breakout trading", "2024-03-01T00:00:00Z", &["https://utfs.io/f/aapl-w"])
        })
        .unwrap();

    Sample {
        breakout,
        gap,
        aapl,
        tsla,
        legacy,
        aapl_weekly,
    }
}

pub fn ids(charts: &[chart_journal::Chart]) -> Vec<String> {
    charts.iter().map(|c| c.id.clone()).collect()
}
