//! Per-feature run summary: input parameters, statistics and timing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a feature-type run was given and what it produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub prefix: String,
    pub input_params: Vec<(String, String)>,
    pub stats: Vec<(String, String)>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Summary {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Self::default() }
    }

    /// Upper-cased prefix used as the report title.
    pub fn title(&self) -> String {
        self.prefix.to_uppercase()
    }

    /// Set an input parameter; a repeated name keeps its original position.
    pub fn set_input_param(&mut self, name: impl Into<String>, value: impl ToString) {
        upsert(&mut self.input_params, name.into(), value.to_string());
    }

    pub fn input_param(&self, name: &str) -> Option<&str> {
        lookup(&self.input_params, name)
    }

    /// Set a statistic; a repeated name keeps its original position.
    pub fn set_stat(&mut self, name: impl Into<String>, value: impl ToString) {
        upsert(&mut self.stats, name.into(), value.to_string());
    }

    pub fn stat(&self, name: &str) -> Option<&str> {
        lookup(&self.stats, name)
    }

    /// Mark the start of a run. A second call keeps the first timestamp.
    pub fn start(&mut self) {
        self.started_at.get_or_insert_with(Utc::now);
    }

    /// Mark the end of a run and record `PROCESSED TIME` in seconds.
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        if let Some(started) = self.started_at {
            let secs = (now - started).num_milliseconds() as f64 / 1000.0;
            self.set_stat("PROCESSED TIME", format!("{secs:.2} s"));
        }
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, name: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == name) {
        Some(slot) => slot.1 = value,
        None => pairs.push((name, value)),
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}
