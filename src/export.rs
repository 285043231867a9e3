//! Run report: a structured replay of a linkage run as JSON.
//!
//! One section per feature type plus a `geocheck` section for
//! cross-feature findings:
//!
//! ```text
//! Linkage → Report::from_linkage() → write_report() → pretty JSON
//!   { sections: [ { title, input_params, stats, process, errors, warnings }, ... ] }
//! ```
//!
//! Rendering (colors, HTML, dialogs) is the caller's business.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{GEOCHECK, Ledger, ProcessLine};
use crate::topology::{MapSource, Topology};
use crate::{Linkage, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub feature_type: String,
    pub title: String,
    pub input_params: Vec<(String, String)>,
    pub stats: Vec<(String, String)>,
    pub process: Vec<ProcessLine>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReportSection {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    /// Snapshot every engine's summary, trail and ledger.
    pub fn from_linkage<T: Topology, S: MapSource>(linkage: &Linkage<T, S>) -> Self {
        let mut sections: Vec<ReportSection> = linkage
            .engines()
            .map(|engine| {
                let summary = engine.summary();
                section(
                    engine.feature_type(),
                    summary.title(),
                    summary.input_params.clone(),
                    summary.stats.clone(),
                    engine.process_trail(),
                    engine.ledger(),
                )
            })
            .collect();

        let general = linkage.general_ledger();
        let trail = linkage.process_trail(GEOCHECK).unwrap_or_default();
        if !general.is_empty() || !trail.is_empty() {
            sections.push(section(GEOCHECK, GEOCHECK.to_uppercase(), Vec::new(), Vec::new(), trail, general));
        }

        Self { sections }
    }

    pub fn section(&self, feature_type: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.feature_type == feature_type)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn section(
    feature_type: &str,
    title: String,
    input_params: Vec<(String, String)>,
    stats: Vec<(String, String)>,
    process: &[ProcessLine],
    ledger: &Ledger,
) -> ReportSection {
    ReportSection {
        feature_type: feature_type.to_string(),
        title,
        input_params,
        stats,
        process: process.to_vec(),
        errors: ledger.errors(feature_type, ""),
        warnings: ledger.warnings(feature_type, ""),
    }
}

/// Write the run report of `linkage` as pretty JSON.
pub fn write_report<T: Topology, S: MapSource>(linkage: &Linkage<T, S>, writer: &mut dyn Write) -> Result<()> {
    let report = Report::from_linkage(linkage);
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
