use blockcensus_common::{ScanObject, ScanObjectKind, ScanOptions};
use blockcensus_scan::ScanOutcome;
use serde::Serialize;

use crate::format::{pretty_count, pretty_duration};

/// One display line of a finished scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub kind: ScanObjectKind,
    pub name: String,
    pub count: u64,
}

/// A finished scan shaped for display or export.
///
/// Items follow [`AggregateStorage::entries`](blockcensus_scan::AggregateStorage::entries):
/// the allow-list or every counted object, zeros dropped unless retained,
/// sorted blocks first then by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub chunks: usize,
    pub failed: usize,
    pub blocks: u64,
    pub entities: u64,
    pub elapsed_ms: u64,
    pub forced: bool,
    pub items: Vec<ReportItem>,
}

impl ScanReport {
    pub fn from_outcome(outcome: &ScanOutcome, options: &ScanOptions) -> Self {
        let storage = &outcome.storage;
        let items = storage
            .entries(options)
            .into_iter()
            .map(|(object, count)| ReportItem {
                kind: object.kind(),
                name: object.name().to_owned(),
                count,
            })
            .collect();
        Self {
            chunks: outcome.progress.chunks_done,
            failed: outcome.progress.failed,
            blocks: storage.count(ScanObject::is_block),
            entities: storage.count(ScanObject::is_entity),
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            forced: outcome.forced,
            items,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scanned {} chunks in {}",
            pretty_count(self.chunks as u64),
            pretty_duration(std::time::Duration::from_millis(self.elapsed_ms))
        )?;
        if self.failed > 0 {
            write!(f, " ({} skipped)", self.failed)?;
        }
        if self.forced {
            write!(f, " [partial]")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  blocks={} entities={}",
            pretty_count(self.blocks),
            pretty_count(self.entities)
        )?;
        let width = self.items.iter().map(|i| i.name.len()).max().unwrap_or(0);
        for item in &self.items {
            writeln!(f, "  {:<width$}  {:>12}", item.name, pretty_count(item.count))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcensus_scan::{AggregateStorage, ScanProgress};
    use std::time::Duration;

    fn outcome(items: &[(ScanObject, u64)]) -> ScanOutcome {
        ScanOutcome {
            storage: items.iter().cloned().collect::<AggregateStorage>(),
            progress: ScanProgress {
                chunks_done: 4,
                chunks_total: 4,
                failed: 1,
            },
            elapsed: Duration::from_millis(1500),
            forced: false,
        }
    }

    #[test]
    fn totals_split_blocks_and_entities() {
        let outcome = outcome(&[
            (ScanObject::block("stone"), 16382),
            (ScanObject::block("gold_ore"), 1),
            (ScanObject::entity("cow"), 3),
        ]);
        let report = ScanReport::from_outcome(&outcome, &ScanOptions::all());

        assert_eq!(report.chunks, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.blocks, 16383);
        assert_eq!(report.entities, 3);
        assert_eq!(report.elapsed_ms, 1500);
        let names: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["gold_ore", "stone", "cow"]);
    }

    #[test]
    fn retained_zero_items_are_listed() {
        let outcome = outcome(&[(ScanObject::block("stone"), 10)]);
        let options = ScanOptions::only([ScanObject::block("stone"), ScanObject::block("air")])
            .with_retain_zero();
        let report = ScanReport::from_outcome(&outcome, &options);

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].name, "air");
        assert_eq!(report.items[0].count, 0);
    }

    #[test]
    fn display_lists_items() {
        let outcome = outcome(&[(ScanObject::block("stone"), 16382)]);
        let report = ScanReport::from_outcome(&outcome, &ScanOptions::all());
        let s = format!("{report}");
        assert!(s.contains("Scanned 4 chunks in 1.5s (1 skipped)"));
        assert!(s.contains("16,382"));
        assert!(!s.contains("[partial]"));
    }

    #[test]
    fn json_export() {
        let outcome = outcome(&[(ScanObject::entity("zombie"), 2)]);
        let report = ScanReport::from_outcome(&outcome, &ScanOptions::entities());
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["entities"], 2);
        assert_eq!(json["items"][0]["name"], "zombie");
        assert_eq!(json["items"][0]["count"], 2);
    }
}
