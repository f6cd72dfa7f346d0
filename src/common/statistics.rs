use crate::workloads::Category;

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

/// Each worker tracks statistics in its own instance of `LocalStatistics`.
/// After the run has completed the statistics are merged into
/// `GlobalStatistics`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LocalStatistics {
    /// Worker id.
    worker_id: u32,

    /// Per-category, per-template counters.
    templates: BTreeMap<Category, BTreeMap<String, TemplateStatistics>>,
}

/// Cumulative count and latency for one template.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TemplateStatistics {
    pub count: u64,

    /// Total latency (secs).
    pub total_latency: f64,
}

impl TemplateStatistics {
    pub fn mean_latency(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_latency / self.count as f64
        }
    }

    fn merge(&mut self, other: &TemplateStatistics) {
        self.count += other.count;
        self.total_latency += other.total_latency;
    }
}

impl LocalStatistics {
    pub fn new(worker_id: u32) -> LocalStatistics {
        LocalStatistics {
            worker_id,
            templates: BTreeMap::new(),
        }
    }

    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    /// Record one committed execution of `name`.
    pub fn record(&mut self, category: Category, name: &str, latency: Duration) {
        let entry = self
            .templates
            .entry(category)
            .or_insert_with(BTreeMap::new)
            .entry(name.to_string())
            .or_insert_with(TemplateStatistics::default);

        entry.count += 1;
        entry.total_latency += latency.as_secs_f64();
    }

    pub fn get(&self, category: Category, name: &str) -> Option<&TemplateStatistics> {
        self.templates.get(&category).and_then(|m| m.get(name))
    }

    /// Total committed executions across all categories.
    pub fn committed(&self) -> u64 {
        self.templates
            .values()
            .flat_map(|m| m.values())
            .map(|t| t.count)
            .sum()
    }
}

/// Run-wide statistics, merged from each worker's `LocalStatistics`.
#[derive(Debug)]
pub struct GlobalStatistics {
    start: Instant,

    /// Wall-clock duration of the run.
    end: Option<Duration>,

    workers: u32,

    templates: BTreeMap<Category, BTreeMap<String, TemplateStatistics>>,
}

impl GlobalStatistics {
    pub fn new() -> GlobalStatistics {
        GlobalStatistics {
            start: Instant::now(),
            end: None,
            workers: 0,
            templates: BTreeMap::new(),
        }
    }

    pub fn end(&mut self) {
        self.end = Some(self.start.elapsed());
    }

    /// Merge local stats into global stats.
    pub fn merge_into(&mut self, local: LocalStatistics) {
        self.workers += 1;

        for (category, names) in &local.templates {
            let merged = self
                .templates
                .entry(*category)
                .or_insert_with(BTreeMap::new);
            for (name, stats) in names {
                merged
                    .entry(name.clone())
                    .or_insert_with(TemplateStatistics::default)
                    .merge(stats);
            }
        }
    }

    pub fn committed(&self) -> u64 {
        self.templates
            .values()
            .flat_map(|m| m.values())
            .map(|t| t.count)
            .sum()
    }

    /// Write results to `./results/hybench.json`.
    pub fn write_to_file(&self) -> Result<(), std::io::Error> {
        let dir = "./results";
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)?;
        }

        let path = format!("{}/hybench.json", dir);
        if Path::new(&path).exists() {
            fs::remove_file(&path)?;
        }

        let mut file = OpenOptions::new().write(true).create(true).open(&path)?;

        let duration = self.end.map(|d| d.as_secs_f64()).unwrap_or(0.0);
        let overview = json!({
            "workers": self.workers,
            "duration": duration,
            "committed": self.committed(),
            "templates": self.templates,
        });

        writeln!(file, "{}", overview)?;
        Ok(())
    }
}

impl Default for GlobalStatistics {
    fn default() -> Self {
        GlobalStatistics::new()
    }
}

impl fmt::Display for GlobalStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for category in Category::iter() {
            let names = match self.templates.get(&category) {
                Some(names) if !names.is_empty() => names,
                _ => continue,
            };

            writeln!(f, "{} queries:", category)?;
            for (name, stats) in names {
                writeln!(
                    f,
                    "{} cnt: {}, avg latency: {:.6}s",
                    name,
                    stats.count,
                    stats.mean_latency()
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_merge_test() {
        let mut a = LocalStatistics::new(0);
        let mut b = LocalStatistics::new(1);
        a.record(Category::Tp, "TP-1", Duration::from_millis(10));
        a.record(Category::Tp, "TP-1", Duration::from_millis(30));
        b.record(Category::Tp, "TP-1", Duration::from_millis(20));
        b.record(Category::Ap, "AP-2", Duration::from_millis(5));

        let mut global = GlobalStatistics::new();
        global.merge_into(a);
        global.merge_into(b);

        assert_eq!(global.committed(), 4);
        let tp1 = &global.templates[&Category::Tp]["TP-1"];
        assert_eq!(tp1.count, 3);
        assert!((tp1.mean_latency() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn report_format_test() {
        let mut local = LocalStatistics::new(0);
        local.record(Category::Iq, "IQ-1", Duration::from_millis(2));

        let mut global = GlobalStatistics::new();
        global.merge_into(local);

        let report = format!("{}", global);
        assert!(report.contains("IQ queries:"));
        assert!(report.contains("IQ-1 cnt: 1, avg latency: 0.002000s"));
    }

    #[test]
    fn mean_of_empty_test() {
        let stats = TemplateStatistics::default();
        assert_eq!(stats.mean_latency(), 0.0);
    }
}
