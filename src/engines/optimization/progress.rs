use super::engine::ProgressCallback;
use serde::Serialize;

/// Observed min/max of one objective across the archive.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// Per-generation status handed to progress callbacks.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub archive_size: usize,
    pub stall: u32,
    pub objective_ranges: Vec<ObjectiveRange>,
}

pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_generation_start(&mut self, generation: u32) {
        println!("Generation {generation} starting...");
    }

    fn on_generation_complete(&mut self, report: &GenerationReport) {
        println!(
            "Generation {} complete. Archive size: {}, stall: {}",
            report.generation, report.archive_size, report.stall
        );
        for range in &report.objective_ranges {
            println!("  {}: min = {}, max = {}", range.name, range.min, range.max);
        }
    }
}

/// Forwards reports over a channel, for driving an external display.
pub struct ChannelProgress {
    sender: std::sync::mpsc::Sender<GenerationReport>,
}

impl ChannelProgress {
    pub fn new(sender: std::sync::mpsc::Sender<GenerationReport>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_generation_complete(&mut self, report: &GenerationReport) {
        let _ = self.sender.send(report.clone());
    }
}

/// Callback for runs that want no reporting at all.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_progress_forwards_reports() {
        let (tx, rx) = mpsc::channel();
        let mut progress = ChannelProgress::new(tx);

        progress.on_generation_start(1);
        progress.on_generation_complete(&GenerationReport {
            generation: 1,
            archive_size: 3,
            stall: 0,
            objective_ranges: vec![ObjectiveRange {
                name: "latency".to_string(),
                min: 4.0,
                max: 9.0,
            }],
        });

        let report = rx.recv().expect("report");
        assert_eq!(report.generation, 1);
        assert_eq!(report.archive_size, 3);
        assert_eq!(report.stall, 0);
        assert_eq!(report.objective_ranges.len(), 1);
        assert_eq!(report.objective_ranges[0].name, "latency");
    }

    #[test]
    fn test_channel_progress_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        let mut progress = ChannelProgress::new(tx);
        drop(rx);

        progress.on_generation_complete(&GenerationReport {
            generation: 2,
            archive_size: 1,
            stall: 1,
            objective_ranges: Vec::new(),
        });
    }
}
