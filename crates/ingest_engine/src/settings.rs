use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Pause between two transfer progress updates.
    pub tick_interval: Duration,
    /// Percentage points added per tick.
    pub progress_step: u8,
    /// Time the simulated analyzer takes per file.
    pub analysis_delay: Duration,
    /// `None` lets an analysis run forever.
    pub analysis_timeout: Option<Duration>,
    /// Upper bound on pipelines past the Queued stage. `None` starts every file at once.
    pub max_concurrent: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            progress_step: 10,
            analysis_delay: Duration::from_millis(1500),
            analysis_timeout: None,
            max_concurrent: None,
        }
    }
}

impl PipelineSettings {
    pub(crate) fn effective_step(&self) -> u8 {
        self.progress_step.clamp(1, 100)
    }
}
