use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ingest_logging::{ingest_debug, ingest_info};
use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{run_pipeline, ChannelProgressSink, PipelineContext};
use crate::{
    Analyzer, Clock, EngineEvent, IngestFile, PipelineSettings, ProgressSink, RecordId,
    SimulatedAnalyzer, TokioClock,
};

enum EngineCommand {
    Submit { record_id: RecordId, file: IngestFile },
    Cancel { record_id: RecordId },
}

struct RunningPipeline {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start pipeline runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Pluggable pieces of an engine.
pub struct EngineParts {
    pub settings: PipelineSettings,
    pub clock: Arc<dyn Clock>,
    pub analyzer: Arc<dyn Analyzer>,
    pub sink: Arc<dyn ProgressSink>,
}

/// Owns the pipeline worker thread. Commands return immediately; pipelines run
/// as tasks on a single-threaded runtime and report through the progress sink.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: Option<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    /// Simulated analyzer on the tokio clock; events are read back with
    /// [`EngineHandle::try_recv`] / [`EngineHandle::recv_timeout`].
    pub fn new(settings: PipelineSettings) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let analyzer = Arc::new(SimulatedAnalyzer::new(
            clock.clone(),
            settings.analysis_delay,
        ));
        let mut handle = Self::spawn(EngineParts {
            settings,
            clock,
            analyzer,
            sink: Arc::new(ChannelProgressSink::new(event_tx)),
        })?;
        handle.event_rx = Some(event_rx);
        Ok(handle)
    }

    /// Starts an engine that reports to `parts.sink` instead of the built-in channel.
    ///
    /// The runtime is built before the worker starts, so a handle only exists
    /// once there is something to run submissions on.
    pub fn spawn(parts: EngineParts) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let ctx = PipelineContext::new(parts.settings, parts.clock, parts.analyzer, parts.sink);

        thread::spawn(move || {
            runtime.block_on(command_loop(ctx, cmd_rx));
            ingest_debug!("Pipeline worker stopped");
        });

        Ok(Self {
            cmd_tx,
            event_rx: None,
        })
    }

    pub fn submit(&self, record_id: RecordId, file: IngestFile) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { record_id, file });
    }

    pub fn cancel(&self, record_id: RecordId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { record_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.as_ref()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.as_ref()?.recv_timeout(timeout).ok()
    }
}

async fn command_loop(ctx: PipelineContext, mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>) {
    let mut running: HashMap<RecordId, RunningPipeline> = HashMap::new();

    while let Some(command) = cmd_rx.recv().await {
        running.retain(|_, pipeline| !pipeline.task.is_finished());

        match command {
            EngineCommand::Submit { record_id, file } => {
                ingest_info!(
                    "Submit record_id={} name={:?} size={} mime={:?}",
                    record_id,
                    file.name,
                    file.size_bytes,
                    file.mime_hint
                );
                let cancel = CancellationToken::new();
                let ctx = ctx.clone();
                let token = cancel.clone();
                let task = tokio::spawn(async move {
                    run_pipeline(&ctx, record_id, &file, &token).await;
                });
                if let Some(previous) = running.insert(record_id, RunningPipeline { cancel, task }) {
                    previous.cancel.cancel();
                }
            }
            EngineCommand::Cancel { record_id } => match running.remove(&record_id) {
                Some(pipeline) => pipeline.cancel.cancel(),
                None => ingest_debug!("Cancel for idle record_id={}", record_id),
            },
        }
    }

    // Handle dropped: stop whatever is still in flight.
    for (_, pipeline) in running {
        pipeline.cancel.cancel();
        let _ = pipeline.task.await;
    }
}
