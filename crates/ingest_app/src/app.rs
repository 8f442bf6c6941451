use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use ingest_core::{update, AppState, AppViewModel, FileDescriptor, Msg, RecordId, Status};
use ingest_engine::EngineError;
use ingest_logging::{ingest_debug, ingest_info, ingest_warn};
use serde::Serialize;

use crate::config::{AppConfig, Cli};
use crate::effects::EffectRunner;
use crate::files::describe;
use crate::input::{parse_command, Command, HELP};
use crate::render::{render, render_notice};

const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the main loop reacts to, in arrival order.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    Command(Command),
    InputClosed,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli).context("loading configuration")?;
    ingest_logging::initialize(&config.log);
    ingest_info!("Starting with {:?}", config.pipeline);

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let mut app =
        App::new(&config, tx.clone(), io::stdout()).context("starting pipeline engine")?;

    app.submit_paths(&cli.files)?;
    spawn_stdin_reader(tx.clone());

    // Background tick to coalesce rendering.
    thread::spawn(move || {
        while tx.send(AppEvent::Msg(Msg::Tick)).is_ok() {
            thread::sleep(RENDER_INTERVAL);
        }
    });

    while let Ok(event) = rx.recv() {
        if app.handle(event)? == Flow::Exit {
            break;
        }
    }

    app.render_now()?;
    if config.json {
        app.write_snapshot()?;
    }
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(AppEvent::Command(parse_command(&line))).is_err() {
                return;
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    input_closed: bool,
    /// Row statuses as of the last printed table.
    rendered: Vec<(RecordId, Status)>,
}

impl<W: Write> App<W> {
    pub fn new(
        config: &AppConfig,
        tx: mpsc::Sender<AppEvent>,
        out: W,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            state: AppState::with_policy(config.policy.clone()),
            runner: EffectRunner::new(config.pipeline.clone(), tx)?,
            out,
            input_closed: false,
            rendered: Vec::new(),
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    pub fn handle(&mut self, event: AppEvent) -> anyhow::Result<Flow> {
        match event {
            // Progress ticks alone do not reprint the table; `list` shows it on demand.
            AppEvent::Msg(Msg::Tick) => {
                if self.state.consume_dirty() {
                    let view = self.state.view();
                    if status_signature(&view) != self.rendered {
                        self.write_view(&view)?;
                    }
                }
            }
            AppEvent::Msg(msg) => self.dispatch_msg(msg)?,
            AppEvent::Command(command) => return self.handle_command(command),
            AppEvent::InputClosed => {
                ingest_debug!("Input closed");
                self.input_closed = true;
            }
        }

        if self.input_closed && !self.state.has_pending_work() {
            return Ok(Flow::Exit);
        }
        Ok(Flow::Continue)
    }

    fn handle_command(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Add(paths) => self.submit_paths(&paths)?,
            Command::Remove(name) => self.dispatch_msg(Msg::RemoveClicked { name })?,
            Command::Clear => self.dispatch_msg(Msg::ClearFinished)?,
            Command::List => self.render_now()?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Exit),
            Command::Empty => {}
            Command::Unknown(line) => writeln!(self.out, "unknown command: {line} ({HELP})")?,
        }
        Ok(Flow::Continue)
    }

    pub fn submit_paths(&mut self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut files: Vec<FileDescriptor> = Vec::with_capacity(paths.len());
        for path in paths {
            match describe(path) {
                Ok(file) => files.push(file),
                Err(err) => {
                    ingest_warn!("Skipping {:?}: {:#}", path, err);
                    writeln!(self.out, "skipped {}: {err:#}", path.display())?;
                }
            }
        }
        self.submit(files)
    }

    pub fn submit(&mut self, files: Vec<FileDescriptor>) -> anyhow::Result<()> {
        self.dispatch_msg(Msg::FilesSubmitted(files))
    }

    fn dispatch_msg(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);

        for notice in self.state.take_notices() {
            ingest_info!("{}", render_notice(&notice));
            writeln!(self.out, "{}", render_notice(&notice))?;
        }
        Ok(())
    }

    pub fn render_now(&mut self) -> anyhow::Result<()> {
        let view = self.state.view();
        self.write_view(&view)
    }

    fn write_view(&mut self, view: &AppViewModel) -> anyhow::Result<()> {
        for line in render(view) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.rendered = status_signature(view);
        Ok(())
    }

    pub fn write_snapshot(&mut self) -> anyhow::Result<()> {
        let snapshot = Snapshot::capture(&self.state);
        serde_json::to_writer_pretty(&mut self.out, &snapshot)?;
        writeln!(self.out)?;
        Ok(())
    }
}

fn status_signature(view: &AppViewModel) -> Vec<(RecordId, Status)> {
    view.files.iter().map(|row| (row.id, row.status)).collect()
}

#[derive(Debug, Serialize)]
struct Snapshot {
    generated_utc: String,
    files: Vec<SnapshotFile>,
}

#[derive(Debug, Serialize)]
struct SnapshotFile {
    name: String,
    size_bytes: u64,
    mime_hint: String,
    status: String,
    progress: u8,
    rows: Option<u64>,
    columns: Option<u32>,
}

impl Snapshot {
    fn capture(state: &AppState) -> Self {
        let files = state
            .store()
            .iter()
            .map(|record| SnapshotFile {
                name: record.name.clone(),
                size_bytes: record.size_bytes,
                mime_hint: record.mime_hint.clone(),
                status: format!("{:?}", record.status),
                progress: record.progress,
                rows: record.row_count,
                columns: record.column_count,
            })
            .collect();
        Self {
            generated_utc: Utc::now().to_rfc3339(),
            files,
        }
    }
}
