use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the only path through which the store is mutated, so messages are
/// applied one at a time in arrival order.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSubmitted(files) => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            state
                .submit_files(files)
                .into_iter()
                .map(|(id, file)| Effect::StartPipeline { id, file })
                .collect()
        }
        Msg::RemoveClicked { name } => match state.remove_file(&name) {
            // Finished records have no pipeline left to stop.
            Some(record) if !record.status.is_terminal() => {
                vec![Effect::CancelPipeline { id: record.id }]
            }
            _ => Vec::new(),
        },
        Msg::ClearFinished => {
            state.clear_finished();
            Vec::new()
        }
        Msg::StageChanged {
            id,
            status,
            progress,
        } => {
            // Terminal outcomes only arrive through AnalysisFinished.
            if !status.is_terminal() {
                state.apply_stage(id, status, progress);
            }
            Vec::new()
        }
        Msg::AnalysisFinished { id, result } => {
            state.apply_finished(id, result);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
