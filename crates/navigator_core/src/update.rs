use crate::{bind_key, DetailPhase, Direction, Effect, KeyCommand, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobOpening { index, job } => {
            state.begin_opening(index, job);
            Vec::new()
        }
        Msg::DetailOpened { content_ready } => {
            if matches!(state.phase(), DetailPhase::ContentReady | DetailPhase::Enhanced) {
                // Repeated delivery of the same appearance.
                return (state, vec![Effect::RenderIndicator]);
            }
            // The star goes in first so the view never shows a stale state.
            let mut effects = vec![Effect::RenderIndicator];
            if !state.ui_enabled() {
                state.set_phase(DetailPhase::ContentReady);
            } else if content_ready {
                state.set_phase(DetailPhase::ContentReady);
                effects.push(Effect::Enhance);
            } else {
                state.set_phase(DetailPhase::Opening);
                effects.push(Effect::ScheduleEnhanceRetry);
            }
            effects
        }
        Msg::DetailContentReady => {
            if state.phase() != DetailPhase::Opening {
                return (state, Vec::new());
            }
            state.set_phase(DetailPhase::ContentReady);
            if state.ui_enabled() {
                vec![Effect::Enhance]
            } else {
                Vec::new()
            }
        }
        Msg::EnhancementApplied => {
            if state.phase() == DetailPhase::ContentReady {
                state.set_phase(DetailPhase::Enhanced);
            }
            Vec::new()
        }
        Msg::DetailClosed => {
            state.close_detail();
            Vec::new()
        }
        Msg::TabChanged { overview } => {
            if !state.detail_open() {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if overview {
                if state.ui_enabled() && state.phase() != DetailPhase::Enhanced {
                    state.set_phase(DetailPhase::ContentReady);
                    effects.push(Effect::Enhance);
                }
            } else if state.phase() == DetailPhase::Enhanced {
                state.set_phase(DetailPhase::ContentReady);
                effects.push(Effect::Teardown);
            }
            effects.push(Effect::RenderIndicator);
            effects
        }
        Msg::BulkPanelOpened { selected } => {
            state.open_side_panel(selected);
            Vec::new()
        }
        Msg::BulkPanelClosed => {
            state.close_side_panel();
            Vec::new()
        }
        Msg::BulkSaveClicked { shortlist_checked } => {
            // One-shot: the snapshot is consumed even when the option is unreadable.
            match (state.take_bulk_snapshot(), shortlist_checked) {
                (Some(jobs), Some(shortlisted)) if !jobs.is_empty() => {
                    vec![Effect::BulkSet { jobs, shortlisted }, Effect::RenderIndicator]
                }
                _ => Vec::new(),
            }
        }
        Msg::Key(press) => match bind_key(&press) {
            Some(KeyCommand::Escape) => {
                if state.side_panel_open() {
                    vec![Effect::CloseSidePanel]
                } else if state.detail_open() {
                    state.forget_current_job();
                    vec![Effect::CloseDetail]
                } else {
                    Vec::new()
                }
            }
            Some(_) if !state.detail_open() || press.in_editable => Vec::new(),
            Some(KeyCommand::Previous) => vec![Effect::Navigate(Direction::Previous)],
            Some(KeyCommand::Next) => vec![Effect::Navigate(Direction::Next)],
            Some(KeyCommand::ToggleShortlist) => vec![Effect::ToggleCurrentShortlist],
            Some(KeyCommand::ClearAll) => vec![Effect::RequestClearAll],
            None => Vec::new(),
        },
        Msg::RowStarClicked { job } => vec![Effect::ToggleShortlistLocal { job }],
        Msg::DetailStarClicked => {
            if state.detail_open() {
                vec![Effect::ToggleCurrentShortlist]
            } else {
                Vec::new()
            }
        }
        Msg::ClearAllConfirmed => vec![Effect::ClearShortlist, Effect::RenderIndicator],
        Msg::UiToggled(enabled) => {
            if enabled == state.ui_enabled() {
                return (state, Vec::new());
            }
            state.set_ui_enabled(enabled);
            let mut effects = vec![Effect::PersistUiToggle(enabled)];
            if state.detail_open() {
                if enabled {
                    state.set_phase(DetailPhase::ContentReady);
                    effects.push(Effect::Enhance);
                } else {
                    state.set_phase(DetailPhase::ContentReady);
                    effects.push(Effect::Teardown);
                }
            }
            effects
        }
        Msg::OpenFirstRequested => vec![Effect::OpenJob { index: 0 }],
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
