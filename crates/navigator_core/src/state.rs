use crate::view_model::StatusView;
use crate::{JobId, NavCursor};

/// Lifecycle of the single detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailPhase {
    #[default]
    Closed,
    Opening,
    /// Rendered by the host, no enhancements applied.
    ContentReady,
    Enhanced,
}

/// Volatile session state. Shortlist and layout live in their own stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: DetailPhase,
    current_job: Option<JobId>,
    cursor: NavCursor,
    ui_enabled: bool,
    side_panel_open: bool,
    bulk_snapshot: Option<Vec<JobId>>,
    dirty: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SessionState {
    pub fn new(ui_enabled: bool) -> Self {
        Self {
            phase: DetailPhase::Closed,
            current_job: None,
            cursor: NavCursor::default(),
            ui_enabled,
            side_panel_open: false,
            bulk_snapshot: None,
            dirty: false,
        }
    }

    pub fn phase(&self) -> DetailPhase {
        self.phase
    }

    pub fn detail_open(&self) -> bool {
        self.phase != DetailPhase::Closed
    }

    /// The job remembered from the action that opened the detail view.
    pub fn current_job(&self) -> Option<&JobId> {
        self.current_job.as_ref()
    }

    pub fn cursor(&self) -> NavCursor {
        self.cursor
    }

    pub fn ui_enabled(&self) -> bool {
        self.ui_enabled
    }

    pub fn side_panel_open(&self) -> bool {
        self.side_panel_open
    }

    pub fn bulk_snapshot(&self) -> Option<&[JobId]> {
        self.bulk_snapshot.as_deref()
    }

    pub fn status(&self, total_rows: usize) -> StatusView {
        let position = match (self.detail_open(), self.cursor.current()) {
            (true, Some(index)) if index < total_rows => Some((index + 1, total_rows)),
            _ => None,
        };
        StatusView { position }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_phase(&mut self, phase: DetailPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    pub(crate) fn begin_opening(&mut self, index: Option<usize>, job: Option<JobId>) {
        if let Some(index) = index {
            self.cursor.set(index);
        }
        self.current_job = job;
        if self.phase == DetailPhase::Closed {
            self.phase = DetailPhase::Opening;
        }
        self.dirty = true;
    }

    pub(crate) fn close_detail(&mut self) {
        self.phase = DetailPhase::Closed;
        self.current_job = None;
        self.dirty = true;
    }

    pub(crate) fn forget_current_job(&mut self) {
        self.current_job = None;
    }

    pub(crate) fn set_ui_enabled(&mut self, enabled: bool) {
        self.ui_enabled = enabled;
        self.dirty = true;
    }

    pub(crate) fn open_side_panel(&mut self, snapshot: Vec<JobId>) {
        self.side_panel_open = true;
        self.bulk_snapshot = Some(snapshot);
    }

    pub(crate) fn close_side_panel(&mut self) {
        self.side_panel_open = false;
        self.bulk_snapshot = None;
    }

    pub(crate) fn take_bulk_snapshot(&mut self) -> Option<Vec<JobId>> {
        self.bulk_snapshot.take()
    }
}
