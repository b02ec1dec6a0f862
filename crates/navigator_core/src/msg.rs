use crate::{JobId, KeyPress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Navigation or a click is about to open the detail view for a row.
    JobOpening {
        index: Option<usize>,
        job: Option<JobId>,
    },
    /// The detail view appeared in the host DOM.
    DetailOpened { content_ready: bool },
    /// A retry found the detail view's panels rendered.
    DetailContentReady,
    /// The reconciler finished enhancing the detail view.
    EnhancementApplied,
    /// The detail view left the host DOM.
    DetailClosed,
    /// The detail view's active tab changed.
    TabChanged { overview: bool },
    /// The host's bulk-action side panel opened with these rows selected.
    BulkPanelOpened { selected: Vec<JobId> },
    BulkPanelClosed,
    /// The bulk panel's save control was clicked; `None` when no shortlist
    /// option could be read from the panel.
    BulkSaveClicked { shortlist_checked: Option<bool> },
    Key(KeyPress),
    /// The star of a listing row was clicked.
    RowStarClicked { job: JobId },
    /// The star of the open detail view was clicked.
    DetailStarClicked,
    /// The user confirmed clearing the whole shortlist.
    ClearAllConfirmed,
    /// The enhancement layer was switched on or off.
    UiToggled(bool),
    /// The floating entry point was clicked.
    OpenFirstRequested,
    NoOp,
}
