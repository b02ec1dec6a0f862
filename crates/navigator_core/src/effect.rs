use crate::{Direction, JobId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Redraw the shortlist star of the open detail view.
    RenderIndicator,
    /// Tear down and rebuild the enhanced panel layout.
    Enhance,
    /// The detail view is not rendered yet; look again after a short delay.
    ScheduleEnhanceRetry,
    /// Remove every enhancement and restore the host's own rendering.
    Teardown,
    Navigate(Direction),
    OpenJob { index: usize },
    CloseDetail,
    CloseSidePanel,
    ToggleShortlistLocal { job: JobId },
    /// Toggle the job shown in the detail view through the host's own folder UI.
    ToggleCurrentShortlist,
    RequestClearAll,
    ClearShortlist,
    BulkSet { jobs: Vec<JobId>, shortlisted: bool },
    PersistUiToggle(bool),
}
