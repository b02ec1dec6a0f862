//! Shortlist changes made through the host's own folder side panel.
use navigator_core::JobId;
use navigator_logging::{nav_debug, nav_info, nav_warn};

use crate::config::{CompiledProfile, Timing};
use crate::dom::{Document, NodeId};
use crate::error::{HostElement, NavigatorError};
use crate::host::HostSurface;
use crate::identity::JobIdentityResolver;
use crate::navigation::collect_rows;
use crate::wait::wait_for;
use crate::watcher::MutationRecord;

/// Levels walked up from the option text looking for its checkbox.
const OPTION_SEARCH_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    RowSelected,
    PanelOpened,
    OptionLocated,
    CheckboxSet,
    Saved,
    Done,
    Failed,
}

/// One run of the host folder workflow for a single job.
pub struct NativeSync<'a, H: ?Sized> {
    host: &'a mut H,
    profile: &'a CompiledProfile,
    timing: &'a Timing,
    backlog: &'a mut Vec<MutationRecord>,
    phase: SyncPhase,
}

impl<'a, H: HostSurface + ?Sized> NativeSync<'a, H> {
    pub fn new(
        host: &'a mut H,
        profile: &'a CompiledProfile,
        timing: &'a Timing,
        backlog: &'a mut Vec<MutationRecord>,
    ) -> Self {
        Self {
            host,
            profile,
            timing,
            backlog,
            phase: SyncPhase::Idle,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Makes the host's shortlist folder membership of `job` equal `shortlisted`.
    pub async fn run(&mut self, job: &JobId, shortlisted: bool) -> Result<(), NavigatorError> {
        nav_info!("Native sync of {} -> {}", job, shortlisted);
        let result = if self.host.supports_favourite() {
            self.host.toggle_favourite(job, shortlisted).await
        } else {
            self.drive(job, shortlisted).await
        };
        match &result {
            Ok(()) => self.advance(SyncPhase::Done),
            Err(err) => {
                nav_warn!("Native sync failed in {:?}: {}", self.phase, err);
                self.advance(SyncPhase::Failed);
            }
        }
        result
    }

    fn advance(&mut self, phase: SyncPhase) {
        nav_debug!("Native sync {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    async fn drive(&mut self, job: &JobId, shortlisted: bool) -> Result<(), NavigatorError> {
        let profile = self.profile;
        let row = self.find_row(job)?;

        let checkbox = profile.selection_checkbox.select_first(self.host.document(), row);
        match checkbox {
            Some(checkbox) if !self.host.document().is_checked(checkbox) => {
                self.host.set_checked(checkbox, true);
                self.host.sleep(Timing::ms(self.timing.select_settle_ms)).await;
            }
            Some(_) => {}
            None => nav_debug!("Row of {} has no selection checkbox", job),
        }
        self.advance(SyncPhase::RowSelected);

        let button = self.find_folder_button(row).await?;
        if profile
            .side_panel
            .select_first(self.host.document(), self.host.document().root())
            .is_some()
        {
            close_side_panels(self.host, profile);
            self.host.sleep(Timing::ms(self.timing.close_panel_settle_ms)).await;
        }
        self.host.click(button);

        let panel_wait = Timing::ms(self.timing.panel_wait_ms);
        let poll = Timing::ms(self.timing.poll_interval_ms);
        let side_panel = &profile.side_panel;
        let panel = wait_for(self.host, panel_wait, poll, self.backlog, |doc| {
            side_panel.select_first(doc, doc.root())
        })
        .await
        .ok_or(NavigatorError::HostTimeout {
            element: HostElement::SidePanel,
            waited: panel_wait,
        })?;
        self.advance(SyncPhase::PanelOpened);

        if let Err(err) = check_titles(self.host.document(), profile, panel) {
            close_side_panels(self.host, profile);
            return Err(err);
        }

        let option_wait = Timing::ms(self.timing.option_wait_ms);
        let found = wait_for(self.host, option_wait, poll, self.backlog, |doc| {
            let panel = side_panel.select_first(doc, doc.root())?;
            let text = find_option_text(doc, profile, panel)?;
            Some((panel, text))
        })
        .await;
        let Some((panel, text)) = found else {
            close_side_panels(self.host, profile);
            return Err(NavigatorError::HostTimeout {
                element: HostElement::ShortlistOption,
                waited: option_wait,
            });
        };
        let Some(option) = option_checkbox(self.host.document(), profile, panel, text) else {
            close_side_panels(self.host, profile);
            return Err(NavigatorError::HostElementNotFound {
                element: HostElement::ShortlistOption,
            });
        };
        self.advance(SyncPhase::OptionLocated);

        if self.host.document().is_checked(option) != shortlisted {
            self.host.click(option);
            self.host.sleep(Timing::ms(self.timing.checkbox_settle_ms)).await;
        }
        self.advance(SyncPhase::CheckboxSet);

        match find_save_button(self.host.document(), profile) {
            Some(save) => {
                self.host.click(save);
                self.host.sleep(Timing::ms(self.timing.save_settle_ms)).await;
            }
            // Some folder panels save on their own.
            None => nav_warn!(
                "{}",
                NavigatorError::HostElementNotFound {
                    element: HostElement::SaveButton
                }
            ),
        }
        self.advance(SyncPhase::Saved);
        Ok(())
    }

    fn find_row(&self, job: &JobId) -> Result<NodeId, NavigatorError> {
        let doc = self.host.document();
        let resolver = JobIdentityResolver::new(self.profile);
        collect_rows(doc, self.profile)
            .into_iter()
            .find(|row| resolver.resolve(doc, row.row).is_ok_and(|id| &id == job))
            .map(|row| row.row)
            .ok_or(NavigatorError::HostElementNotFound {
                element: HostElement::JobRow,
            })
    }

    async fn find_folder_button(&mut self, row: NodeId) -> Result<NodeId, NavigatorError> {
        let attempts = self.timing.folder_button_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(button) = folder_button(self.host.document(), self.profile, row) {
                return Ok(button);
            }
            nav_debug!("Folder button not found (attempt {}/{})", attempt, attempts);
            if attempt < attempts {
                self.host.sleep(Timing::ms(self.timing.folder_retry_ms)).await;
            }
        }
        Err(NavigatorError::HostElementNotFound {
            element: HostElement::FolderButton,
        })
    }
}

fn trimmed_text(doc: &Document, node: NodeId) -> String {
    doc.text_content(node).trim().to_string()
}

fn check_titles(doc: &Document, profile: &CompiledProfile, panel: NodeId) -> Result<(), NavigatorError> {
    let Some(found) = profile
        .side_panel_title
        .select_first(doc, panel)
        .map(|title| trimmed_text(doc, title))
        .filter(|title| !title.is_empty())
    else {
        return Ok(());
    };
    let expected = profile
        .detail_root
        .select_first(doc, doc.root())
        .and_then(|detail| profile.detail_title.select_first(doc, detail))
        .map(|title| trimmed_text(doc, title))
        .unwrap_or_default();
    if found == expected {
        Ok(())
    } else {
        Err(NavigatorError::TitleMismatch { expected, found })
    }
}

/// First folder action button: in the row, then the detail view, then the page.
fn folder_button(doc: &Document, profile: &CompiledProfile, row: NodeId) -> Option<NodeId> {
    let source = &profile.source;
    let hint = source.folder_aria_hint.to_lowercase();
    let is_folder_button = |button: NodeId| {
        let icon = profile
            .folder_icon
            .select_first(doc, button)
            .map(|icon| trimmed_text(doc, icon));
        let icon_matches = icon.is_some_and(|icon| source.folder_icon_texts.contains(&icon));
        let aria_matches = doc
            .attr(button, "aria-label")
            .is_some_and(|label| label.to_lowercase().contains(&hint));
        icon_matches || aria_matches
    };
    let detail = profile.detail_root.select_first(doc, doc.root());
    [Some(row), detail, Some(doc.root())]
        .into_iter()
        .flatten()
        .find_map(|scope| {
            profile
                .button
                .select(doc, scope)
                .into_iter()
                .find(|button| is_folder_button(*button))
        })
}

/// The element naming the shortlist option inside the side panel.
pub fn find_option_text(doc: &Document, profile: &CompiledProfile, panel: NodeId) -> Option<NodeId> {
    let wanted = profile.source.shortlist_option_text.to_lowercase();
    let matches = |node: &NodeId| trimmed_text(doc, *node).to_lowercase() == wanted;
    profile
        .option_label
        .select(doc, panel)
        .into_iter()
        .find(matches)
        .or_else(|| {
            doc.descendant_elements(panel)
                .into_iter()
                .filter(|node| doc.tag(*node) == Some("p"))
                .find(matches)
        })
        .or_else(|| {
            doc.descendant_elements(panel)
                .into_iter()
                .find(|node| doc.own_text(*node).to_lowercase() == wanted)
        })
}

/// The checkbox belonging to the option text, searched a few levels up
/// from the text and then through labels mentioning the option.
pub fn option_checkbox(
    doc: &Document,
    profile: &CompiledProfile,
    panel: NodeId,
    text: NodeId,
) -> Option<NodeId> {
    let mut scope = text;
    for _ in 0..OPTION_SEARCH_DEPTH {
        if let Some(checkbox) = profile.checkbox.select_first(doc, scope) {
            return Some(checkbox);
        }
        match doc.parent(scope) {
            Some(parent) if doc.contains(panel, parent) => scope = parent,
            _ => break,
        }
    }
    let wanted = profile.source.shortlist_option_text.to_lowercase();
    profile
        .checkbox
        .select(doc, panel)
        .into_iter()
        .find(|checkbox| {
            profile
                .label
                .closest(doc, *checkbox)
                .is_some_and(|label| trimmed_text(doc, label).to_lowercase().contains(&wanted))
        })
}

/// Checked state of the side panel's shortlist option, if it can be found.
pub fn shortlist_option_checked(doc: &Document, profile: &CompiledProfile, panel: NodeId) -> Option<bool> {
    let text = find_option_text(doc, profile, panel)?;
    let checkbox = option_checkbox(doc, profile, panel, text)?;
    Some(doc.is_checked(checkbox))
}

/// A button whose whole text is the save text, preferring the side panel.
pub fn find_save_button(doc: &Document, profile: &CompiledProfile) -> Option<NodeId> {
    let wanted = profile.source.save_text.to_lowercase();
    let is_save = |button: &NodeId| trimmed_text(doc, *button).to_lowercase() == wanted;
    let panel = profile.side_panel.select_first(doc, doc.root());
    panel
        .and_then(|panel| profile.button.select(doc, panel).into_iter().find(is_save))
        .or_else(|| profile.button.select(doc, doc.root()).into_iter().find(is_save))
}

/// Clicks the close controls of open side panels. Returns how many were clicked.
pub fn close_side_panels<H: HostSurface + ?Sized>(host: &mut H, profile: &CompiledProfile) -> usize {
    let doc = host.document();
    let mut buttons: Vec<NodeId> = Vec::new();
    for panel in profile.side_panel.select(doc, doc.root()) {
        if let Some((_, found)) = profile.close_side_panel.select_first_nonempty(doc, panel) {
            buttons.extend(found);
        }
    }
    if buttons.is_empty() {
        let detail = profile.detail_root.select_first(doc, doc.root());
        if let Some((_, found)) = profile.close_side_panel.select_first_nonempty(doc, doc.root()) {
            buttons.extend(
                found
                    .into_iter()
                    .filter(|button| !detail.is_some_and(|detail| doc.contains(detail, *button))),
            );
        }
    }
    for button in &buttons {
        host.click(*button);
    }
    buttons.len()
}
