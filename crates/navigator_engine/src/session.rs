use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use navigator_core::{
    update, Column, DetailPhase, Effect, JobId, KeyPress, Msg, SessionState,
};
use navigator_logging::{nav_debug, nav_info, nav_trace, nav_warn, set_dispatch_seq};
use tokio::time::Instant;
use url::Url;

use crate::config::{CompiledProfile, NavigatorConfig, Timing};
use crate::dom::NodeId;
use crate::error::{ConfigError, HostElement, NavigatorError};
use crate::host::{EventDisposition, HostSurface, Notice, NoticeKind};
use crate::identity::JobIdentityResolver;
use crate::layout::LayoutState;
use crate::navigation::{collect_rows, row_index_of, JobRow};
use crate::reconcile::{self, FIELD_COLLAPSE_CLASS, FIELD_NAME_ATTR, PANEL_COLLAPSE_CLASS, PANEL_TITLE_ATTR};
use crate::shortlist::ShortlistState;
use crate::stars;
use crate::store::{KeyValueStore, PersistentStore};
use crate::sync::{close_side_panels, shortlist_option_checked, NativeSync};
use crate::watcher::{content_ready, overview_active, selected_jobs, ChangeWatcher, Debounce, HostEvent, MutationRecord};

const CLEAR_ALL_PROMPT: &str =
    "Clear all shortlisted jobs? This will reset every star to empty.";

/// Work queued while one input is being handled.
#[derive(Default)]
struct Pending {
    msgs: VecDeque<Msg>,
    effects: VecDeque<Effect>,
}

/// One navigator attached to one host page.
///
/// Every entry point bumps the logging dispatch sequence, feeds messages
/// through the core's `update` and executes the resulting effects in order.
pub struct Navigator<S, H> {
    config: NavigatorConfig,
    profile: CompiledProfile,
    host: H,
    store: Rc<PersistentStore<S>>,
    shortlist: ShortlistState<S>,
    layout: LayoutState<S>,
    state: SessionState,
    watcher: ChangeWatcher,
    rows: Vec<JobRow>,
    rescan: Debounce,
    enhance_retry: Debounce,
    retries: u32,
    seq: u64,
    active: bool,
    listing: bool,
}

impl<S: KeyValueStore, H: HostSurface> Navigator<S, H> {
    /// Compiles the host profile and loads the persisted state.
    pub fn new(config: NavigatorConfig, backend: S, host: H) -> Result<Self, ConfigError> {
        let profile = CompiledProfile::compile(&config.profile)?;
        let store = Rc::new(PersistentStore::new(backend, config.storage.clone()));
        let shortlist = ShortlistState::load(Rc::clone(&store));
        let layout = LayoutState::load(Rc::clone(&store));
        let state = SessionState::new(store.load_ui_enabled());
        Ok(Self {
            config,
            profile,
            host,
            store,
            shortlist,
            layout,
            state,
            watcher: ChangeWatcher::new(),
            rows: Vec::new(),
            rescan: Debounce::default(),
            enhance_retry: Debounce::default(),
            retries: 0,
            seq: 0,
            active: false,
            listing: false,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn shortlist(&self) -> &ShortlistState<S> {
        &self.shortlist
    }

    pub fn layout(&self) -> &LayoutState<S> {
        &self.layout
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether table features (row stars, row and side panel watching) are on.
    pub fn is_listing(&self) -> bool {
        self.listing
    }

    /// Earliest pending rescan or enhancement retry, for the driver's timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.rescan.deadline(), self.enhance_retry.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    fn next_seq(&mut self) {
        self.seq += 1;
        set_dispatch_seq(self.seq);
    }

    /// Applies the site and listing gates and scans the page. Returns whether
    /// the navigator activated.
    pub async fn start(&mut self) -> bool {
        self.next_seq();
        let location = self.host.location();
        let url = match Url::parse(&location) {
            Ok(url) => url,
            Err(err) => {
                nav_warn!("Cannot parse page location {:?}: {}", location, err);
                return false;
            }
        };
        let source = &self.profile.source;
        let site_ok = source.site_hosts.is_empty()
            || url
                .host_str()
                .is_some_and(|host| source.site_hosts.iter().any(|known| known == host));
        if !site_ok {
            nav_info!("Navigator inactive on {}", location);
            return false;
        }
        let doc = self.host.document();
        self.listing = source
            .listing_paths
            .iter()
            .any(|path| url.path().contains(path.as_str()))
            || self.profile.table.select_first(doc, doc.root()).is_some();
        self.active = true;
        nav_info!(
            "Navigator active on {} (listing = {}, {} shortlisted)",
            location,
            self.listing,
            self.shortlist.set().len()
        );

        stars::render_controls(self.host.document_mut(), self.state.ui_enabled());
        self.rescan_rows();
        let events = self
            .watcher
            .sync(self.host.document(), &self.profile, self.listing);
        for msg in self.absorb(events) {
            self.dispatch(msg).await;
        }
        true
    }

    /// Routes one batch of host DOM changes.
    pub async fn handle_mutations(&mut self, records: Vec<MutationRecord>) {
        if !self.active {
            return;
        }
        self.next_seq();
        nav_trace!("Mutation batch of {} records", records.len());
        for msg in self.observe(&records) {
            self.dispatch(msg).await;
        }
    }

    pub async fn handle_key(&mut self, press: KeyPress) -> EventDisposition {
        if !self.active {
            return EventDisposition::Default;
        }
        self.next_seq();
        if self.dispatch(Msg::Key(press)).await > 0 {
            EventDisposition::Suppress
        } else {
            EventDisposition::Default
        }
    }

    /// Routes a click on `target`. Navigator controls suppress the host's own
    /// handling; everything else is observed and passed through.
    pub async fn handle_click(&mut self, target: NodeId) -> EventDisposition {
        if !self.active {
            return EventDisposition::Default;
        }
        self.next_seq();
        let doc = self.host.document();

        if let Some(job) = stars::row_star_job(doc, target) {
            self.dispatch(Msg::RowStarClicked { job }).await;
            return EventDisposition::Suppress;
        }
        if stars::within_id(doc, target, stars::DETAIL_STAR_ID).is_some() {
            self.dispatch(Msg::DetailStarClicked).await;
            return EventDisposition::Suppress;
        }
        if stars::within_id(doc, target, stars::OPEN_FIRST_ID).is_some() {
            self.dispatch(Msg::OpenFirstRequested).await;
            return EventDisposition::Suppress;
        }
        if stars::within_id(doc, target, stars::UI_TOGGLE_ID).is_some() {
            let enabled = !self.state.ui_enabled();
            self.dispatch(Msg::UiToggled(enabled)).await;
            return EventDisposition::Suppress;
        }
        if let Some(button) = doc.closest_where(target, |node| doc.has_class(node, PANEL_COLLAPSE_CLASS)) {
            if let Some(panel) = doc.attr(button, PANEL_TITLE_ATTR).map(str::to_string) {
                let collapsed = self.layout.toggle_panel_collapsed(&panel);
                nav_debug!("Panel {:?} collapsed = {}", panel, collapsed);
                self.refresh_layout();
            }
            return EventDisposition::Suppress;
        }
        if let Some(button) = doc.closest_where(target, |node| doc.has_class(node, FIELD_COLLAPSE_CLASS)) {
            let panel = doc.attr(button, PANEL_TITLE_ATTR).map(str::to_string);
            let field = doc.attr(button, FIELD_NAME_ATTR).map(str::to_string);
            if let (Some(panel), Some(field)) = (panel, field) {
                let collapsed = self.layout.toggle_field_collapsed(&panel, &field);
                nav_debug!("Field {:?}/{:?} collapsed = {}", panel, field, collapsed);
                self.refresh_layout();
            }
            return EventDisposition::Suppress;
        }

        if !self.listing {
            return EventDisposition::Default;
        }
        if self.state.side_panel_open() {
            if let Some(checked) = self.bulk_save_target(target) {
                self.dispatch(Msg::BulkSaveClicked {
                    shortlist_checked: checked,
                })
                .await;
                return EventDisposition::Default;
            }
        }
        let doc = self.host.document();
        if self.profile.pagination_link.closest(doc, target).is_some() {
            let delay = Timing::ms(self.config.timing.pagination_rescan_ms);
            self.rescan.schedule(Instant::now() + delay);
            return EventDisposition::Default;
        }
        let rows = collect_rows(doc, &self.profile);
        let opened =
            row_index_of(doc, &rows, target).filter(|index| doc.contains(rows[*index].link, target));
        if let Some(index) = opened {
            let job = JobIdentityResolver::new(&self.profile)
                .resolve(doc, rows[index].row)
                .ok();
            self.rows = rows;
            self.dispatch(Msg::JobOpening {
                index: Some(index),
                job,
            })
            .await;
        }
        EventDisposition::Default
    }

    /// Fires due rescans and enhancement retries.
    pub async fn tick(&mut self, now: Instant) {
        if !self.active {
            return;
        }
        let rescan_due = self.rescan.fire(now);
        let retry_due = self.enhance_retry.fire(now);
        if !rescan_due && !retry_due {
            return;
        }
        self.next_seq();
        if rescan_due {
            self.rescan_rows();
        }
        if retry_due {
            self.retry_enhance(now).await;
        }
    }

    /// Opens the first job of the listing.
    pub async fn open_first(&mut self) {
        if !self.active {
            return;
        }
        self.next_seq();
        self.dispatch(Msg::OpenFirstRequested).await;
    }

    pub async fn set_ui_enabled(&mut self, enabled: bool) {
        if !self.active {
            return;
        }
        self.next_seq();
        self.dispatch(Msg::UiToggled(enabled)).await;
    }

    /// Moves a panel to `index` of the on-screen order and stores the order.
    pub fn reorder_panel(&mut self, panel: &str, index: usize) -> bool {
        self.next_seq();
        let mut current = reconcile::panel_order(self.host.document(), &self.profile);
        if current.is_empty() {
            current = self.layout.layout().section_order().to_vec();
        }
        let changed = self.layout.move_panel(&current, panel, index);
        if changed {
            nav_debug!("Panel {:?} moved to {}", panel, index);
            self.refresh_layout();
        }
        changed
    }

    pub fn reorder_field(&mut self, panel: &str, field: &str, column: Column, index: usize) -> bool {
        self.next_seq();
        let changed = self.layout.move_field(panel, field, column, index);
        if changed {
            nav_debug!("Field {:?}/{:?} moved to {:?} {}", panel, field, column, index);
            self.refresh_layout();
        }
        changed
    }

    pub fn set_dual_column(&mut self, panel: &str, enabled: bool) -> bool {
        self.next_seq();
        let changed = self.layout.set_dual_column(panel, enabled);
        if changed {
            self.refresh_layout();
        }
        changed
    }

    fn step(&mut self, msg: Msg) -> Vec<Effect> {
        nav_trace!("Msg {:?}", msg);
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }

    /// Runs `msg` and everything it leads to. Returns the number of effects executed.
    async fn dispatch(&mut self, msg: Msg) -> usize {
        let mut pending = Pending::default();
        pending.msgs.push_back(msg);
        let mut executed = 0;
        loop {
            if let Some(effect) = pending.effects.pop_front() {
                executed += 1;
                self.execute(effect, &mut pending).await;
                continue;
            }
            let Some(msg) = pending.msgs.pop_front() else {
                break;
            };
            let effects = self.step(msg);
            pending.effects.extend(effects);
        }
        if self.state.consume_dirty() {
            let label = self.state.status(self.rows.len()).label();
            stars::render_status(self.host.document_mut(), label.as_deref());
        }
        executed
    }

    async fn execute(&mut self, effect: Effect, pending: &mut Pending) {
        nav_trace!("Effect {:?}", effect);
        match effect {
            Effect::RenderIndicator => self.render_indicator(),
            Effect::Enhance => self.enhance(pending),
            Effect::ScheduleEnhanceRetry => {
                self.retries = 0;
                let delay = Timing::ms(self.config.timing.detail_retry_ms);
                self.enhance_retry.schedule(Instant::now() + delay);
            }
            Effect::Teardown => {
                let removed = reconcile::teardown(self.host.document_mut());
                nav_debug!("Restored host rendering ({} panels removed)", removed);
            }
            Effect::Navigate(direction) => {
                self.rows = collect_rows(self.host.document(), &self.profile);
                match self.state.cursor().step(self.rows.len(), direction) {
                    Some(index) => self.open_job(index, pending).await,
                    None => nav_debug!("No job rows to navigate"),
                }
            }
            Effect::OpenJob { index } => {
                self.rows = collect_rows(self.host.document(), &self.profile);
                self.open_job(index, pending).await;
            }
            Effect::CloseDetail => self.close_detail(),
            Effect::CloseSidePanel => {
                let closed = close_side_panels(&mut self.host, &self.profile);
                nav_debug!("Clicked {} side panel close controls", closed);
            }
            Effect::ToggleShortlistLocal { job } => {
                let shortlisted = self.shortlist.toggle_local(&job);
                stars::refresh_row_stars(self.host.document_mut(), self.shortlist.set());
                self.host.notify(shortlist_notice(shortlisted));
                if self.state.detail_open() {
                    pending.effects.push_back(Effect::RenderIndicator);
                }
            }
            Effect::ToggleCurrentShortlist => self.toggle_current(pending).await,
            Effect::RequestClearAll => {
                if self.host.confirm(CLEAR_ALL_PROMPT) {
                    pending.msgs.push_back(Msg::ClearAllConfirmed);
                } else {
                    nav_debug!("Clearing the shortlist was cancelled");
                }
            }
            Effect::ClearShortlist => {
                self.shortlist.clear_all();
                stars::refresh_row_stars(self.host.document_mut(), self.shortlist.set());
                self.host
                    .notify(Notice::new(NoticeKind::Info, "All shortlists cleared"));
            }
            Effect::BulkSet { jobs, shortlisted } => {
                let changed = self.shortlist.bulk_set(&jobs, shortlisted);
                stars::refresh_row_stars(self.host.document_mut(), self.shortlist.set());
                let message = if shortlisted {
                    format!("Shortlisted {} jobs", jobs.len())
                } else {
                    format!("Removed {} jobs from shortlist", jobs.len())
                };
                nav_info!("{} ({} changed)", message, changed);
                self.host.notify(Notice::new(NoticeKind::Info, message));
            }
            Effect::PersistUiToggle(enabled) => {
                if let Err(err) = self.store.save_ui_enabled(enabled) {
                    nav_warn!("Failed to persist ui flag: {}", err);
                }
                stars::render_controls(self.host.document_mut(), enabled);
            }
        }
    }

    /// Translates a batch into messages, handling row events directly.
    fn observe(&mut self, records: &[MutationRecord]) -> Vec<Msg> {
        let events = self
            .watcher
            .observe(self.host.document(), &self.profile, records, self.listing);
        self.absorb(events)
    }

    fn absorb(&mut self, events: Vec<HostEvent>) -> Vec<Msg> {
        let mut msgs = Vec::new();
        for event in events {
            nav_trace!("Host event {:?}", event);
            match event {
                HostEvent::RowsReplaced => {
                    let delay = Timing::ms(self.config.timing.row_rescan_debounce_ms);
                    self.rescan.schedule(Instant::now() + delay);
                }
                HostEvent::RowsAdded(rows) => {
                    self.star_rows(&rows);
                    self.rows = collect_rows(self.host.document(), &self.profile);
                }
                HostEvent::DetailOpened { content_ready, .. } => {
                    self.enhance_retry.cancel();
                    msgs.push(Msg::DetailOpened { content_ready });
                }
                HostEvent::DetailClosed => {
                    self.enhance_retry.cancel();
                    msgs.push(Msg::DetailClosed);
                }
                HostEvent::TabChanged { overview } => msgs.push(Msg::TabChanged { overview }),
                HostEvent::BulkPanelOpened { .. } => {
                    let selected = selected_jobs(self.host.document(), &self.profile);
                    nav_debug!("Bulk panel opened with {} selected jobs", selected.len());
                    msgs.push(Msg::BulkPanelOpened { selected });
                }
                HostEvent::BulkPanelClosed => msgs.push(Msg::BulkPanelClosed),
            }
        }
        msgs
    }

    /// The shortlist option state when `target` is the side panel's save control.
    fn bulk_save_target(&self, target: NodeId) -> Option<Option<bool>> {
        let doc = self.host.document();
        let panel = self.profile.side_panel.select_first(doc, doc.root())?;
        let button = self.profile.button.closest(doc, target)?;
        if !doc.contains(panel, button) {
            return None;
        }
        let wanted = self.profile.source.save_text.to_lowercase();
        if doc.text_content(button).trim().to_lowercase() != wanted {
            return None;
        }
        Some(shortlist_option_checked(doc, &self.profile, panel))
    }

    fn rescan_rows(&mut self) {
        if !self.listing {
            return;
        }
        let rows = collect_rows(self.host.document(), &self.profile);
        stars::remove_row_stars(self.host.document_mut());
        let starred = self.star_rows(&rows.iter().map(|row| row.row).collect::<Vec<_>>());
        nav_debug!("Rescanned {} rows, {} starred", rows.len(), starred);
        self.rows = rows;
    }

    /// Stars every row whose job id resolves; returns how many were starred.
    fn star_rows(&mut self, rows: &[NodeId]) -> usize {
        let resolver = JobIdentityResolver::new(&self.profile);
        let mut starred = 0;
        for row in rows {
            match resolver.resolve(self.host.document(), *row) {
                Ok(job) => {
                    let shortlisted = self.shortlist.is_shortlisted(&job);
                    stars::attach_row_star(self.host.document_mut(), &self.profile, *row, &job, shortlisted);
                    starred += 1;
                }
                Err(err) => nav_trace!("Row skipped: {}", err),
            }
        }
        starred
    }

    fn current_job(&self) -> Result<JobId, NavigatorError> {
        JobIdentityResolver::new(&self.profile).resolve_current(
            self.host.document(),
            self.state.current_job(),
            &self.rows,
            self.state.cursor().current(),
        )
    }

    fn render_indicator(&mut self) {
        let doc = self.host.document();
        let detail_present = self.profile.detail_root.select_first(doc, doc.root()).is_some();
        let job = if self.state.detail_open() && detail_present {
            match self.current_job() {
                Ok(job) => Some(job),
                Err(err) => {
                    nav_debug!("No star for the detail view: {}", err);
                    None
                }
            }
        } else {
            None
        };
        let entry = job
            .as_ref()
            .map(|job| (job, self.shortlist.is_shortlisted(job)));
        stars::render_detail_star(self.host.document_mut(), &self.profile, entry);
    }

    fn enhance(&mut self, pending: &mut Pending) {
        if !self.state.ui_enabled() {
            return;
        }
        if !overview_active(self.host.document(), &self.profile) {
            nav_debug!("Overview tab not active, enhancement skipped");
            return;
        }
        match reconcile::enhance(self.host.document_mut(), &self.profile, &mut self.layout) {
            Some(report) => {
                nav_info!("Enhanced detail view: {:?}", report.panels);
                pending.msgs.push_back(Msg::EnhancementApplied);
            }
            None => nav_debug!("No detail view to enhance"),
        }
    }

    /// Rebuilds the enhanced layout after a layout preference changed.
    fn refresh_layout(&mut self) {
        if self.state.phase() == DetailPhase::Enhanced {
            reconcile::enhance(self.host.document_mut(), &self.profile, &mut self.layout);
        }
    }

    async fn retry_enhance(&mut self, now: Instant) {
        if self.state.phase() != DetailPhase::Opening {
            return;
        }
        let doc = self.host.document();
        let ready = self
            .profile
            .detail_root
            .select_first(doc, doc.root())
            .is_some_and(|detail| content_ready(doc, &self.profile, detail));
        if ready {
            self.dispatch(Msg::DetailContentReady).await;
            return;
        }
        self.retries += 1;
        if self.retries < self.config.timing.detail_max_retries {
            let delay = Timing::ms(self.config.timing.detail_retry_ms);
            self.enhance_retry.schedule(now + delay);
        } else {
            nav_warn!(
                "Detail view content not ready after {} retries",
                self.retries
            );
        }
    }

    async fn open_job(&mut self, index: usize, pending: &mut Pending) {
        let Some(row) = self.rows.get(index).copied() else {
            nav_debug!("Row {} out of range ({} rows)", index, self.rows.len());
            return;
        };
        let doc = self.host.document();
        let detail_present = self.profile.detail_root.select_first(doc, doc.root()).is_some();
        if self.state.detail_open() || detail_present {
            self.close_detail();
            self.host
                .sleep(Timing::ms(self.config.timing.reopen_settle_ms))
                .await;
            let records = self.host.next_mutations(Duration::ZERO).await;
            for msg in self.observe(&records) {
                let effects = self.step(msg);
                pending.effects.extend(effects);
            }
        }
        let job = match JobIdentityResolver::new(&self.profile).resolve(self.host.document(), row.row) {
            Ok(job) => Some(job),
            Err(err) => {
                nav_debug!("Opening row {} without a job id: {}", index, err);
                None
            }
        };
        nav_info!("Opening job {} ({:?})", index + 1, job);
        let effects = self.step(Msg::JobOpening {
            index: Some(index),
            job,
        });
        pending.effects.extend(effects);
        self.host.click(row.link);
    }

    fn close_detail(&mut self) {
        let doc = self.host.document();
        let scope = self
            .profile
            .detail_root
            .select_first(doc, doc.root())
            .unwrap_or(doc.root());
        let button = self
            .profile
            .close_detail
            .first(doc, scope)
            .or_else(|| self.profile.close_detail.first(doc, doc.root()));
        match button {
            Some(button) => self.host.click(button),
            None => nav_warn!(
                "{}",
                NavigatorError::HostElementNotFound {
                    element: HostElement::CloseButton
                }
            ),
        }
    }

    async fn toggle_current(&mut self, pending: &mut Pending) {
        let job = match self.current_job() {
            Ok(job) => job,
            Err(err) => {
                nav_debug!("Shortlist toggle skipped: {}", err);
                return;
            }
        };
        let mut backlog = Vec::new();
        let result = {
            let mut sync = NativeSync::new(
                &mut self.host,
                &self.profile,
                &self.config.timing,
                &mut backlog,
            );
            self.shortlist.toggle_with_host_sync(&mut sync, &job).await
        };
        match result {
            Ok(shortlisted) => {
                stars::refresh_row_stars(self.host.document_mut(), self.shortlist.set());
                self.host.notify(shortlist_notice(shortlisted));
            }
            Err(err) => {
                if let Some(message) = err.notice() {
                    self.host.notify(Notice::new(NoticeKind::Error, message));
                }
            }
        }
        // The wait may have outlived the detail view it was started from.
        if self.state.detail_open() {
            pending.effects.push_back(Effect::RenderIndicator);
        }
        let msgs = self.observe(&backlog);
        pending.msgs.extend(msgs);
    }
}

fn shortlist_notice(shortlisted: bool) -> Notice {
    if shortlisted {
        Notice::new(NoticeKind::Added, "Added to shortlist")
    } else {
        Notice::new(NoticeKind::Removed, "Removed from shortlist")
    }
}
