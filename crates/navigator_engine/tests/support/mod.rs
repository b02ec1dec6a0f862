#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use navigator_core::JobId;
use navigator_engine::{
    Document, HostSurface, MemoryStore, MutationRecord, NavigatorConfig, Navigator,
    NavigatorError, NodeId, Notice, Selector,
};
use tokio::time::Instant;

pub const LISTING_URL: &str = "https://waterlooworks.uwaterloo.ca/myAccount/co-op/full/jobs.htm";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(navigator_logging::initialize_for_tests);
}

type Reaction = Box<dyn FnMut(&mut Document, NodeId) -> Vec<MutationRecord>>;

struct ClickRule {
    selector: Selector,
    delay: Duration,
    react: Reaction,
}

struct Scheduled {
    due: Instant,
    rule: usize,
    target: NodeId,
}

/// A fake page: clicks run scripted reactions (immediately or after a delay)
/// and the resulting records are handed out by `next_mutations`.
pub struct ScriptedHost {
    pub doc: Document,
    pub location: String,
    pub clicks: Vec<NodeId>,
    pub notices: Vec<Notice>,
    pub prompts: Vec<String>,
    pub confirm_answer: bool,
    /// When set, the page offers its own favourite toggle and records calls here.
    pub favourites: Option<Vec<(JobId, bool)>>,
    rules: Vec<ClickRule>,
    scheduled: Vec<Scheduled>,
    ready: VecDeque<MutationRecord>,
}

impl ScriptedHost {
    pub fn new(html: &str) -> Self {
        Self {
            doc: Document::parse(html),
            location: LISTING_URL.to_string(),
            clicks: Vec::new(),
            notices: Vec::new(),
            prompts: Vec::new(),
            confirm_answer: true,
            favourites: None,
            rules: Vec::new(),
            scheduled: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    /// Runs `react` for clicks at or inside an element matching `selector`.
    pub fn on_click(
        &mut self,
        selector: &str,
        delay: Duration,
        react: impl FnMut(&mut Document, NodeId) -> Vec<MutationRecord> + 'static,
    ) {
        self.rules.push(ClickRule {
            selector: Selector::parse(selector).expect("valid selector"),
            delay,
            react: Box::new(react),
        });
    }

    /// Queues records as if the page changed on its own.
    pub fn push_records(&mut self, records: Vec<MutationRecord>) {
        self.ready.extend(records);
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.ready.drain(..).collect()
    }

    pub fn first(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector).expect("valid selector");
        selector.select_first(&self.doc, self.doc.root())
    }

    pub fn all(&self, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector).expect("valid selector");
        selector.select(&self.doc, self.doc.root())
    }

    pub fn clicked(&self, selector: &str) -> bool {
        let selector = Selector::parse(selector).expect("valid selector");
        self.clicks
            .iter()
            .any(|node| selector.closest(&self.doc, *node).is_some())
    }

    fn run_due(&mut self, now: Instant) {
        let mut due: Vec<Scheduled> = Vec::new();
        let mut index = 0;
        while index < self.scheduled.len() {
            if self.scheduled[index].due <= now {
                due.push(self.scheduled.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|entry| entry.due);
        for entry in due {
            let records = (self.rules[entry.rule].react)(&mut self.doc, entry.target);
            self.ready.extend(records);
        }
    }
}

#[async_trait(?Send)]
impl HostSurface for ScriptedHost {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn click(&mut self, node: NodeId) {
        self.clicks.push(node);
        let is_checkbox = self.doc.tag(node) == Some("input")
            && self.doc.attr(node, "type") == Some("checkbox");
        if is_checkbox {
            let checked = !self.doc.is_checked(node);
            self.set_checked(node, checked);
        }
        let now = Instant::now();
        for rule in 0..self.rules.len() {
            if self.rules[rule].selector.closest(&self.doc, node).is_none() {
                continue;
            }
            if self.rules[rule].delay.is_zero() {
                let records = (self.rules[rule].react)(&mut self.doc, node);
                self.ready.extend(records);
            } else {
                self.scheduled.push(Scheduled {
                    due: now + self.rules[rule].delay,
                    rule,
                    target: node,
                });
            }
        }
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.doc.set_checked(node, checked);
        self.ready.push_back(MutationRecord::Attributes {
            target: node,
            name: "checked".to_string(),
        });
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirm_answer
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn supports_favourite(&self) -> bool {
        self.favourites.is_some()
    }

    async fn toggle_favourite(&mut self, job: &JobId, shortlisted: bool) -> Result<(), NavigatorError> {
        match self.favourites.as_mut() {
            Some(calls) => {
                calls.push((job.clone(), shortlisted));
                Ok(())
            }
            None => Err(NavigatorError::IdentityNotFound),
        }
    }

    async fn next_mutations(&mut self, within: Duration) -> Vec<MutationRecord> {
        let deadline = Instant::now() + within;
        loop {
            self.run_due(Instant::now());
            if !self.ready.is_empty() {
                return self.take_records();
            }
            match self.scheduled.iter().map(|entry| entry.due).min() {
                Some(due) if due <= deadline => tokio::time::sleep_until(due).await,
                _ => {
                    tokio::time::sleep_until(deadline).await;
                    self.run_due(Instant::now());
                    return self.take_records();
                }
            }
        }
    }
}

/// Appends `html` to the element matching `parent` and reports the addition.
pub fn append(doc: &mut Document, parent: &str, html: &str) -> Vec<MutationRecord> {
    let selector = Selector::parse(parent).expect("valid selector");
    let target = selector
        .select_first(doc, doc.root())
        .unwrap_or_else(|| doc.root());
    let added = doc.append_html(target, html);
    vec![MutationRecord::ChildList {
        target,
        added,
        removed: Vec::new(),
    }]
}

/// Detaches every element matching `selector` and reports the removal.
pub fn remove(doc: &mut Document, selector: &str) -> Vec<MutationRecord> {
    let selector = Selector::parse(selector).expect("valid selector");
    let mut records = Vec::new();
    for node in selector.select(doc, doc.root()) {
        let Some(target) = doc.parent(node) else {
            continue;
        };
        doc.detach(node);
        records.push(MutationRecord::ChildList {
            target,
            added: Vec::new(),
            removed: vec![node],
        });
    }
    records
}

pub fn listing_row(id: &str, title: &str) -> String {
    format!(
        r#"<tr class="table__row--body">
            <th><input type="checkbox" name="dataViewerSelection" value="{id}"><span>{id}</span></th>
            <td><a class="overflow--ellipsis" href="javascript:void(0)">{title}</a></td>
            <td><button class="row-folder" aria-label="Add to folder"><i class="material-icons">create_new_folder</i></button></td>
        </tr>"#
    )
}

pub fn listing_table(jobs: &[(&str, &str)]) -> String {
    let rows: String = jobs
        .iter()
        .map(|(id, title)| listing_row(id, title))
        .collect();
    format!(r#"<table class="data-viewer-table"><tbody>{rows}</tbody></table>"#)
}

pub fn listing_page(jobs: &[(&str, &str)]) -> String {
    format!(
        r#"<html><body><main id="listing">{}</main><nav><a class="pagination__link" href="javascript:void(0)">2</a></nav></body></html>"#,
        listing_table(jobs)
    )
}

/// A rendered detail view for `title`, with overview panels.
pub fn detail_view(title: &str) -> String {
    format!(
        r#"<div data-v-70e7ded6-s="" class="modal">
            <button class="close" aria-label="Close">x</button>
            <h4 class="dashboard-header__profile-information">{title}</h4>
            <ul class="nav-tabs"><li class="active"><a>OVERVIEW</a></li><li><a>MAP</a></li></ul>
            <div role="tabpanel">
                <div id="panel_info">
                    <h4>JOB POSTING INFORMATION</h4>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Work Term:</span><p>2025 - Fall</p></div></div>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Job Type:</span><p>Co-op Main</p></div></div>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Job - City:</span><p>Waterloo</p></div></div>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Job - Province/State:</span><p>Ontario</p></div></div>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Job Summary:</span><p>Build and maintain internal tooling.</p><ul><li>Rust</li><li>SQL</li></ul></div></div>
                </div>
                <div id="panel_company">
                    <h4>COMPANY INFORMATION</h4>
                    <div class="row"><div class="tag__key-value-list"><span class="label">Organization:</span><p>Acme Corp</p></div></div>
                    <p>Founded in 1999 with offices in three cities.</p>
                </div>
            </div>
        </div>"#
    )
}

/// The host's folder side panel, titled with the job it is editing.
pub fn side_panel(title: &str, shortlisted: bool) -> String {
    let checked = if shortlisted { " checked" } else { "" };
    format!(
        r#"<div class="sidebar--action">
            <button class="js--btn--close-sidebar">close</button>
            <h3>{title}</h3>
            <div class="folder-option"><label><input type="checkbox"{checked}><p class="label">shortlist</p></label></div>
            <div class="folder-option"><label><input type="checkbox"><p class="label">applied</p></label></div>
            <button class="btn--save">Save</button>
        </div>"#
    )
}

pub fn navigator(host: ScriptedHost) -> (Navigator<MemoryStore, ScriptedHost>, MemoryStore) {
    navigator_with(NavigatorConfig::default(), MemoryStore::new(), host)
}

pub fn navigator_with(
    config: NavigatorConfig,
    store: MemoryStore,
    host: ScriptedHost,
) -> (Navigator<MemoryStore, ScriptedHost>, MemoryStore) {
    init_logging();
    let navigator = Navigator::new(config, store.clone(), host).expect("default profile compiles");
    (navigator, store)
}

/// Opening a row link renders the detail view for that row's title.
pub fn script_detail_opening(host: &mut ScriptedHost) {
    host.on_click("a.overflow--ellipsis", Duration::ZERO, |doc, link| {
        let title = doc.text_content(link).trim().to_string();
        let mut records = remove(doc, "div[data-v-70e7ded6-s]");
        records.extend(append(doc, "body", &detail_view(&title)));
        records
    });
    host.on_click("button.close", Duration::ZERO, |doc, _| {
        remove(doc, "div[data-v-70e7ded6-s]")
    });
}

/// Drains everything the scripted page has produced into the navigator.
pub async fn settle(navigator: &mut Navigator<MemoryStore, ScriptedHost>) {
    let records = navigator.host_mut().take_records();
    if !records.is_empty() {
        navigator.handle_mutations(records).await;
    }
}
