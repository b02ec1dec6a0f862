mod support;

use std::rc::Rc;

use navigator_core::Column;
use navigator_engine::{
    enhance, panel_order, teardown, CompiledProfile, Document, HostProfile, LayoutState,
    MemoryStore, PersistentStore, StorageKeys, ENHANCED_PANEL_CLASS,
};
use pretty_assertions::assert_eq;

use support::{detail_view, init_logging};

const INFO: &str = "JOB POSTING INFORMATION";
const COMPANY: &str = "COMPANY INFORMATION";

struct Fixture {
    doc: Document,
    profile: CompiledProfile,
    layout: LayoutState<MemoryStore>,
    store: MemoryStore,
}

fn fixture(html: &str) -> Fixture {
    init_logging();
    let store = MemoryStore::new();
    let persistent = Rc::new(PersistentStore::new(store.clone(), StorageKeys::default()));
    Fixture {
        doc: Document::parse(html),
        profile: CompiledProfile::compile(&HostProfile::default()).expect("profile"),
        layout: LayoutState::load(persistent),
        store,
    }
}

impl Fixture {
    fn enhance(&mut self) -> Vec<String> {
        enhance(&mut self.doc, &self.profile, &mut self.layout)
            .expect("detail view present")
            .panels
    }

    fn select(&self, selector: &str) -> Vec<navigator_engine::NodeId> {
        navigator_engine::Selector::parse(selector)
            .expect("selector")
            .select(&self.doc, self.doc.root())
    }

    fn field_names(&self, selector: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .filter_map(|node| self.doc.attr(node, "data-field-name").map(str::to_string))
            .collect()
    }
}

#[test]
fn enhancing_twice_produces_the_same_document() {
    let mut fx = fixture(&detail_view("Platform Developer"));
    let panels = fx.enhance();
    assert_eq!(panels, vec![INFO.to_string(), COMPANY.to_string()]);
    let first = fx.doc.html();

    fx.enhance();
    assert_eq!(fx.doc.html(), first);
    assert_eq!(fx.select(".nav-enhanced-panel").len(), 2);
}

#[test]
fn teardown_restores_the_host_rendering_exactly() {
    let html = detail_view("Platform Developer")
        .replace(r#"<div id="panel_company">"#, r#"<div id="panel_company" style="color: red">"#);
    let mut fx = fixture(&html);
    let original = fx.doc.html();

    fx.enhance();
    assert_ne!(fx.doc.html(), original);
    let company = fx.select("#panel_company")[0];
    assert_eq!(fx.doc.attr(company, "style"), Some("display: none"));

    assert_eq!(teardown(&mut fx.doc), 2);
    assert_eq!(fx.doc.html(), original);
    assert_eq!(teardown(&mut fx.doc), 0);
}

#[test]
fn default_field_order_follows_the_page_and_stays_stable() {
    let mut fx = fixture(&detail_view("Platform Developer"));
    fx.enhance();

    let expected = vec![
        "Job Location".to_string(),
        "Work Term".to_string(),
        "Job Type".to_string(),
        "Job Summary".to_string(),
    ];
    let columns = fx.layout.layout().field_columns(INFO).expect("registered").clone();
    assert_eq!(columns.left, expected);
    assert!(columns.right.is_empty());
    assert_eq!(fx.field_names(".nav-column-left .nav-field"), {
        let mut all = expected.clone();
        all.extend(["Organization".to_string(), "Additional Content".to_string()]);
        all
    });
    let stored = fx.store.raw("ww-navigator-prefs").expect("persisted");

    fx.enhance();
    assert_eq!(fx.store.raw("ww-navigator-prefs"), Some(stored));
}

#[test]
fn field_kinds_follow_their_content() {
    let mut fx = fixture(&detail_view("Platform Developer"));
    fx.enhance();

    assert_eq!(
        fx.field_names(".nav-field-compact"),
        vec!["Job Location", "Work Term", "Job Type", "Organization", "Additional Content"]
    );
    assert_eq!(fx.field_names(".nav-field-card"), vec!["Job Summary"]);
    let location = fx.select(".nav-field-compact .nav-address-line");
    assert_eq!(location.len(), 1);
    assert_eq!(fx.doc.text_content(location[0]), "Waterloo, Ontario");
}

#[test]
fn stored_columns_place_fields_and_show_the_right_column() {
    let mut fx = fixture(&detail_view("Platform Developer"));
    fx.enhance();
    assert!(fx.layout.move_field(INFO, "Job Type", Column::Right, 0));
    fx.enhance();

    assert_eq!(fx.field_names(".nav-column-right .nav-field"), vec!["Job Type"]);
    let rights = fx.select(".nav-column-right");
    assert_eq!(fx.doc.attr(rights[0], "style"), None);
    // Panels without right-hand fields keep the column hidden.
    assert_eq!(fx.doc.attr(rights[1], "style"), Some("display: none"));
    assert!(fx.doc.text_content(rights[0]).contains("Co-op Main"));
}

#[test]
fn section_order_and_collapse_state_are_applied() {
    let mut fx = fixture(&detail_view("Platform Developer"));
    fx.enhance();
    assert!(fx.layout.move_panel(&[INFO, COMPANY], COMPANY, 0));
    fx.layout.toggle_panel_collapsed(INFO);
    fx.layout.toggle_field_collapsed(INFO, "Job Summary");
    fx.enhance();

    assert_eq!(panel_order(&fx.doc, &fx.profile), vec![COMPANY, INFO]);
    let info = fx
        .select(".nav-enhanced-panel")
        .into_iter()
        .find(|panel| fx.doc.attr(*panel, "data-panel-title") == Some(INFO))
        .expect("info panel");
    let content = fx.select(".nav-panel-content");
    let info_content = content
        .into_iter()
        .find(|node| fx.doc.contains(info, *node))
        .expect("content");
    assert_eq!(fx.doc.attr(info_content, "style"), Some("display: none"));

    let extra = fx.select(".nav-field-card .nav-field-value");
    let collapsed: Vec<_> = extra
        .iter()
        .filter(|node| fx.doc.attr(**node, "style") == Some("display: none"))
        .collect();
    assert_eq!(collapsed.len(), 1);
}

#[test]
fn service_team_tables_become_one_field_per_row() {
    let html = r#"<div data-v-70e7ded6-s=""><h4>Analyst</h4><div role="tabpanel">
        <div id="panel_team"><h4>Service Team</h4>
            <table><tbody>
                <tr><td>Advisor</td><td><a href="mailto:a@example.com">Pat Lee</a></td></tr>
                <tr><td>Coordinator</td><td>Sam Roe</td></tr>
            </tbody></table>
        </div></div></div>"#;
    let mut fx = fixture(html);
    assert_eq!(fx.enhance(), vec!["Service Team".to_string()]);
    assert_eq!(fx.field_names(".nav-field"), vec!["Advisor", "Coordinator"]);
    let table = fx.select("table")[0];
    assert_eq!(fx.doc.attr(table, "data-nav-hidden"), Some("true"));
    assert_eq!(fx.select(".nav-field a[href]").len(), 1);
}

#[test]
fn headings_outside_panel_roots_still_form_panels() {
    let html = r#"<div data-v-70e7ded6-s=""><h4>Analyst</h4><div role="tabpanel">
        <section><h4>Application Delivery</h4>
            <div class="tag__key-value-list"><span class="label">Deadline:</span><p>Sep 1</p></div>
        </section></div></div>"#;
    let mut fx = fixture(html);
    assert_eq!(fx.enhance(), vec!["Application Delivery".to_string()]);
    assert_eq!(fx.field_names(".nav-field"), vec!["Deadline"]);
}

#[test]
fn no_detail_view_means_nothing_to_do() {
    let mut fx = fixture("<main><p>Listing only</p></main>");
    assert_eq!(enhance(&mut fx.doc, &fx.profile, &mut fx.layout), None);
    assert!(fx.select(&format!(".{ENHANCED_PANEL_CLASS}")).is_empty());
}

#[test]
fn unseen_panel_persists_its_dom_order_once() {
    let html = r#"<div data-v-70e7ded6-s=""><h4>Analyst</h4><div role="tabpanel">
        <div id="panel_role"><h4>Role Details</h4>
            <div class="tag__key-value-list"><span class="label">Level:</span><p>Junior</p></div>
            <div class="tag__key-value-list"><span class="label">Duration:</span><p>4 months</p></div>
            <div class="tag__key-value-list"><span class="label">Compensation:</span><p>$30/h</p></div>
        </div></div></div>"#;
    let mut fx = fixture(html);
    fx.enhance();
    let stored = fx.store.raw("ww-navigator-prefs").expect("persisted");
    assert!(stored.contains(
        r#""fieldOrder":{"Role Details":{"columns":{"left":["Level","Duration","Compensation"],"right":[]}}}"#
    ));

    fx.enhance();
    assert_eq!(fx.store.raw("ww-navigator-prefs"), Some(stored));
}

#[test]
fn sibling_pairs_each_keep_their_own_value() {
    let html = r#"<div data-v-70e7ded6-s=""><h4>Analyst</h4><div role="tabpanel">
        <div id="panel_role"><h4>Role Details</h4>
            <div class="tag__key-value-list"><span class="label">Level:</span><p>Junior</p></div>
            <p>Reports to the team lead.</p>
            <div class="tag__key-value-list"><span class="label">Duration:</span><p>4 months</p></div>
            <div class="tag__key-value-list"><span class="label">Compensation:</span><p>$30/h</p></div>
        </div></div></div>"#;
    let mut fx = fixture(html);
    fx.enhance();

    let text_of = |name: &str| {
        let selector = format!(".nav-field[data-field-name=\"{name}\"]");
        let field = fx.select(&selector)[0];
        fx.doc.text_content(field)
    };
    let level = text_of("Level");
    assert!(level.contains("Junior"));
    assert!(level.contains("Reports to the team lead."));
    assert!(!level.contains("4 months"));
    assert!(!fx.field_names(".nav-field").contains(&"Additional Content".to_string()));
    let duration = text_of("Duration");
    assert!(duration.contains("4 months"));
    assert!(!duration.contains("$30/h"));
}

#[test]
fn address_parts_fold_into_one_location_field() {
    let row = |label: &str, value: &str| {
        format!(
            r#"<div class="row"><div class="tag__key-value-list"><span class="label">{label}:</span><p>{value}</p></div></div>"#
        )
    };
    let rows: String = [
        ("Job - Address Line One", "200 University Ave"),
        ("Job - Address Line Two", "Room 1001"),
        ("Job - City", "Waterloo"),
        ("Job - Province/State", "Ontario"),
        ("Job - Postal/Zip Code", "N2L 3G1"),
        ("Job - Country", "Canada"),
        ("Work Term", "2025 - Fall"),
    ]
    .iter()
    .map(|(label, value)| row(label, value))
    .collect();
    let html = format!(
        r#"<div data-v-70e7ded6-s=""><h4>Analyst</h4><div role="tabpanel">
        <div id="panel_info"><h4>JOB POSTING INFORMATION</h4>{rows}</div></div></div>"#
    );
    let mut fx = fixture(&html);
    fx.enhance();

    assert_eq!(fx.field_names(".nav-field"), vec!["Job Location", "Work Term"]);
    let lines: Vec<String> = fx
        .select(".nav-address-line")
        .into_iter()
        .map(|line| fx.doc.text_content(line))
        .collect();
    assert_eq!(
        lines,
        vec!["200 University Ave", "Room 1001", "Waterloo, Ontario", "Canada"]
    );
    let location = fx.select(".nav-field")[0];
    assert!(!fx.doc.text_content(location).contains("N2L 3G1"));
}
