use std::fs;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use navigator_logging::nav_info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::selector::{Selector, SelectorList};

/// Labels of the address sub-fields folded into one location field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressLabels {
    pub line_one: String,
    pub line_two: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

impl Default for AddressLabels {
    fn default() -> Self {
        Self {
            line_one: "Job - Address Line One".to_string(),
            line_two: "Job - Address Line Two".to_string(),
            city: "Job - City".to_string(),
            province: "Job - Province/State".to_string(),
            postal_code: "Job - Postal/Zip Code".to_string(),
            country: "Job - Country".to_string(),
        }
    }
}

impl AddressLabels {
    pub fn contains(&self, label: &str) -> bool {
        [
            &self.line_one,
            &self.line_two,
            &self.city,
            &self.province,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .any(|known| known.as_str() == label)
    }
}

/// Everything the navigator knows about the host application's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostProfile {
    /// Hosts the navigator activates on; empty means any.
    pub site_hosts: Vec<String>,
    /// URL path fragments of listing pages.
    pub listing_paths: Vec<String>,
    pub table: String,
    pub row: String,
    pub row_links: Vec<String>,
    pub selection_checkbox: String,
    pub id_cell: String,
    pub id_leaf: String,
    /// Standalone job id token in row text.
    pub job_id_pattern: String,
    pub title_links: Vec<String>,
    pub title_cell: String,
    pub detail_root: String,
    pub tab_panel: String,
    pub active_tab: String,
    pub overview_tab_text: String,
    pub panel_roots: String,
    pub panel_heading: String,
    pub key_value_list: String,
    pub field_label: String,
    pub field_value: String,
    pub detail_title: String,
    pub side_panel: String,
    pub side_panel_title: String,
    pub button: String,
    pub folder_icon: String,
    pub folder_icon_texts: Vec<String>,
    pub folder_aria_hint: String,
    pub close_detail: Vec<String>,
    pub close_side_panel: Vec<String>,
    pub pagination_link: String,
    pub option_label: String,
    pub shortlist_option_text: String,
    pub save_text: String,
    pub service_team_marker: String,
    pub address: AddressLabels,
    pub location_field: String,
    pub additional_content_field: String,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            site_hosts: strings(&["waterlooworks.uwaterloo.ca"]),
            listing_paths: strings(&["/postings", "/jobs"]),
            table: "table".to_string(),
            row: "tr".to_string(),
            row_links: strings(&[
                "tbody tr a.overflow--ellipsis",
                "tbody[data-v-612a1958] a",
                ".table__row--body a[href=\"javascript:void(0)\"]",
                "table tbody a[onclick]",
                "tr.table__row--body a",
                ".dashboard-table tbody a",
                "tbody a",
            ]),
            selection_checkbox: "input[type=checkbox][name=dataViewerSelection]".to_string(),
            id_cell: "th".to_string(),
            id_leaf: "span".to_string(),
            job_id_pattern: r"\b[0-9]{6}\b".to_string(),
            title_links: strings(&["td a.overflow--ellipsis", "a[href*=javascript]"]),
            title_cell: "td".to_string(),
            detail_root: "div[data-v-70e7ded6-s]".to_string(),
            tab_panel: "[role=tabpanel]".to_string(),
            active_tab: ".nav-tabs .active, [role=tab][aria-selected=true]".to_string(),
            overview_tab_text: "OVERVIEW".to_string(),
            panel_roots: "div[id^=panel_]".to_string(),
            panel_heading: "h4".to_string(),
            key_value_list: ".tag__key-value-list".to_string(),
            field_label: "span.label, .label".to_string(),
            field_value: "p".to_string(),
            detail_title: "h4".to_string(),
            side_panel: ".sidebar--action".to_string(),
            side_panel_title: "h3".to_string(),
            button: "button".to_string(),
            folder_icon: "i.material-icons".to_string(),
            folder_icon_texts: strings(&["folder_open", "create_new_folder"]),
            folder_aria_hint: "folder".to_string(),
            close_detail: strings(&["button.close", "[aria-label=Close]"]),
            close_side_panel: strings(&[
                "button.js--btn--close-sidebar",
                "button.modal__btn--close-posting",
                "button.modal__btn--close",
                "button[class*=close-sidebar]",
            ]),
            pagination_link: ".pagination__link".to_string(),
            option_label: "p.label".to_string(),
            shortlist_option_text: "shortlist".to_string(),
            save_text: "save".to_string(),
            service_team_marker: "SERVICE TEAM".to_string(),
            address: AddressLabels::default(),
            location_field: "Job Location".to_string(),
            additional_content_field: "Additional Content".to_string(),
        }
    }
}

/// Settle delays and wait bounds, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub row_rescan_debounce_ms: u64,
    pub pagination_rescan_ms: u64,
    pub detail_retry_ms: u64,
    pub detail_max_retries: u32,
    pub reopen_settle_ms: u64,
    pub select_settle_ms: u64,
    pub close_panel_settle_ms: u64,
    pub panel_wait_ms: u64,
    pub option_wait_ms: u64,
    pub poll_interval_ms: u64,
    pub checkbox_settle_ms: u64,
    pub save_settle_ms: u64,
    pub folder_button_attempts: u32,
    pub folder_retry_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            row_rescan_debounce_ms: 100,
            pagination_rescan_ms: 500,
            detail_retry_ms: 150,
            detail_max_retries: 20,
            reopen_settle_ms: 100,
            select_settle_ms: 300,
            close_panel_settle_ms: 500,
            panel_wait_ms: 8000,
            option_wait_ms: 8000,
            poll_interval_ms: 200,
            checkbox_settle_ms: 200,
            save_settle_ms: 500,
            folder_button_attempts: 5,
            folder_retry_ms: 300,
        }
    }
}

impl Timing {
    pub fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }
}

/// Storage keys of the three persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub preferences: String,
    pub shortlist: String,
    pub ui_enabled: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            preferences: "ww-navigator-prefs".to_string(),
            shortlist: "ww-navigator-shortlist".to_string(),
            ui_enabled: "ww-navigator-ui-enabled".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub profile: HostProfile,
    pub timing: Timing,
    pub storage: StorageKeys,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            profile: HostProfile::default(),
            timing: Timing::default(),
            storage: StorageKeys::default(),
        }
    }
}

impl NavigatorConfig {
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&content)?;
        nav_info!("Loaded navigator config from {:?}", path);
        Ok(config)
    }
}

/// Parsed selectors of a [`HostProfile`].
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub table: Selector,
    pub row: Selector,
    pub row_links: SelectorList,
    pub selection_checkbox: Selector,
    pub id_cell: Selector,
    pub id_leaf: Selector,
    pub job_id_pattern: Regex,
    pub title_links: SelectorList,
    pub title_cell: Selector,
    pub detail_root: Selector,
    pub tab_panel: Selector,
    pub active_tab: Selector,
    pub panel_roots: Selector,
    pub panel_heading: Selector,
    pub key_value_list: Selector,
    pub field_label: Selector,
    pub field_value: Selector,
    pub detail_title: Selector,
    pub side_panel: Selector,
    pub side_panel_title: Selector,
    pub button: Selector,
    pub folder_icon: Selector,
    pub close_detail: SelectorList,
    pub close_side_panel: SelectorList,
    pub pagination_link: Selector,
    pub option_label: Selector,
    pub checkbox: Selector,
    pub label: Selector,
    pub source: HostProfile,
}

impl CompiledProfile {
    pub fn compile(profile: &HostProfile) -> Result<Self, ConfigError> {
        let one = |source: &str| Selector::parse(source).map_err(ConfigError::Selector);
        let many = |sources: &[String]| SelectorList::parse(sources).map_err(ConfigError::Selector);
        Ok(Self {
            table: one(&profile.table)?,
            row: one(&profile.row)?,
            row_links: many(&profile.row_links)?,
            selection_checkbox: one(&profile.selection_checkbox)?,
            id_cell: one(&profile.id_cell)?,
            id_leaf: one(&profile.id_leaf)?,
            job_id_pattern: Regex::new(&profile.job_id_pattern)?,
            title_links: many(&profile.title_links)?,
            title_cell: one(&profile.title_cell)?,
            detail_root: one(&profile.detail_root)?,
            tab_panel: one(&profile.tab_panel)?,
            active_tab: one(&profile.active_tab)?,
            panel_roots: one(&profile.panel_roots)?,
            panel_heading: one(&profile.panel_heading)?,
            key_value_list: one(&profile.key_value_list)?,
            field_label: one(&profile.field_label)?,
            field_value: one(&profile.field_value)?,
            detail_title: one(&profile.detail_title)?,
            side_panel: one(&profile.side_panel)?,
            side_panel_title: one(&profile.side_panel_title)?,
            button: one(&profile.button)?,
            folder_icon: one(&profile.folder_icon)?,
            close_detail: many(&profile.close_detail)?,
            close_side_panel: many(&profile.close_side_panel)?,
            pagination_link: one(&profile.pagination_link)?,
            option_label: one(&profile.option_label)?,
            checkbox: one("input[type=checkbox]")?,
            label: one("label")?,
            source: profile.clone(),
        })
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
