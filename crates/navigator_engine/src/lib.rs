//! Navigator engine: host DOM access, persistence and effect execution.
mod config;
mod dom;
mod error;
mod fields;
mod host;
mod identity;
mod layout;
mod navigation;
mod persist;
mod reconcile;
mod selector;
mod session;
mod shortlist;
mod stars;
mod store;
mod sync;
mod wait;
mod watcher;

pub use config::{AddressLabels, CompiledProfile, HostProfile, NavigatorConfig, StorageKeys, Timing};
pub use dom::{Document, NodeId};
pub use error::{ConfigError, HostElement, NavigatorError, StoreError};
pub use fields::{
    extract_key_values, extract_leftovers, extract_table_rows, is_hidden, ExtractedField,
    FieldKind, HIDDEN_ATTR,
};
pub use host::{EventDisposition, HostSurface, Notice, NoticeKind};
pub use identity::JobIdentityResolver;
pub use layout::LayoutState;
pub use navigation::{collect_rows, row_index_of, JobRow};
pub use persist::{ensure_storage_dir, AtomicFileWriter, PersistError};
pub use reconcile::{
    enhance, panel_order, teardown, EnhanceReport, ENHANCED_PANEL_CLASS, FIELD_COLLAPSE_CLASS,
    FIELD_NAME_ATTR, PANEL_COLLAPSE_CLASS, PANEL_TITLE_ATTR,
};
pub use selector::{Selector, SelectorError, SelectorList};
pub use session::Navigator;
pub use shortlist::ShortlistState;
pub use stars::{
    DETAIL_STAR_ID, OPEN_FIRST_ID, ROW_STAR_CLASS, STATUS_ID, UI_TOGGLE_ID,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistentStore};
pub use sync::{
    close_side_panels, find_option_text, find_save_button, option_checkbox,
    shortlist_option_checked, NativeSync, SyncPhase,
};
pub use wait::wait_for;
pub use watcher::{
    content_ready, overview_active, selected_jobs, ChangeWatcher, Debounce, HostEvent,
    MutationRecord,
};
