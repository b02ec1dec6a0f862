//! Navigator core: pure shortlist/layout state and the session state machine.
mod effect;
mod job_id;
mod keys;
mod layout;
mod msg;
mod navigation;
mod shortlist;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use job_id::JobId;
pub use keys::{bind_key, Key, KeyCommand, KeyPress};
pub use layout::{field_collapse_key, Column, FieldColumns, Layout, LayoutParts, PanelLayout};
pub use msg::Msg;
pub use navigation::{Direction, NavCursor};
pub use shortlist::ShortlistSet;
pub use state::{DetailPhase, SessionState};
pub use update::update;
pub use view_model::StatusView;
