use std::sync::Once;

use navigator_core::{update, Direction, Effect, JobId, Key, KeyPress, Msg, SessionState};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(navigator_logging::initialize_for_tests);
}

fn open_detail() -> SessionState {
    let (state, _) = update(
        SessionState::new(true),
        Msg::JobOpening {
            index: Some(0),
            job: JobId::parse("123456"),
        },
    );
    let (state, _) = update(state, Msg::DetailOpened { content_ready: true });
    state
}

fn press(state: SessionState, key: Key) -> (SessionState, Vec<Effect>) {
    update(state, Msg::Key(KeyPress::plain(key)))
}

#[test]
fn arrows_and_letters_navigate() {
    init_logging();
    let (state, effects) = press(open_detail(), Key::ArrowRight);
    assert_eq!(effects, vec![Effect::Navigate(Direction::Next)]);
    let (state, effects) = press(state, Key::Char('a'));
    assert_eq!(effects, vec![Effect::Navigate(Direction::Previous)]);
    let (_, effects) = press(state, Key::Char('W'));
    assert_eq!(effects, vec![Effect::ToggleCurrentShortlist]);
}

#[test]
fn keys_do_nothing_without_detail() {
    init_logging();
    let (state, effects) = press(SessionState::new(true), Key::ArrowRight);
    assert!(effects.is_empty());
    let (_, effects) = press(state, Key::Escape);
    assert!(effects.is_empty());
}

#[test]
fn keys_in_editable_fields_are_ignored() {
    init_logging();
    let typing = KeyPress {
        in_editable: true,
        ..KeyPress::plain(Key::Char('d'))
    };
    let (_, effects) = update(open_detail(), Msg::Key(typing));
    assert!(effects.is_empty());
}

#[test]
fn escape_closes_side_panel_before_detail() {
    init_logging();
    let (state, _) = update(open_detail(), Msg::BulkPanelOpened { selected: Vec::new() });

    let (state, effects) = press(state, Key::Escape);
    assert_eq!(effects, vec![Effect::CloseSidePanel]);
    assert!(state.current_job().is_some());

    let (state, _) = update(state, Msg::BulkPanelClosed);
    let (state, effects) = press(state, Key::Escape);
    assert_eq!(effects, vec![Effect::CloseDetail]);
    assert_eq!(state.current_job(), None);
}

#[test]
fn ctrl_shift_c_requests_clear_all() {
    init_logging();
    let chord = KeyPress {
        key: Key::Char('C'),
        ctrl: true,
        shift: true,
        in_editable: false,
    };
    let (state, effects) = update(open_detail(), Msg::Key(chord));
    assert_eq!(effects, vec![Effect::RequestClearAll]);

    let (_, effects) = update(state, Msg::ClearAllConfirmed);
    assert_eq!(effects, vec![Effect::ClearShortlist, Effect::RenderIndicator]);
}

#[test]
fn ctrl_modified_letters_are_not_bound() {
    init_logging();
    let copy = KeyPress {
        ctrl: true,
        ..KeyPress::plain(Key::Char('d'))
    };
    let (_, effects) = update(open_detail(), Msg::Key(copy));
    assert!(effects.is_empty());
}
