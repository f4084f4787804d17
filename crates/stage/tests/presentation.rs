use stage::content::DeckContent;
use stage::gate::{Gate, GateOutcome, MemorySession, View};
use stage::modal::{ModalController, ModalId, PanelId};
use stage::navigator::{NavInput, NavKey, NavTiming, Navigator};
use stage::registry::ElementRegistry;
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Login, walk the deck with mixed inputs and open a segment.
#[test]
fn full_walkthrough_with_embedded_deck() {
    let deck = DeckContent::embedded().expect("embedded deck parses");

    let mut gate = Gate::new(MemorySession::default());
    assert_eq!(gate.guard(View::Content), View::Login);
    gate.submit("tse_1404", ms(0)).unwrap();
    assert_eq!(gate.poll(ms(300)), Some(GateOutcome::Denied));
    gate.submit(" Tse_1404 ", ms(1000)).unwrap();
    assert_eq!(gate.poll(ms(1300)), Some(GateOutcome::Granted(View::Content)));
    assert_eq!(gate.guard(View::Content), View::Content);

    let mut nav = Navigator::new(deck.page_count(), NavTiming::default());
    let mut now = ms(2000);

    nav.handle(NavInput::Wheel { delta_y: 60.0 }, now).unwrap();
    now += ms(1200);
    nav.advance(now);
    assert_eq!(nav.current_page(), 1);

    now += ms(1500);
    nav.handle(NavInput::Key(NavKey::Digit(3)), now).unwrap();
    now += ms(1200);
    nav.advance(now);
    assert_eq!(nav.current_page(), 2);

    let segments = deck.segment_cards();
    let (page, _, id) = segments
        .iter()
        .find(|(_, _, id)| *id == ModalId::Project)
        .copied()
        .unwrap();
    assert_eq!(page, nav.current_page());

    let mut modals = ModalController::from_registry(&deck);
    modals.open(id, 1920.0);
    assert!(modals.scroll_locked());
    assert!(modals.select_question(ModalId::Project, 0));
    let project = modals.modal(ModalId::Project).unwrap();
    assert_eq!(project.active_panel(), Some(&PanelId::from("structure")));
    let private = modals.modal(ModalId::Private).unwrap();
    assert_eq!(private.active_panel(), Some(&PanelId::from("intro")));

    modals.close_all();
    assert!(!modals.scroll_locked());

    now += ms(1500);
    nav.handle(NavInput::Key(NavKey::End), now).unwrap();
    nav.finish();
    now += ms(1500);
    assert!(nav.handle(NavInput::Wheel { delta_y: 60.0 }, now).is_err());
    assert_eq!(nav.current_page(), 3);
}
