use super::layout::{DeckLayout, ModalLayout, PageLayout, Target, dot_rects};
use super::WHEEL_STEP;
use crate::config::Config;
use stage::clock::Clock;
use stage::content::{CardStyle, DeckContent};
use stage::effects::{
    CursorFollower, ENTRANCE_DURATION, Entrance, RevealTracker, Ripples, TILT_CONTACT,
    TILT_FEATURE, Tilt, TypeWriter,
};
use stage::gate::{Gate, GateError, GateOutcome, MemorySession, View};
use stage::geometry::{Point, Rect, Size};
use stage::modal::{ExchangeId, ModalController, ModalEffect};
use stage::navigator::{NavError, NavEvent, NavInput, NavKey, Navigator};
use stage::particles::ParticleField;
use stage::registry::ElementRegistry;
use stage::remote::RemoteCommand;
use std::time::Duration;

/// Keys the deck reacts to, already translated from the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckKey {
    Escape,
    Nav(NavKey),
}

#[derive(Debug, Clone, PartialEq)]
struct PendingScroll {
    detail: ExchangeId,
    due: Duration,
    offset: f64,
}

/// Everything the deck window shows, independent of GTK.
pub struct DeckState {
    pub content: DeckContent,
    pub navigator: Navigator,
    pub modals: ModalController,
    pub particles: ParticleField,
    pub gate: Gate<MemorySession>,
    pub view: View,
    pub clock: Clock,
    pub cursor: CursorFollower,
    pub ripples: Ripples,
    pub entrance: Entrance,
    pub typewriter: Option<TypeWriter>,
    pub viewport: Size,
    pub pointer: Option<Point>,
    pub hover: Option<Target>,
    pub tilt: Option<(usize, Tilt)>,
    pub panel_scroll: f64,
    reveals: Vec<RevealTracker>,
    touch_start: Option<f64>,
    detail_scroll: Option<PendingScroll>,
}

impl DeckState {
    pub fn new(content: DeckContent, config: &Config, viewport: Size) -> Self {
        let gate = Gate::new(MemorySession::default());
        let view = gate.guard(View::Content);
        let mut state = Self {
            navigator: Navigator::new(content.page_count(), config.navigation.clone()),
            modals: ModalController::from_registry(&content),
            particles: ParticleField::new(config.particles.clone(), viewport),
            reveals: Self::reveal_trackers(&content),
            content,
            gate,
            view,
            clock: Clock::start(),
            cursor: CursorFollower::default(),
            ripples: Ripples::default(),
            entrance: Entrance::default(),
            typewriter: None,
            viewport,
            pointer: None,
            hover: None,
            tilt: None,
            panel_scroll: 0.0,
            touch_start: None,
            detail_scroll: None,
        };
        state.replay_page(Duration::ZERO);
        state
    }

    fn reveal_trackers(content: &DeckContent) -> Vec<RevealTracker> {
        content
            .pages()
            .iter()
            .map(|p| RevealTracker::new(p.cards.len()))
            .collect()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn layout(&self) -> DeckLayout {
        let page = self
            .content
            .page(self.navigator.current_page())
            .map(|p| PageLayout::compute(p, self.viewport));
        let modal = self.modal_layout(self.panel_scroll);

        DeckLayout {
            viewport: self.viewport,
            dots: dot_rects(self.navigator.page_count(), self.viewport),
            page,
            modal,
        }
    }

    fn modal_layout(&self, scroll: f64) -> Option<ModalLayout> {
        let id = self.modals.active()?;
        let spec = self.content.modal(id)?;
        let state = self.modals.modal(id)?;
        Some(ModalLayout::compute(spec, state, self.viewport, scroll))
    }

    /// Shows `requested` unless the gate redirects.
    pub fn show(&mut self, requested: View, now: Duration) -> View {
        let view = self.gate.guard(requested);
        if view != requested {
            log::debug!("{:?} view redirected to {:?}", requested, view);
        }
        if view == View::Content && self.view != View::Content {
            self.replay_page(now);
        }
        self.view = view;
        view
    }

    pub fn submit_password(&mut self, input: &str, now: Duration) -> Result<(), GateError> {
        self.gate.submit(input, now)
    }

    pub fn resize(&mut self, viewport: Size) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.particles.resize(viewport);
        self.clamp_panel_scroll();
    }

    pub fn reload(&mut self, config: &Config, content: Option<DeckContent>) {
        self.navigator.set_timing(config.navigation.clone());
        self.particles.reconfigure(config.particles.clone());

        if let Some(content) = content {
            let page = self.navigator.current_page().min(content.page_count().saturating_sub(1));
            self.modals = ModalController::from_registry(&content);
            self.reveals = Self::reveal_trackers(&content);
            self.navigator = Navigator::new(content.page_count(), config.navigation.clone());
            self.content = content;
            // stay on the same page without replaying a transition
            if page > 0 && self.navigator.navigate_to(page, Duration::ZERO).is_ok() {
                self.navigator.finish();
            }
            self.panel_scroll = 0.0;
            self.detail_scroll = None;
            self.hover = None;
            self.tilt = None;
        }
    }

    pub fn pointer_moved(&mut self, p: Point, now: Duration) {
        self.pointer = Some(p);
        self.cursor.pointer_moved(p, now);
        self.particles.set_pointer(Some(p));

        let layout = self.layout();
        self.hover = layout.hit_test(p);
        self.cursor
            .set_hovering(self.hover.as_ref().is_some_and(|t| *t != Target::ModalBackdrop));

        self.tilt = match (&self.hover, &layout.page) {
            (Some(Target::Card(i)), Some(page)) => self.card_tilt(*i, p, &page.cards[*i]),
            _ => None,
        };
    }

    fn card_tilt(&self, index: usize, p: Point, rect: &Rect) -> Option<(usize, Tilt)> {
        let card = self
            .content
            .page(self.navigator.current_page())?
            .cards
            .get(index)?;
        let divisor = match card.style {
            CardStyle::Feature => TILT_FEATURE,
            CardStyle::Contact => TILT_CONTACT,
            _ => return None,
        };
        Some((index, Tilt::from_pointer(p, rect, divisor)))
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.hover = None;
        self.tilt = None;
        self.cursor.pointer_left();
    }

    pub fn click(&mut self, p: Point, now: Duration) {
        let layout = self.layout();
        let Some(target) = layout.hit_test(p) else {
            return;
        };
        let width = self.viewport.width;

        match target {
            Target::Dot(page) => self.navigate(NavInput::Dot(page), now),
            Target::Next => {
                if let Some(cta) = layout.page.as_ref().and_then(|l| l.cta) {
                    self.ripples.spawn(p, &cta, now);
                }
                self.navigate(NavInput::Next, now);
            }
            Target::Card(i) => {
                if let Some(rect) = layout.page.as_ref().and_then(|l| l.cards.get(i)) {
                    self.ripples.spawn(p, rect, now);
                }
                let segment = self
                    .content
                    .page(self.navigator.current_page())
                    .and_then(|page| page.cards.get(i))
                    .and_then(|card| card.segment);
                if let Some(id) = segment {
                    let effects = self.modals.open(id, width);
                    self.apply(effects, now);
                }
            }
            Target::ModalClose(id) => {
                let effects = self.modals.close(id);
                self.apply(effects, now);
            }
            Target::Question(id, index) => {
                if self.modals.select_question(id, index) {
                    self.panel_scroll = 0.0;
                }
            }
            Target::Expandable {
                modal,
                panel,
                list,
                item,
            } => {
                self.modals.toggle_expandable(modal, &panel, list, item);
                self.clamp_panel_scroll();
            }
            Target::Exchange(card) => {
                let effects = self.modals.select_exchange(&card, width);
                self.apply(effects, now);
            }
            Target::DetailClose => {
                self.modals.close_exchange_detail();
                self.clamp_panel_scroll();
            }
            Target::ModalBackdrop => {}
        }
    }

    /// Vertical scroll in wheel notches.
    pub fn scroll(&mut self, dy: f64, now: Duration) {
        let delta = dy * WHEEL_STEP;
        if self.modals.scroll_locked() {
            self.panel_scroll += delta;
            self.clamp_panel_scroll();
        } else {
            self.navigate(NavInput::Wheel { delta_y: delta }, now);
        }
    }

    pub fn touch_begin(&mut self, y: f64) {
        self.touch_start = Some(y);
    }

    pub fn touch_end(&mut self, y: f64, now: Duration) {
        let Some(start_y) = self.touch_start.take() else {
            return;
        };
        if !self.modals.scroll_locked() {
            self.navigate(NavInput::Swipe { start_y, end_y: y }, now);
        }
    }

    pub fn key(&mut self, key: DeckKey, now: Duration) {
        match key {
            DeckKey::Escape => {
                let effects = self.modals.close_all();
                self.apply(effects, now);
            }
            DeckKey::Nav(_) if self.modals.scroll_locked() => {}
            DeckKey::Nav(key) => self.navigate(NavInput::Key(key), now),
        }
    }

    pub fn remote(&mut self, command: RemoteCommand, now: Duration) {
        match command.nav_input() {
            Some(input) => {
                if self.modals.scroll_locked() {
                    log::debug!("Ignoring '{}' while a modal is open", command);
                    return;
                }
                self.navigate(input, now);
            }
            None => {
                let effects = self.modals.close_all();
                self.apply(effects, now);
            }
        }
    }

    fn navigate(&mut self, input: NavInput, now: Duration) {
        if self.view != View::Content {
            return;
        }
        match self.navigator.handle(input, now) {
            Ok(event) => self.on_nav_event(event, now),
            Err(NavError::NoMovement) => {}
            Err(e) => log::debug!("Navigation {:?} rejected: {}", input, e),
        }
    }

    fn on_nav_event(&mut self, event: NavEvent, now: Duration) {
        match event {
            NavEvent::Started { from, to } => log::debug!("page {} -> {}", from, to),
            NavEvent::PageSwapped { .. } => {
                self.hover = None;
                self.tilt = None;
                self.replay_page(now);
            }
            NavEvent::Settled { page } => log::debug!("settled on page {}", page),
        }
    }

    fn replay_page(&mut self, now: Duration) {
        self.entrance.restart(now);
        self.typewriter = (self.navigator.current_page() == 0)
            .then(|| self.content.page(0))
            .flatten()
            .filter(|p| !p.subtitle.is_empty())
            .map(|p| TypeWriter::new(p.subtitle.clone(), now + ENTRANCE_DURATION));
    }

    fn apply(&mut self, effects: Vec<ModalEffect>, now: Duration) {
        for effect in effects {
            match effect {
                ModalEffect::LockScroll => {
                    self.hover = None;
                    self.tilt = None;
                }
                ModalEffect::UnlockScroll => {
                    self.panel_scroll = 0.0;
                    self.detail_scroll = None;
                }
                ModalEffect::ScrollPanelToTop(_) => self.panel_scroll = 0.0,
                ModalEffect::ScrollDetailIntoView {
                    detail,
                    delay,
                    offset,
                } => {
                    self.detail_scroll = Some(PendingScroll {
                        detail,
                        due: now + delay,
                        offset,
                    });
                }
            }
        }
        // a newly opened modal starts at the top
        if self.modals.active().is_some() {
            self.clamp_panel_scroll();
        }
    }

    fn clamp_panel_scroll(&mut self) {
        let max = self
            .modal_layout(self.panel_scroll)
            .map(|l| l.max_scroll())
            .unwrap_or(0.0);
        self.panel_scroll = self.panel_scroll.clamp(0.0, max);
    }

    /// Earliest pending deadline across the navigator, gate and modals.
    pub fn next_wakeup(&self) -> Option<Duration> {
        [
            self.navigator.next_deadline(),
            self.gate.next_deadline(),
            self.detail_scroll.as_ref().map(|s| s.due),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fires every deadline that has passed by `now`.
    pub fn fire(&mut self, now: Duration) -> Option<GateOutcome> {
        for event in self.navigator.advance(now) {
            self.on_nav_event(event, now);
        }

        if let Some(pending) = self.detail_scroll.take_if(|s| now >= s.due)
            && let Some(layout) = self.modal_layout(self.panel_scroll)
            && let Some(anchor) = layout.detail_anchor(&pending.detail, self.panel_scroll)
        {
            self.panel_scroll = (anchor - pending.offset).clamp(0.0, layout.max_scroll());
        }

        let outcome = self.gate.poll(now);
        if let Some(GateOutcome::Granted(view)) = outcome {
            self.show(view, now);
        }
        outcome
    }

    /// Per-frame work while the deck is visible.
    pub fn frame(&mut self, now: Duration) {
        self.particles.step();
        self.ripples.prune(now);

        let page = self.navigator.current_page();
        let viewport = Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height);
        let Some(spec) = self.content.page(page) else {
            return;
        };
        let layout = PageLayout::compute(spec, self.viewport);
        if let Some(tracker) = self.reveals.get_mut(page) {
            for (i, (card, rect)) in spec.cards.iter().zip(&layout.cards).enumerate() {
                if card.reveal && tracker.is_observing(i) {
                    tracker.observe(i, rect.intersection_ratio(&viewport), now);
                }
            }
        }
    }

    /// `(opacity, offset)` of card `index` on the current page from its
    /// reveal animation; cards without one are fully shown.
    pub fn reveal_style(&self, index: usize, now: Duration) -> (f64, f64) {
        let page = self.navigator.current_page();
        let reveals = self
            .content
            .page(page)
            .and_then(|p| p.cards.get(index))
            .is_some_and(|c| c.reveal);
        match self.reveals.get(page) {
            Some(tracker) if reveals => tracker.style(index, now),
            _ => (1.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage::gate::PASSPHRASE;
    use stage::modal::ModalId;
    use stage::navigator::Phase;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn unlocked() -> DeckState {
        let content = DeckContent::embedded().unwrap();
        let mut config = Config::default();
        config.particles.seed = Some(7);
        let mut state = DeckState::new(content, &config, Size::new(1600.0, 1000.0));
        state.submit_password(PASSPHRASE, ms(0)).unwrap();
        state.fire(ms(300));
        state
    }

    fn settle(state: &mut DeckState, at: u64) {
        state.fire(ms(at + 500));
        state.fire(ms(at + 1200));
    }

    #[test]
    fn starts_on_login_and_unlocks() {
        let content = DeckContent::embedded().unwrap();
        let mut state = DeckState::new(content, &Config::default(), Size::new(800.0, 600.0));
        assert_eq!(state.view, View::Login);

        state.submit_password("wrong", ms(0)).unwrap();
        assert_eq!(state.next_wakeup(), Some(ms(300)));
        assert_eq!(state.fire(ms(300)), Some(GateOutcome::Denied));
        assert_eq!(state.view, View::Login);

        state.submit_password(" Tse_1404 ", ms(1000)).unwrap();
        assert_eq!(state.fire(ms(1300)), Some(GateOutcome::Granted(View::Content)));
        assert_eq!(state.view, View::Content);
        assert_eq!(state.show(View::Login, ms(1400)), View::Content);
    }

    #[test]
    fn input_is_ignored_before_unlock() {
        let content = DeckContent::embedded().unwrap();
        let mut state = DeckState::new(content, &Config::default(), Size::new(800.0, 600.0));
        state.scroll(1.0, ms(0));
        assert_eq!(state.navigator.phase(), Phase::Idle);
    }

    #[test]
    fn wheel_notch_advances_one_page() {
        let mut state = unlocked();
        state.scroll(1.0, ms(1000));
        assert_eq!(state.navigator.indicator(), 1);
        assert_eq!(state.next_wakeup(), Some(ms(1500)));
        settle(&mut state, 1000);
        assert_eq!(state.navigator.current_page(), 1);
        assert_eq!(state.next_wakeup(), None);
    }

    #[test]
    fn segment_card_opens_modal_and_swallows_navigation() {
        let mut state = unlocked();
        state.key(DeckKey::Nav(NavKey::Digit(3)), ms(1000));
        settle(&mut state, 1000);
        assert_eq!(state.navigator.current_page(), 2);

        let card = state.layout().page.unwrap().cards[4];
        state.click(card.center(), ms(3000));
        assert_eq!(state.modals.active(), Some(ModalId::Debt));

        state.key(DeckKey::Nav(NavKey::ArrowDown), ms(5000));
        state.scroll(1.0, ms(5000));
        assert_eq!(state.navigator.phase(), Phase::Idle);
        assert_eq!(state.navigator.current_page(), 2);

        state.key(DeckKey::Escape, ms(5100));
        assert_eq!(state.modals.active(), None);
        assert_eq!(state.panel_scroll, 0.0);
    }

    #[test]
    fn narrow_exchange_selection_scrolls_detail_later() {
        let content = DeckContent::embedded().unwrap();
        let mut state = DeckState::new(content, &Config::default(), Size::new(700.0, 500.0));
        state.submit_password(PASSPHRASE, ms(0)).unwrap();
        state.fire(ms(300));

        state.modals.open(ModalId::Private, 700.0);
        state.modals.select_question(ModalId::Private, 1);
        let effects = state.modals.select_exchange(&ExchangeId::from("tse"), 700.0);
        state.apply(effects, ms(1000));
        assert_eq!(state.next_wakeup(), Some(ms(1150)));
        assert_eq!(state.panel_scroll, 0.0);

        state.fire(ms(1150));
        assert!(state.panel_scroll > 0.0);
        assert_eq!(state.next_wakeup(), None);
    }

    #[test]
    fn remote_close_and_goto() {
        let mut state = unlocked();
        state.modals.open(ModalId::Project, 1600.0);
        state.remote(RemoteCommand::Goto(4), ms(1000));
        assert_eq!(state.navigator.indicator(), 0);

        state.remote(RemoteCommand::Close, ms(1000));
        state.remote(RemoteCommand::Goto(4), ms(1000));
        assert_eq!(state.navigator.indicator(), 3);
    }

    #[test]
    fn hover_over_feature_card_tilts() {
        let mut state = unlocked();
        state.key(DeckKey::Nav(NavKey::Digit(2)), ms(1000));
        settle(&mut state, 1000);

        let card = state.layout().page.unwrap().cards[0];
        state.pointer_moved(card.center().offset(20.0, 0.0), ms(3000));
        let (index, tilt) = state.tilt.unwrap();
        assert_eq!(index, 0);
        assert!(tilt.rotate_y > 0.0);
        assert!(state.cursor.hovering());

        state.pointer_left();
        assert!(state.tilt.is_none());
        assert!(state.cursor.dot().is_none());
    }

    #[test]
    fn cards_reveal_once_visible() {
        let mut state = unlocked();
        state.key(DeckKey::Nav(NavKey::Digit(2)), ms(1000));
        settle(&mut state, 1000);
        assert_eq!(state.reveal_style(0, ms(2200)), (0.0, 30.0));

        state.frame(ms(2200));
        let (opacity, _) = state.reveal_style(0, ms(3000));
        assert!((opacity - 1.0).abs() < 1e-9);
    }
}
