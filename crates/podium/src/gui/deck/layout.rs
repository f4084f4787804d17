use super::{
    BODY_SIZE, CARD_GAP, CARD_HEIGHT, CARD_MIN_WIDTH, CHAR_WIDTH, CLOSE_SIZE, CTA_HEIGHT, CTA_WIDTH, DOT_HIT, DOT_INSET, DOT_SPACING, EXCHANGE_CARD_HEIGHT,
    EXPANDABLE_HEADER, LINE_HEIGHT, MARGIN, MODAL_MARGIN, MODAL_PADDING, MODAL_TITLE_SIZE,
    QUESTION_GAP, QUESTION_HEIGHT, SUBTITLE_SIZE, TAG_SIZE, TITLE_SIZE, TOP,
};
use stage::clock::ease_out;
use stage::content::{ModalSpec, PageSpec};
use stage::geometry::{Point, Rect, Size};
use stage::modal::{ExchangeId, ModalId, ModalState, NARROW_VIEWPORT, PanelId};

/// What a pointer position lands on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Dot(usize),
    Next,
    Card(usize),
    ModalClose(ModalId),
    Question(ModalId, usize),
    Expandable {
        modal: ModalId,
        panel: PanelId,
        list: usize,
        item: usize,
    },
    Exchange(ExchangeId),
    DetailClose,
    /// Inside an open modal but not on a control.
    ModalBackdrop,
}

pub fn line_capacity(width: f64, font_size: f64) -> usize {
    ((width / (font_size * CHAR_WIDTH)).floor() as usize).max(1)
}

pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT
}

/// Greedy word wrap at `max_chars` characters per line. Words longer than
/// a line are kept whole on their own line.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * CHAR_WIDTH
}

pub fn dot_rects(count: usize, viewport: Size) -> Vec<Rect> {
    let total = DOT_SPACING * count.saturating_sub(1) as f64;
    let x = viewport.width - DOT_INSET;
    let y0 = viewport.height / 2.0 - total / 2.0;
    (0..count)
        .map(|i| {
            let c = Point::new(x, y0 + i as f64 * DOT_SPACING);
            Rect::new(c.x - DOT_HIT / 2.0, c.y - DOT_HIT / 2.0, DOT_HIT, DOT_HIT)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub tag: Point,
    pub title_size: f64,
    /// Baseline origin of every title word.
    pub title_words: Vec<(Point, String)>,
    pub subtitle: Vec<(Point, String)>,
    pub cards: Vec<Rect>,
    pub cta: Option<Rect>,
}

impl PageLayout {
    pub fn compute(page: &PageSpec, viewport: Size) -> Self {
        let content_width = (viewport.width - 2.0 * MARGIN - DOT_INSET).max(CARD_MIN_WIDTH);
        let title_size = if viewport.width < NARROW_VIEWPORT {
            TITLE_SIZE * 0.7
        } else {
            TITLE_SIZE
        };

        let tag = Point::new(MARGIN, TOP);
        let mut y = TOP + TAG_SIZE + title_size * 1.2;

        // title words flow left to right, wrapping on overflow
        let mut title_words = Vec::new();
        let mut x = MARGIN;
        let space = title_size * CHAR_WIDTH;
        for word in page.title_words() {
            let w = text_width(word, title_size);
            if x > MARGIN && x + w > MARGIN + content_width {
                x = MARGIN;
                y += line_height(title_size);
            }
            title_words.push((Point::new(x, y), word.to_string()));
            x += w + space;
        }

        y += SUBTITLE_SIZE * 2.0;
        let subtitle = wrap(&page.subtitle, line_capacity(content_width, SUBTITLE_SIZE))
            .into_iter()
            .map(|line| {
                let p = Point::new(MARGIN, y);
                y += line_height(SUBTITLE_SIZE);
                (p, line)
            })
            .collect::<Vec<_>>();

        let cards = Self::card_grid(page.cards.len(), content_width, y + CARD_GAP);
        let cards_bottom = cards.last().map(|r| r.y + r.height).unwrap_or(y);

        let cta = page.cta.as_ref().map(|_| {
            let cta_y = (cards_bottom + CARD_GAP * 2.0).min(viewport.height - CTA_HEIGHT - MARGIN / 2.0);
            Rect::new(MARGIN, cta_y.max(cards_bottom + CARD_GAP), CTA_WIDTH, CTA_HEIGHT)
        });

        Self {
            tag,
            title_size,
            title_words,
            subtitle,
            cards,
            cta,
        }
    }

    fn card_grid(count: usize, content_width: f64, top: f64) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let fit = ((content_width + CARD_GAP) / (CARD_MIN_WIDTH + CARD_GAP)).floor() as usize;
        let cols = fit.clamp(1, count);
        let width = (content_width - CARD_GAP * (cols - 1) as f64) / cols as f64;

        (0..count)
            .map(|i| {
                let (row, col) = (i / cols, i % cols);
                Rect::new(
                    MARGIN + col as f64 * (width + CARD_GAP),
                    top + row as f64 * (CARD_HEIGHT + CARD_GAP),
                    width,
                    CARD_HEIGHT,
                )
            })
            .collect()
    }

    /// Number of elements taking part in the entrance animation.
    pub fn animated_len(&self) -> usize {
        1 + self.title_words.len() + 1 + self.cards.len() + usize::from(self.cta.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelItemKind {
    Heading(String),
    Line(String),
    ExpandableHeader {
        list: usize,
        item: usize,
        open: bool,
        title: String,
    },
    ExpandableLine(String),
    ExchangeCard {
        id: ExchangeId,
        name: String,
        active: bool,
    },
    ExchangeDetail {
        id: ExchangeId,
        line: String,
    },
    DetailClose,
}

#[derive(Debug, Clone)]
pub struct PanelItem {
    pub rect: Rect,
    pub kind: PanelItemKind,
}

#[derive(Debug, Clone)]
pub struct QuestionBox {
    pub rect: Rect,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct ModalLayout {
    pub id: ModalId,
    pub frame: Rect,
    pub title: String,
    pub title_origin: Point,
    pub close: Rect,
    pub questions: Vec<QuestionBox>,
    /// Visible region of the scrollable panel content.
    pub panel: Rect,
    pub panel_id: Option<PanelId>,
    /// Items in absolute coordinates with the scroll offset applied.
    pub items: Vec<PanelItem>,
    pub content_height: f64,
}

impl ModalLayout {
    pub fn compute(spec: &ModalSpec, state: &ModalState, viewport: Size, scroll: f64) -> Self {
        let narrow = viewport.width < NARROW_VIEWPORT;
        let margin = if narrow { MODAL_MARGIN / 3.0 } else { MODAL_MARGIN };
        let frame = Rect::new(
            margin,
            margin,
            (viewport.width - 2.0 * margin).max(0.0),
            (viewport.height - 2.0 * margin).max(0.0),
        );
        let inner = frame.inset(MODAL_PADDING);
        let close = Rect::new(
            frame.x + frame.width - MODAL_PADDING / 2.0 - CLOSE_SIZE,
            frame.y + MODAL_PADDING / 2.0,
            CLOSE_SIZE,
            CLOSE_SIZE,
        );
        let title_origin = Point::new(inner.x, inner.y + MODAL_TITLE_SIZE);
        let body_top = inner.y + MODAL_TITLE_SIZE * 2.0;

        let question_width = if narrow {
            inner.width
        } else {
            inner.width * 0.3
        };
        let questions: Vec<QuestionBox> = spec
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionBox {
                rect: Rect::new(
                    inner.x,
                    body_top + i as f64 * (QUESTION_HEIGHT + QUESTION_GAP),
                    question_width,
                    QUESTION_HEIGHT,
                ),
                label: q.label.clone(),
                active: state.active_question() == Some(i),
            })
            .collect();

        let panel = if narrow {
            let top = questions
                .last()
                .map(|q| q.rect.y + q.rect.height + QUESTION_GAP * 2.0)
                .unwrap_or(body_top);
            Rect::new(inner.x, top, inner.width, (inner.y + inner.height - top).max(0.0))
        } else {
            let x = inner.x + question_width + CARD_GAP;
            Rect::new(
                x,
                body_top,
                (inner.x + inner.width - x).max(0.0),
                (inner.y + inner.height - body_top).max(0.0),
            )
        };

        let panel_spec = state.active_panel().and_then(|id| spec.panel(id));
        let mut items = Vec::new();
        let mut y = 0.0;
        let capacity = line_capacity(panel.width, BODY_SIZE);
        let push = |items: &mut Vec<PanelItem>, y: &mut f64, height: f64, kind| {
            items.push(PanelItem {
                rect: Rect::new(panel.x, panel.y + *y - scroll, panel.width, height),
                kind,
            });
            *y += height;
        };

        if let Some(p) = panel_spec {
            push(&mut items, &mut y, line_height(MODAL_TITLE_SIZE * 0.8), PanelItemKind::Heading(p.title.clone()));
            for line in wrap(&p.body, capacity) {
                push(&mut items, &mut y, line_height(BODY_SIZE), PanelItemKind::Line(line));
            }

            for (list, list_spec) in p.lists.iter().enumerate() {
                y += QUESTION_GAP;
                let accordion = state.accordion(&p.id, list);
                for (item, entry) in list_spec.items.iter().enumerate() {
                    let open = accordion.is_some_and(|a| a.is_open(item));
                    push(
                        &mut items,
                        &mut y,
                        EXPANDABLE_HEADER,
                        PanelItemKind::ExpandableHeader {
                            list,
                            item,
                            open,
                            title: entry.title.clone(),
                        },
                    );
                    if open {
                        for line in wrap(&entry.body, capacity.saturating_sub(4).max(1)) {
                            push(&mut items, &mut y, line_height(BODY_SIZE), PanelItemKind::ExpandableLine(line));
                        }
                    }
                }
            }

            if p.show_exchanges && spec.id == ModalId::Private {
                y += QUESTION_GAP;
                let active = state.active_exchange();
                for exchange in &spec.exchanges {
                    push(
                        &mut items,
                        &mut y,
                        EXCHANGE_CARD_HEIGHT,
                        PanelItemKind::ExchangeCard {
                            id: exchange.id.clone(),
                            name: exchange.name.clone(),
                            active: active == Some(&exchange.id),
                        },
                    );
                    y += QUESTION_GAP / 2.0;
                }
                if let Some(detail) = active.and_then(|id| spec.exchanges.iter().find(|e| &e.id == id)) {
                    y += QUESTION_GAP;
                    push(&mut items, &mut y, CLOSE_SIZE, PanelItemKind::DetailClose);
                    for line in wrap(&detail.detail, capacity) {
                        push(
                            &mut items,
                            &mut y,
                            line_height(BODY_SIZE),
                            PanelItemKind::ExchangeDetail {
                                id: detail.id.clone(),
                                line,
                            },
                        );
                    }
                }
            }
        }

        // the close control of the detail block sits at its top-right corner
        for item in items.iter_mut().filter(|i| i.kind == PanelItemKind::DetailClose) {
            item.rect = Rect::new(
                panel.x + panel.width - CLOSE_SIZE,
                item.rect.y,
                CLOSE_SIZE,
                CLOSE_SIZE,
            );
        }

        Self {
            id: spec.id,
            frame,
            title: spec.title.clone(),
            title_origin,
            close,
            questions,
            panel,
            panel_id: panel_spec.map(|p| p.id.clone()),
            items,
            content_height: y,
        }
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.panel.height).max(0.0)
    }

    /// Content offset of the top of the detail block for `id`.
    pub fn detail_anchor(&self, id: &ExchangeId, scroll: f64) -> Option<f64> {
        self.items
            .iter()
            .position(|i| matches!(&i.kind, PanelItemKind::ExchangeDetail { id: d, .. } if d == id))
            .map(|pos| {
                // include the close control right above the first line
                let top = if pos > 0 && self.items[pos - 1].kind == PanelItemKind::DetailClose {
                    self.items[pos - 1].rect.y
                } else {
                    self.items[pos].rect.y
                };
                top - self.panel.y + scroll
            })
    }

    fn hit(&self, p: Point) -> Target {
        if self.close.contains(p) {
            return Target::ModalClose(self.id);
        }
        if let Some(i) = self.questions.iter().position(|q| q.rect.contains(p)) {
            return Target::Question(self.id, i);
        }
        if self.panel.contains(p) {
            let hit = self.items.iter().find(|i| i.rect.contains(p));
            match hit.map(|i| &i.kind) {
                Some(PanelItemKind::ExpandableHeader { list, item, .. }) => {
                    if let Some(panel) = &self.panel_id {
                        return Target::Expandable {
                            modal: self.id,
                            panel: panel.clone(),
                            list: *list,
                            item: *item,
                        };
                    }
                }
                Some(PanelItemKind::ExchangeCard { id, .. }) => return Target::Exchange(id.clone()),
                Some(PanelItemKind::DetailClose) => return Target::DetailClose,
                _ => {}
            }
        }
        Target::ModalBackdrop
    }
}

/// Vertical band `(top, bottom)`, as fractions of the viewport height, that
/// slice `slice` of the transition overlay covers at `progress`. Slices rise
/// in from the bottom before the swap and leave through the top after it.
pub fn transition_cover(progress: f64, slice: usize, slices: usize) -> (f64, f64) {
    let stagger = 0.08 / slices.max(1) as f64 * slice as f64;
    let span = 0.35;
    let rise = ease_out(((progress - stagger) / span).clamp(0.0, 1.0));
    let leave = ease_out(((progress - 0.5 - stagger) / span).clamp(0.0, 1.0));
    (1.0 - rise, 1.0 - leave)
}

/// Geometry of everything on screen for one frame.
#[derive(Debug, Clone)]
pub struct DeckLayout {
    pub viewport: Size,
    pub dots: Vec<Rect>,
    pub page: Option<PageLayout>,
    pub modal: Option<ModalLayout>,
}

impl DeckLayout {
    pub fn hit_test(&self, p: Point) -> Option<Target> {
        if let Some(modal) = &self.modal {
            // an open modal swallows every click
            return Some(modal.hit(p));
        }
        if let Some(i) = self.dots.iter().position(|r| r.contains(p)) {
            return Some(Target::Dot(i));
        }
        let page = self.page.as_ref()?;
        if page.cta.is_some_and(|r| r.contains(p)) {
            return Some(Target::Next);
        }
        page.cards.iter().position(|r| r.contains(p)).map(Target::Card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage::content::DeckContent;
    use stage::modal::ModalController;
    use stage::registry::ElementRegistry;

    fn deck() -> DeckContent {
        DeckContent::embedded().unwrap()
    }

    #[test]
    fn wrap_respects_capacity() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
        assert_eq!(wrap("incomprehensibilities", 5), vec!["incomprehensibilities"]);
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn transition_slices_cover_then_clear() {
        for slice in 0..5 {
            assert_eq!(transition_cover(0.0, slice, 5), (1.0, 1.0));
            let (top, bottom) = transition_cover(0.45, slice, 5);
            assert!(top < 0.01 && bottom > 0.99, "slice {slice} open at swap");
            let (top, bottom) = transition_cover(1.0, slice, 5);
            assert!(top.abs() < 1e-9 && bottom.abs() < 1e-9);
        }
        // later slices lag behind
        assert!(transition_cover(0.1, 4, 5).0 > transition_cover(0.1, 0, 5).0);
    }

    #[test]
    fn dots_are_stacked_and_hit_tested() {
        let viewport = Size::new(1280.0, 800.0);
        let dots = dot_rects(4, viewport);
        assert_eq!(dots.len(), 4);
        assert!(dots.windows(2).all(|w| w[1].y > w[0].y));
        let layout = DeckLayout {
            viewport,
            dots: dots.clone(),
            page: None,
            modal: None,
        };
        assert_eq!(layout.hit_test(dots[2].center()), Some(Target::Dot(2)));
        assert_eq!(layout.hit_test(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn segment_page_cards_are_clickable() {
        let deck = deck();
        let viewport = Size::new(1600.0, 1000.0);
        let page = PageLayout::compute(deck.page(2).unwrap(), viewport);
        assert_eq!(page.cards.len(), 5);
        let layout = DeckLayout {
            viewport,
            dots: dot_rects(4, viewport),
            page: Some(page.clone()),
            modal: None,
        };
        assert_eq!(layout.hit_test(page.cards[3].center()), Some(Target::Card(3)));
        assert_eq!(layout.hit_test(page.cta.unwrap().center()), Some(Target::Next));
    }

    #[test]
    fn cards_wrap_on_narrow_viewports() {
        let deck = deck();
        let page = PageLayout::compute(deck.page(2).unwrap(), Size::new(600.0, 900.0));
        let rows: std::collections::BTreeSet<i64> = page.cards.iter().map(|r| r.y as i64).collect();
        assert!(rows.len() > 1);
    }

    #[test]
    fn open_modal_swallows_clicks() {
        let deck = deck();
        let mut modals = ModalController::from_registry(&deck);
        modals.open(ModalId::Debt, 1600.0);
        let viewport = Size::new(1600.0, 1000.0);
        let spec = deck.modal(ModalId::Debt).unwrap();
        let modal = ModalLayout::compute(spec, modals.modal(ModalId::Debt).unwrap(), viewport, 0.0);
        let layout = DeckLayout {
            viewport,
            dots: dot_rects(4, viewport),
            page: None,
            modal: Some(modal.clone()),
        };

        assert_eq!(layout.hit_test(modal.close.center()), Some(Target::ModalClose(ModalId::Debt)));
        assert_eq!(
            layout.hit_test(modal.questions[0].rect.center()),
            Some(Target::Question(ModalId::Debt, 0))
        );
        let dot = dot_rects(4, viewport)[1].center();
        assert_eq!(layout.hit_test(dot), Some(Target::ModalBackdrop));
    }

    #[test]
    fn expandable_headers_follow_accordion_state() {
        let deck = deck();
        let mut modals = ModalController::from_registry(&deck);
        modals.open(ModalId::Debt, 1600.0);
        modals.select_question(ModalId::Debt, 0);
        let types = PanelId::from("types");
        modals.toggle_expandable(ModalId::Debt, &types, 0, 1);

        let spec = deck.modal(ModalId::Debt).unwrap();
        let viewport = Size::new(1600.0, 1000.0);
        let modal = ModalLayout::compute(spec, modals.modal(ModalId::Debt).unwrap(), viewport, 0.0);

        let headers: Vec<_> = modal
            .items
            .iter()
            .filter_map(|i| match &i.kind {
                PanelItemKind::ExpandableHeader { item, open, .. } => Some((i.rect, *item, *open)),
                _ => None,
            })
            .collect();
        assert_eq!(headers.len(), 3);
        assert!(headers[1].2 && !headers[0].2 && !headers[2].2);
        assert!(modal.items.iter().any(|i| matches!(i.kind, PanelItemKind::ExpandableLine(_))));

        let (rect, _, _) = headers[2];
        assert_eq!(
            modal.hit(rect.center()),
            Target::Expandable {
                modal: ModalId::Debt,
                panel: types,
                list: 0,
                item: 2
            }
        );
    }

    #[test]
    fn exchange_detail_has_anchor() {
        let deck = deck();
        let mut modals = ModalController::from_registry(&deck);
        modals.open(ModalId::Private, 800.0);
        modals.select_question(ModalId::Private, 1);
        let tse = ExchangeId::from("tse");
        modals.select_exchange(&tse, 800.0);

        let spec = deck.modal(ModalId::Private).unwrap();
        let viewport = Size::new(800.0, 700.0);
        let modal = ModalLayout::compute(spec, modals.modal(ModalId::Private).unwrap(), viewport, 0.0);
        let anchor = modal.detail_anchor(&tse, 0.0).unwrap();
        assert!(anchor > 0.0);
        assert!(modal.detail_anchor(&ExchangeId::from("ifb"), 0.0).is_none());

        let scrolled = ModalLayout::compute(spec, modals.modal(ModalId::Private).unwrap(), viewport, 40.0);
        let moved = scrolled.detail_anchor(&tse, 40.0).unwrap();
        assert!((moved - anchor).abs() < 1e-9);
    }
}
