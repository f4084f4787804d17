use super::layout::{ModalLayout, PageLayout, PanelItemKind, Target, transition_cover};
use super::model::DeckState;
use super::{
    BODY_SIZE, CARD_PADDING, CARD_TITLE_SIZE, CURSOR_GLOW_RADIUS, CURSOR_HOVER_SCALE,
    CURSOR_RADIUS, DOT_RADIUS, MODAL_TITLE_SIZE, ORB_COUNT, SHAPE_COUNT, SUBTITLE_SIZE, TAG_SIZE,
    TITLE_PARALLAX, TRANSITION_SLICES,
};
use crate::gui::theme::ThemeColors;
use cairo::{Context, FontSlant, FontWeight, LinearGradient, RadialGradient};
use palette::Srgba;
use stage::content::CardStyle;
use stage::effects::{MAGNETIC_CTA, MAGNETIC_DEFAULT, magnetic_offset, orb_shift, parallax, shape_shift};
use stage::geometry::{Point, Rect, Size};
use stage::registry::ElementRegistry;
use std::f64::consts::PI;
use std::time::Duration;

const FONT: &str = "Sans";
const CARD_RADIUS: f64 = 14.0;
const PARTICLE_OPACITY: f64 = 0.6;
const PARTICLE_GLOW_OPACITY: f64 = 0.2;
const PARTICLE_GLOW_GROWTH: f64 = 2.0;

fn set_color(cr: &Context, color: Srgba<f64>, alpha: f64) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a * alpha);
}

fn rounded_rect(cr: &Context, r: &Rect, radius: f64) {
    let radius = radius.min(r.width / 2.0).min(r.height / 2.0);
    cr.new_sub_path();
    cr.arc(r.x + r.width - radius, r.y + radius, radius, -PI / 2.0, 0.0);
    cr.arc(r.x + r.width - radius, r.y + r.height - radius, radius, 0.0, PI / 2.0);
    cr.arc(r.x + radius, r.y + r.height - radius, radius, PI / 2.0, PI);
    cr.arc(r.x + radius, r.y + radius, radius, PI, 1.5 * PI);
    cr.close_path();
}

fn text(cr: &Context, at: Point, size: f64, weight: FontWeight, s: &str) -> Result<(), cairo::Error> {
    cr.select_font_face(FONT, FontSlant::Normal, weight);
    cr.set_font_size(size);
    cr.move_to(at.x, at.y);
    cr.show_text(s)
}

fn centered_text(cr: &Context, center: Point, size: f64, weight: FontWeight, s: &str) -> Result<(), cairo::Error> {
    cr.select_font_face(FONT, FontSlant::Normal, weight);
    cr.set_font_size(size);
    if let Ok(ext) = cr.text_extents(s) {
        cr.move_to(
            center.x - ext.width() / 2.0 - ext.x_bearing(),
            center.y - ext.height() / 2.0 - ext.y_bearing(),
        );
        cr.show_text(s)?;
    }
    Ok(())
}

/// Paints whatever `body` draws at `opacity`.
fn with_opacity(
    cr: &Context,
    opacity: f64,
    body: impl FnOnce(&Context) -> Result<(), cairo::Error>,
) -> Result<(), cairo::Error> {
    if opacity >= 1.0 {
        return body(cr);
    }
    cr.push_group();
    let drawn = body(cr);
    cr.pop_group_to_source()?;
    drawn?;
    cr.paint_with_alpha(opacity.max(0.0))
}

pub fn draw(cr: &Context, state: &mut DeckState, colors: &ThemeColors, now: Duration) -> Result<(), cairo::Error> {
    let viewport = state.viewport;
    let pointer = state.pointer.unwrap_or(viewport.center());
    let layout = state.layout();

    set_color(cr, colors.background, 1.0);
    cr.paint()?;

    draw_backdrop(cr, viewport, pointer, colors)?;
    draw_particles(cr, state, colors)?;

    if let Some(page) = &layout.page {
        draw_page(cr, state, page, colors, now)?;
    }
    draw_dots(cr, state, &layout.dots, colors)?;

    if let Some(p) = state.navigator.transition_progress(now) {
        draw_transition(cr, viewport, p, colors)?;
    }
    if let Some(modal) = &layout.modal {
        draw_modal(cr, state, modal, colors)?;
    }
    draw_cursor(cr, state, colors, now)
}

fn draw_backdrop(cr: &Context, viewport: Size, pointer: Point, colors: &ThemeColors) -> Result<(), cairo::Error> {
    // orbs anchored at fixed fractions of the viewport
    let anchors = [(0.2, 0.25), (0.8, 0.35), (0.5, 0.85)];
    for (i, (fx, fy)) in anchors.iter().take(ORB_COUNT).enumerate() {
        let (dx, dy) = orb_shift(pointer, viewport, i);
        let c = Point::new(viewport.width * fx + dx, viewport.height * fy + dy);
        let radius = viewport.width.max(viewport.height) * 0.25;
        let color = if i % 2 == 0 { colors.gold } else { colors.navy };
        let (r, g, b, _) = color.into_components();

        let gradient = RadialGradient::new(c.x, c.y, 0.0, c.x, c.y, radius);
        gradient.add_color_stop_rgba(0.0, r, g, b, 0.18);
        gradient.add_color_stop_rgba(1.0, r, g, b, 0.0);
        cr.set_source(&gradient)?;
        cr.arc(c.x, c.y, radius, 0.0, 2.0 * PI);
        cr.fill()?;
    }

    let shapes = [(0.12, 0.7, 40.0), (0.85, 0.15, 28.0), (0.7, 0.75, 56.0), (0.35, 0.1, 22.0)];
    cr.set_line_width(1.5);
    for (i, (fx, fy, size)) in shapes.iter().take(SHAPE_COUNT).enumerate() {
        let (dx, dy) = shape_shift(pointer, viewport, i);
        let c = Point::new(viewport.width * fx + dx, viewport.height * fy + dy);
        set_color(cr, colors.gold, 0.15);
        if i % 2 == 0 {
            cr.arc(c.x, c.y, size / 2.0, 0.0, 2.0 * PI);
        } else {
            cr.save()?;
            cr.translate(c.x, c.y);
            cr.rotate(PI / 4.0);
            cr.rectangle(-size / 2.0, -size / 2.0, *size, *size);
            cr.restore()?;
        }
        cr.stroke()?;
    }
    Ok(())
}

fn draw_particles(cr: &Context, state: &DeckState, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let field = &state.particles;
    let particles = field.particles();

    for link in field.links() {
        let (a, b) = (&particles[link.from], &particles[link.to]);
        let (ar, ag, ab, _) = colors.tint(a.tint).into_components();
        let (br, bg, bb, _) = colors.tint(b.tint).into_components();

        let gradient = LinearGradient::new(a.pos.x, a.pos.y, b.pos.x, b.pos.y);
        gradient.add_color_stop_rgba(0.0, ar, ag, ab, link.opacity);
        gradient.add_color_stop_rgba(1.0, br, bg, bb, link.opacity);
        cr.set_source(&gradient)?;
        cr.set_line_width(link.width);
        cr.move_to(a.pos.x, a.pos.y);
        cr.line_to(b.pos.x, b.pos.y);
        cr.stroke()?;
    }

    if let Some(pointer) = field.pointer() {
        for link in field.pointer_links() {
            let p = &particles[link.particle];
            set_color(cr, colors.gold, link.opacity);
            cr.set_line_width(link.width);
            cr.move_to(p.pos.x, p.pos.y);
            cr.line_to(pointer.x, pointer.y);
            cr.stroke()?;
        }
    }

    for p in particles {
        let color = colors.tint(p.tint);
        set_color(cr, color, PARTICLE_OPACITY);
        cr.arc(p.pos.x, p.pos.y, p.radius, 0.0, 2.0 * PI);
        cr.fill()?;
        set_color(cr, color, PARTICLE_GLOW_OPACITY);
        cr.arc(p.pos.x, p.pos.y, p.radius + PARTICLE_GLOW_GROWTH, 0.0, 2.0 * PI);
        cr.fill()?;
    }
    Ok(())
}

fn draw_page(
    cr: &Context,
    state: &DeckState,
    layout: &PageLayout,
    colors: &ThemeColors,
    now: Duration,
) -> Result<(), cairo::Error> {
    let Some(page) = state.content.page(state.navigator.current_page()) else {
        return Ok(());
    };
    let pointer = state.pointer.unwrap_or(state.viewport.center());
    let mut index = 0;
    let mut next_style = || {
        let style = state.entrance.style(index, now);
        index += 1;
        style
    };

    let (opacity, offset) = next_style();
    with_opacity(cr, opacity, |cr| {
        set_color(cr, colors.gold, 1.0);
        text(cr, layout.tag.offset(0.0, offset), TAG_SIZE, FontWeight::Bold, &page.tag.to_uppercase())
    })?;

    let (px, py) = parallax(pointer, state.viewport, TITLE_PARALLAX);
    for (origin, word) in &layout.title_words {
        let (opacity, offset) = next_style();
        with_opacity(cr, opacity, |cr| {
            set_color(cr, colors.text, 1.0);
            text(cr, origin.offset(px, py + offset), layout.title_size, FontWeight::Bold, word)
        })?;
    }

    let (opacity, offset) = next_style();
    let typed = state.typewriter.as_ref().map(|t| t.visible(now));
    with_opacity(cr, opacity, |cr| {
        set_color(cr, colors.muted, 1.0);
        match typed {
            // the typed prefix is shown on one line until it completes
            Some(typed) if typed.len() < page.subtitle.len() => {
                let origin = layout.subtitle.first().map(|(p, _)| *p).unwrap_or(layout.tag);
                text(cr, origin.offset(0.0, offset), SUBTITLE_SIZE, FontWeight::Normal, typed)
            }
            _ => layout.subtitle.iter().try_for_each(|(origin, line)| {
                text(cr, origin.offset(0.0, offset), SUBTITLE_SIZE, FontWeight::Normal, line)
            }),
        }
    })?;

    for (i, (card, rect)) in page.cards.iter().zip(&layout.cards).enumerate() {
        let (opacity, offset) = next_style();
        let (reveal_opacity, reveal_offset) = state.reveal_style(i, now);
        let rect = Rect::new(rect.x, rect.y + offset + reveal_offset, rect.width, rect.height);
        with_opacity(cr, opacity * reveal_opacity, |cr| {
            draw_card(cr, state, i, &rect, &card.title, &card.body, card.style, colors, now)
        })?;
    }

    if let (Some(label), Some(cta)) = (&page.cta, layout.cta) {
        let (opacity, offset) = next_style();
        let (mx, my) = match state.hover {
            Some(Target::Next) => magnetic_offset(pointer, &cta, MAGNETIC_CTA),
            _ => (0.0, 0.0),
        };
        let rect = Rect::new(cta.x + mx, cta.y + my + offset, cta.width, cta.height);
        with_opacity(cr, opacity, |cr| {
            set_color(cr, colors.gold, 1.0);
            rounded_rect(cr, &rect, rect.height / 2.0);
            cr.fill()?;
            draw_ripples(cr, state, &rect, now)?;
            set_color(cr, colors.background, 1.0);
            centered_text(cr, rect.center(), BODY_SIZE + 1.0, FontWeight::Bold, label)
        })?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_card(
    cr: &Context,
    state: &DeckState,
    index: usize,
    rect: &Rect,
    title: &str,
    body: &str,
    style: CardStyle,
    colors: &ThemeColors,
    now: Duration,
) -> Result<(), cairo::Error> {
    let tilt = state.tilt.filter(|(i, _)| *i == index).map(|(_, t)| t);
    let hovered = state.hover == Some(Target::Card(index));

    cr.save()?;
    let c = rect.center();
    cr.translate(c.x, c.y);
    if let Some(tilt) = tilt {
        let (sx, sy) = tilt.squash();
        cr.translate(0.0, -tilt.lift);
        cr.scale(sx, sy);
    }
    cr.translate(-c.x, -c.y);

    set_color(cr, colors.card, if hovered { 1.6 } else { 1.0 });
    rounded_rect(cr, rect, CARD_RADIUS);
    cr.fill_preserve()?;
    let border = match style {
        CardStyle::Segment => colors.gold,
        _ => colors.text,
    };
    set_color(cr, border, if hovered { 0.6 } else { 0.15 });
    cr.set_line_width(1.0);
    cr.stroke()?;

    if let Some(tilt) = tilt {
        let (hx, hy) = tilt.highlight;
        let h = Point::new(rect.x + rect.width * hx / 100.0, rect.y + rect.height * hy / 100.0);
        let gradient = RadialGradient::new(h.x, h.y, 0.0, h.x, h.y, rect.width.max(rect.height) / 2.0);
        gradient.add_color_stop_rgba(0.0, 1.0, 1.0, 1.0, 0.12);
        gradient.add_color_stop_rgba(1.0, 1.0, 1.0, 1.0, 0.0);
        cr.set_source(&gradient)?;
        rounded_rect(cr, rect, CARD_RADIUS);
        cr.fill()?;
    }

    draw_ripples(cr, state, rect, now)?;

    let inner = rect.inset(CARD_PADDING);
    if style == CardStyle::Step {
        set_color(cr, colors.gold, 1.0);
        text(cr, Point::new(inner.x, inner.y + CARD_TITLE_SIZE), CARD_TITLE_SIZE, FontWeight::Bold, &format!("{:02}", index + 1))?;
    }
    let title_y = inner.y + CARD_TITLE_SIZE * if style == CardStyle::Step { 2.6 } else { 1.0 };
    set_color(cr, colors.text, 1.0);
    text(cr, Point::new(inner.x, title_y), CARD_TITLE_SIZE, FontWeight::Bold, title)?;

    set_color(cr, colors.muted, 1.0);
    let capacity = super::layout::line_capacity(inner.width, BODY_SIZE);
    let line_height = super::layout::line_height(BODY_SIZE);
    let mut y = title_y + CARD_TITLE_SIZE * 1.4;
    for line in super::layout::wrap(body, capacity) {
        if y > inner.y + inner.height {
            break;
        }
        text(cr, Point::new(inner.x, y), BODY_SIZE, FontWeight::Normal, &line)?;
        y += line_height;
    }
    cr.restore()
}

fn draw_ripples(cr: &Context, state: &DeckState, clip: &Rect, now: Duration) -> Result<(), cairo::Error> {
    let inside: Vec<_> = state
        .ripples
        .iter()
        .filter(|r| clip.contains(r.center))
        .filter_map(|r| r.frame(now).map(|f| (r.center, f)))
        .collect();
    if inside.is_empty() {
        return Ok(());
    }

    cr.save()?;
    rounded_rect(cr, clip, CARD_RADIUS);
    cr.clip();
    for (center, (radius, opacity)) in inside {
        cr.set_source_rgba(1.0, 1.0, 1.0, opacity);
        cr.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
        cr.fill()?;
    }
    cr.restore()
}

fn draw_dots(cr: &Context, state: &DeckState, dots: &[Rect], colors: &ThemeColors) -> Result<(), cairo::Error> {
    let active = state.navigator.indicator();
    cr.set_line_width(1.5);
    for (i, dot) in dots.iter().enumerate() {
        let c = dot.center();
        let hovered = state.hover == Some(Target::Dot(i));
        let radius = if hovered { DOT_RADIUS * 1.3 } else { DOT_RADIUS };
        cr.arc(c.x, c.y, radius, 0.0, 2.0 * PI);
        if i == active {
            set_color(cr, colors.gold, 1.0);
            cr.fill()?;
        } else {
            set_color(cr, colors.text, if hovered { 0.8 } else { 0.4 });
            cr.stroke()?;
        }
    }
    Ok(())
}

fn draw_transition(cr: &Context, viewport: Size, progress: f64, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let width = viewport.width / TRANSITION_SLICES as f64;
    for slice in 0..TRANSITION_SLICES {
        let (top, bottom) = transition_cover(progress, slice, TRANSITION_SLICES);
        if bottom <= top {
            continue;
        }
        let color = if slice % 2 == 0 { colors.navy } else { colors.background };
        set_color(cr, color, 1.0);
        cr.rectangle(
            slice as f64 * width,
            viewport.height * top,
            width + 1.0,
            viewport.height * (bottom - top),
        );
        cr.fill()?;
    }
    Ok(())
}

fn draw_modal(cr: &Context, state: &DeckState, modal: &ModalLayout, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let pointer = state.pointer.unwrap_or(state.viewport.center());

    set_color(cr, colors.overlay, 1.0);
    cr.paint()?;

    set_color(cr, colors.navy, 0.95);
    rounded_rect(cr, &modal.frame, CARD_RADIUS * 1.5);
    cr.fill_preserve()?;
    set_color(cr, colors.gold, 0.35);
    cr.set_line_width(1.0);
    cr.stroke()?;

    set_color(cr, colors.gold, 1.0);
    text(cr, modal.title_origin, MODAL_TITLE_SIZE, FontWeight::Bold, &modal.title)?;

    let close_hovered = state.hover == Some(Target::ModalClose(modal.id));
    let (mx, my) = if close_hovered {
        magnetic_offset(pointer, &modal.close, MAGNETIC_DEFAULT)
    } else {
        (0.0, 0.0)
    };
    let close = modal.close.center().offset(mx, my);
    set_color(cr, colors.text, if close_hovered { 1.0 } else { 0.7 });
    cr.set_line_width(2.0);
    let arm = modal.close.width / 4.0;
    cr.move_to(close.x - arm, close.y - arm);
    cr.line_to(close.x + arm, close.y + arm);
    cr.move_to(close.x + arm, close.y - arm);
    cr.line_to(close.x - arm, close.y + arm);
    cr.stroke()?;

    for (i, question) in modal.questions.iter().enumerate() {
        let hovered = state.hover == Some(Target::Question(modal.id, i));
        let fill = if question.active { colors.gold } else { colors.card };
        set_color(cr, fill, if hovered && !question.active { 2.0 } else { 1.0 });
        rounded_rect(cr, &question.rect, CARD_RADIUS / 2.0);
        cr.fill()?;
        let fg = if question.active { colors.background } else { colors.text };
        set_color(cr, fg, 1.0);
        let at = Point::new(question.rect.x + CARD_PADDING, question.rect.center().y + BODY_SIZE / 3.0);
        text(cr, at, BODY_SIZE, FontWeight::Bold, &question.label)?;
    }

    cr.save()?;
    cr.rectangle(modal.panel.x, modal.panel.y, modal.panel.width, modal.panel.height);
    cr.clip();
    for item in &modal.items {
        if item.rect.y > modal.panel.y + modal.panel.height || item.rect.y + item.rect.height < modal.panel.y {
            continue;
        }
        let r = &item.rect;
        let baseline = |size: f64| Point::new(r.x, r.y + size);
        match &item.kind {
            PanelItemKind::Heading(title) => {
                set_color(cr, colors.gold, 1.0);
                text(cr, baseline(MODAL_TITLE_SIZE * 0.8), MODAL_TITLE_SIZE * 0.8, FontWeight::Bold, title)?;
            }
            PanelItemKind::Line(line) => {
                set_color(cr, colors.text, 0.9);
                text(cr, baseline(BODY_SIZE), BODY_SIZE, FontWeight::Normal, line)?;
            }
            PanelItemKind::ExpandableHeader { open, title, .. } => {
                set_color(cr, colors.card, 1.5);
                rounded_rect(cr, &r.inset(2.0), CARD_RADIUS / 2.0);
                cr.fill()?;
                set_color(cr, if *open { colors.gold } else { colors.text }, 1.0);
                let mid = r.center().y + BODY_SIZE / 3.0;
                text(cr, Point::new(r.x + CARD_PADDING, mid), BODY_SIZE, FontWeight::Bold, title)?;
                let marker = if *open { "\u{2212}" } else { "+" };
                text(cr, Point::new(r.x + r.width - CARD_PADDING * 1.5, mid), BODY_SIZE + 4.0, FontWeight::Bold, marker)?;
            }
            PanelItemKind::ExpandableLine(line) => {
                set_color(cr, colors.muted, 1.0);
                text(cr, Point::new(r.x + CARD_PADDING, r.y + BODY_SIZE), BODY_SIZE, FontWeight::Normal, line)?;
            }
            PanelItemKind::ExchangeCard { name, active, .. } => {
                let card = r.inset(2.0);
                set_color(cr, if *active { colors.gold } else { colors.card }, if *active { 0.25 } else { 1.5 });
                rounded_rect(cr, &card, CARD_RADIUS / 2.0);
                cr.fill_preserve()?;
                set_color(cr, colors.gold, if *active { 1.0 } else { 0.3 });
                cr.set_line_width(1.0);
                cr.stroke()?;
                set_color(cr, colors.text, 1.0);
                text(cr, Point::new(card.x + CARD_PADDING, card.center().y + BODY_SIZE / 3.0), BODY_SIZE + 1.0, FontWeight::Bold, name)?;
            }
            PanelItemKind::ExchangeDetail { line, .. } => {
                set_color(cr, colors.text, 0.85);
                text(cr, baseline(BODY_SIZE), BODY_SIZE, FontWeight::Normal, line)?;
            }
            PanelItemKind::DetailClose => {
                set_color(cr, colors.text, 0.7);
                centered_text(cr, r.center(), BODY_SIZE + 6.0, FontWeight::Normal, "\u{00d7}")?;
            }
        }
    }
    cr.restore()?;

    if modal.max_scroll() > 0.0 {
        let track = modal.panel;
        let visible = track.height / modal.content_height;
        let thumb = track.height * visible;
        let y = track.y + (track.height - thumb) * (state.panel_scroll / modal.max_scroll());
        set_color(cr, colors.gold, 0.4);
        rounded_rect(cr, &Rect::new(track.x + track.width - 3.0, y, 3.0, thumb), 1.5);
        cr.fill()?;
    }
    Ok(())
}

fn draw_cursor(cr: &Context, state: &mut DeckState, colors: &ThemeColors, now: Duration) -> Result<(), cairo::Error> {
    let scale = if state.cursor.hovering() { CURSOR_HOVER_SCALE } else { 1.0 };

    if let Some(glow) = state.cursor.glow(now) {
        set_color(cr, colors.gold, 0.5);
        cr.set_line_width(1.5);
        cr.arc(glow.x, glow.y, CURSOR_GLOW_RADIUS * scale, 0.0, 2.0 * PI);
        cr.stroke()?;
    }
    if let Some(dot) = state.cursor.dot() {
        set_color(cr, colors.gold, 1.0);
        cr.arc(dot.x, dot.y, CURSOR_RADIUS * scale / 2.0, 0.0, 2.0 * PI);
        cr.fill()?;
    }
    Ok(())
}
