use crate::config::WindowConfig;
use crate::gui::deck::model::DeckKey;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use stage::geometry::Size;
use stage::navigator::NavKey;

pub fn apply_window_config(window: &gtk::ApplicationWindow, config: &WindowConfig) {
    window.set_title(Some(&config.title));
    if config.fullscreen {
        window.fullscreen();
    } else {
        window.unfullscreen();
        window.set_default_size(config.width, config.height);
    }
}

/// Hides the system pointer over `widget`; the deck draws its own.
pub fn set_cursor_hidden(widget: &impl IsA<gtk::Widget>, hidden: bool) {
    widget.set_cursor_from_name(hidden.then_some("none"));
}

pub fn widget_size(widget: &impl IsA<gtk::Widget>) -> Size {
    Size::new(widget.width() as f64, widget.height() as f64)
}

pub fn deck_key(key: gdk::Key) -> Option<DeckKey> {
    let nav = match key {
        gdk::Key::Escape => return Some(DeckKey::Escape),
        gdk::Key::Down | gdk::Key::KP_Down => NavKey::ArrowDown,
        gdk::Key::Up | gdk::Key::KP_Up => NavKey::ArrowUp,
        gdk::Key::Page_Down | gdk::Key::KP_Page_Down => NavKey::PageDown,
        gdk::Key::Page_Up | gdk::Key::KP_Page_Up => NavKey::PageUp,
        gdk::Key::space => NavKey::Space,
        gdk::Key::Home | gdk::Key::KP_Home => NavKey::Home,
        gdk::Key::End | gdk::Key::KP_End => NavKey::End,
        _ => {
            let digit = key.to_unicode()?.to_digit(10)?;
            NavKey::Digit(digit as u8)
        }
    };
    Some(DeckKey::Nav(nav))
}
