use podium::config;
use podium::gui::app::AppModel;
use podium::gui::deck::DeckState;
use podium::sys::runtime;
use relm4::prelude::*;
use stage::content;
use stage::geometry::Size;

fn main() {
    env_logger::init();

    let config = config::load_or_default();
    let deck = content::load_or_default(config.content.as_deref());
    log::info!(
        "Presenting '{}' ({} pages). Navigate with the wheel, arrows, PageUp/PageDown, Home/End or 1-9",
        deck.title,
        deck.pages.len()
    );

    let viewport = Size::new(config.window.width as f64, config.window.height as f64);
    let state = DeckState::new(deck, &config, viewport);

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    let app = RelmApp::new("org.podium.deck");

    app.run::<AppModel>((state, config, rx));
}
