pub mod layout;
pub mod model;
pub mod view;

pub use layout::{DeckLayout, ModalLayout, PageLayout, Target};
pub use model::DeckState;
pub use view::draw;

pub const WHEEL_STEP: f64 = 100.0; // wheel notch expressed in pixels
pub const MARGIN: f64 = 80.0;
pub const TOP: f64 = 110.0;
pub const TAG_SIZE: f64 = 14.0;
pub const TITLE_SIZE: f64 = 52.0;
pub const SUBTITLE_SIZE: f64 = 20.0;
pub const CARD_TITLE_SIZE: f64 = 18.0;
pub const BODY_SIZE: f64 = 15.0;
pub const CHAR_WIDTH: f64 = 0.55; // average glyph advance relative to font size
pub const LINE_HEIGHT: f64 = 1.5;
pub const CARD_MIN_WIDTH: f64 = 220.0;
pub const CARD_HEIGHT: f64 = 150.0;
pub const CARD_GAP: f64 = 24.0;
pub const CARD_PADDING: f64 = 20.0;
pub const CTA_WIDTH: f64 = 240.0;
pub const CTA_HEIGHT: f64 = 54.0;
pub const DOT_RADIUS: f64 = 6.0;
pub const DOT_SPACING: f64 = 30.0;
pub const DOT_HIT: f64 = 24.0;
pub const DOT_INSET: f64 = 40.0;
pub const MODAL_MARGIN: f64 = 60.0;
pub const MODAL_PADDING: f64 = 32.0;
pub const MODAL_TITLE_SIZE: f64 = 28.0;
pub const CLOSE_SIZE: f64 = 36.0;
pub const QUESTION_HEIGHT: f64 = 56.0;
pub const QUESTION_GAP: f64 = 12.0;
pub const EXPANDABLE_HEADER: f64 = 44.0;
pub const EXCHANGE_CARD_HEIGHT: f64 = 64.0;
pub const TRANSITION_SLICES: usize = 5;
pub const ORB_COUNT: usize = 3;
pub const SHAPE_COUNT: usize = 4;
pub const TITLE_PARALLAX: f64 = 0.02;
pub const CURSOR_RADIUS: f64 = 6.0;
pub const CURSOR_GLOW_RADIUS: f64 = 20.0;
pub const CURSOR_HOVER_SCALE: f64 = 1.8;
