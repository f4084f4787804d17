pub mod app;
pub mod deck;
pub mod theme;
pub mod window;
