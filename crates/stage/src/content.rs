use crate::modal::{ExchangeId, ModalId, PanelId};
use crate::registry::ElementRegistry;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_DECK: &str = include_str!("default_deck.toml");
const DECK_FILE: &str = "podium/deck.toml";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Deck error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Deck file {0} does not exist")]
    Missing(PathBuf),
    #[error("Deck has no pages")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStyle {
    #[default]
    Feature,
    Segment,
    Step,
    Contact,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardSpec {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub style: CardStyle,
    #[serde(default)]
    pub segment: Option<ModalId>,
    /// Animate in when the card first scrolls into view.
    #[serde(default)]
    pub reveal: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageSpec {
    #[serde(default)]
    pub tag: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub cards: Vec<CardSpec>,
    #[serde(default)]
    pub cta: Option<String>,
}

impl PageSpec {
    pub fn title_words(&self) -> impl Iterator<Item = &str> {
        self.title.split_whitespace()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpandableSpec {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpandableListSpec {
    #[serde(default)]
    pub items: Vec<ExpandableSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelSpec {
    pub id: PanelId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub lists: Vec<ExpandableListSpec>,
    /// Show the modal's exchange cards below the body.
    #[serde(default)]
    pub show_exchanges: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionSpec {
    pub label: String,
    pub target: PanelId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeSpec {
    pub id: ExchangeId,
    pub name: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModalSpec {
    pub id: ModalId,
    pub title: String,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    #[serde(default)]
    pub exchanges: Vec<ExchangeSpec>,
}

impl ModalSpec {
    pub fn panel(&self, id: &PanelId) -> Option<&PanelSpec> {
        self.panels.iter().find(|p| &p.id == id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DeckContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageSpec>,
    #[serde(default)]
    pub modals: Vec<ModalSpec>,
}

impl DeckContent {
    pub fn embedded() -> Result<Self, ContentError> {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_DECK,
                config::FileFormat::Toml,
            ))
            .build()?;
        Self::validated(s.try_deserialize()?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ContentError> {
        if !path.exists() {
            return Err(ContentError::Missing(path.to_path_buf()));
        }
        let s = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()?;
        Self::validated(s.try_deserialize()?)
    }

    fn validated(deck: Self) -> Result<Self, ContentError> {
        if deck.pages.is_empty() {
            return Err(ContentError::Empty);
        }
        Ok(deck)
    }
}

/// First `podium/deck.toml` found in the XDG data directories.
pub fn find_deck_file() -> Option<PathBuf> {
    let xdg = xdg::BaseDirectories::new();
    let mut dirs = Vec::new();

    if let Some(home) = xdg.get_data_home() {
        dirs.push(home);
    }
    dirs.extend(xdg.get_data_dirs());

    dirs.into_iter()
        .map(|d| d.join(DECK_FILE))
        .find(|p| p.exists())
}

/// Loads the deck from `path`, then the XDG data dirs, then the embedded
/// default. Failures are logged and fall through to the next source.
pub fn load_or_default(path: Option<&Path>) -> DeckContent {
    let candidates = path.map(Path::to_path_buf).into_iter().chain(find_deck_file());

    for candidate in candidates {
        match DeckContent::from_file(&candidate) {
            Ok(deck) => {
                log::info!("Loaded deck from {}", candidate.display());
                return deck;
            }
            Err(e) => log::error!("Failed to load deck {}: {}", candidate.display(), e),
        }
    }

    DeckContent::embedded().unwrap_or_else(|e| {
        log::error!("Embedded deck is invalid: {}", e);
        DeckContent::default()
    })
}

/// Writes the embedded deck next to the user's data so it can be edited.
pub fn write_default_deck() -> std::io::Result<PathBuf> {
    let xdg = xdg::BaseDirectories::new();
    let home = xdg.get_data_home().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no XDG data home")
    })?;
    let path = home.join(DECK_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs::write(&path, DEFAULT_DECK)?;
    }
    Ok(path)
}

impl ElementRegistry for DeckContent {
    fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    fn modal(&self, id: ModalId) -> Option<&ModalSpec> {
        self.modals.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn embedded_deck_is_complete() {
        let deck = DeckContent::embedded().unwrap();
        assert_eq!(deck.page_count(), 4);
        for id in ModalId::iter() {
            let modal = deck.modal(id).unwrap();
            assert!(
                modal.panel(&PanelId::from(crate::modal::INTRO_PANEL)).is_some(),
                "{id} has no intro panel"
            );
            for q in &modal.questions {
                assert!(modal.panel(&q.target).is_some(), "{id}: dangling {}", q.target);
            }
        }
        assert!(!deck.modal(ModalId::Private).unwrap().exchanges.is_empty());
    }

    #[test]
    fn every_segment_has_a_card() {
        let deck = DeckContent::embedded().unwrap();
        let mut segments: Vec<ModalId> = deck.segment_cards().into_iter().map(|(_, _, id)| id).collect();
        segments.sort_by_key(|id| *id as usize);
        assert_eq!(segments, ModalId::iter().collect::<Vec<_>>());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = DeckContent::from_file(Path::new("/nonexistent/podium/deck.toml")).unwrap_err();
        assert!(matches!(err, ContentError::Missing(_)));
    }

    #[test]
    fn card_deserializes_with_defaults() {
        let card: CardSpec =
            serde_json::from_str(r#"{"title": "Debt", "segment": "debt"}"#).unwrap();
        assert_eq!(card.segment, Some(ModalId::Debt));
        assert_eq!(card.style, CardStyle::Feature);
        assert!(card.body.is_empty());
    }
}
