use crate::content::{CardSpec, ModalSpec, PageSpec};
use crate::modal::ModalId;

/// Lookup of the interactive elements of a deck by role.
///
/// Controllers are built once against a registry instead of searching for
/// their elements on every interaction. Anything a registry does not know
/// about is treated as absent and the feature depending on it stays off.
pub trait ElementRegistry {
    fn pages(&self) -> &[PageSpec];

    fn modal(&self, id: ModalId) -> Option<&ModalSpec>;

    fn page_count(&self) -> usize {
        self.pages().len()
    }

    fn page(&self, index: usize) -> Option<&PageSpec> {
        self.pages().get(index)
    }

    /// Cards that open a modal, with the page they live on.
    fn segment_cards(&self) -> Vec<(usize, &CardSpec, ModalId)> {
        self.pages()
            .iter()
            .enumerate()
            .flat_map(|(page, spec)| {
                spec.cards
                    .iter()
                    .filter_map(move |card| card.segment.map(|id| (page, card, id)))
            })
            .collect()
    }
}
