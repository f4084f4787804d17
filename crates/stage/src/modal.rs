use crate::content::ModalSpec;
use crate::registry::ElementRegistry;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::collections::HashMap;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

pub const INTRO_PANEL: &str = "intro";
/// Viewports narrower than this get the scroll-into-view behaviour.
pub const NARROW_VIEWPORT: f64 = 900.0;
pub const DETAIL_SCROLL_DELAY: Duration = Duration::from_millis(150);
pub const DETAIL_SCROLL_OFFSET: f64 = 15.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ModalId {
    Private,
    Transfer,
    Innovative,
    Project,
    Debt,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PanelId(String);

crate::impl_string_newtype!(PanelId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ExchangeId(String);

crate::impl_string_newtype!(ExchangeId);

/// Side effects the host must carry out after a modal operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalEffect {
    LockScroll,
    UnlockScroll,
    ScrollPanelToTop(ModalId),
    ScrollDetailIntoView {
        detail: ExchangeId,
        delay: Duration,
        offset: f64,
    },
}

/// Accordion over a fixed number of items: at most one open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accordion {
    len: usize,
    open: Option<usize>,
}

impl Accordion {
    pub fn new(len: usize) -> Self {
        Self { len, open: None }
    }

    /// Closes every sibling and toggles `item`. Returns whether `item` is
    /// open afterwards.
    pub fn toggle(&mut self, item: usize) -> bool {
        if item >= self.len {
            return false;
        }
        self.open = match self.open {
            Some(open) if open == item => None,
            _ => Some(item),
        };
        self.open.is_some()
    }

    pub fn open_item(&self) -> Option<usize> {
        self.open
    }

    pub fn is_open(&self, item: usize) -> bool {
        self.open == Some(item)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone)]
pub struct ModalState {
    id: ModalId,
    panels: Vec<PanelId>,
    question_targets: Vec<PanelId>,
    active_question: Option<usize>,
    active_panel: Option<PanelId>,
    accordions: HashMap<PanelId, Vec<Accordion>>,
    exchanges: Vec<ExchangeId>,
    active_exchange: Option<ExchangeId>,
}

impl ModalState {
    fn from_spec(spec: &ModalSpec) -> Self {
        let accordions = spec
            .panels
            .iter()
            .map(|panel| {
                let lists = panel.lists.iter().map(|l| Accordion::new(l.items.len()));
                (panel.id.clone(), lists.collect())
            })
            .collect();

        // exchange cards only exist in the private segment
        let exchanges = match spec.id {
            ModalId::Private => spec.exchanges.iter().map(|e| e.id.clone()).collect(),
            _ => Vec::new(),
        };

        let mut state = Self {
            id: spec.id,
            panels: spec.panels.iter().map(|p| p.id.clone()).collect(),
            question_targets: spec.questions.iter().map(|q| q.target.clone()).collect(),
            active_question: None,
            active_panel: None,
            accordions,
            exchanges,
            active_exchange: None,
        };
        state.reset_to_intro();
        state
    }

    fn reset_to_intro(&mut self) {
        self.active_question = None;
        self.active_panel = self.panels.iter().find(|p| p.as_str() == INTRO_PANEL).cloned();
    }

    pub fn id(&self) -> ModalId {
        self.id
    }

    pub fn active_question(&self) -> Option<usize> {
        self.active_question
    }

    pub fn active_panel(&self) -> Option<&PanelId> {
        self.active_panel.as_ref()
    }

    pub fn is_panel_active(&self, panel: &PanelId) -> bool {
        self.active_panel.as_ref() == Some(panel)
    }

    pub fn active_exchange(&self) -> Option<&ExchangeId> {
        self.active_exchange.as_ref()
    }

    pub fn accordion(&self, panel: &PanelId, list: usize) -> Option<&Accordion> {
        self.accordions.get(panel).and_then(|lists| lists.get(list))
    }
}

/// Owns the segment modals. At most one modal is open at a time.
#[derive(Debug, Clone, Default)]
pub struct ModalController {
    modals: HashMap<ModalId, ModalState>,
    active: Option<ModalId>,
}

impl ModalController {
    pub fn from_registry(registry: &impl ElementRegistry) -> Self {
        let modals = ModalId::iter()
            .filter_map(|id| registry.modal(id).map(|spec| (id, ModalState::from_spec(spec))))
            .collect::<HashMap<_, _>>();

        for id in ModalId::iter().filter(|id| !modals.contains_key(id)) {
            log::debug!("No markup for modal '{}', segment disabled", id);
        }

        Self {
            modals,
            active: None,
        }
    }

    pub fn active(&self) -> Option<ModalId> {
        self.active
    }

    pub fn is_open(&self, id: ModalId) -> bool {
        self.active == Some(id)
    }

    /// Body scrolling is suspended while any modal is open.
    pub fn scroll_locked(&self) -> bool {
        self.active.is_some()
    }

    pub fn modal(&self, id: ModalId) -> Option<&ModalState> {
        self.modals.get(&id)
    }

    pub fn open(&mut self, id: ModalId, viewport_width: f64) -> Vec<ModalEffect> {
        let Some(state) = self.modals.get_mut(&id) else {
            return Vec::new();
        };

        let was_locked = self.active.is_some();
        self.active = Some(id);
        state.reset_to_intro();

        let mut effects = Vec::new();
        if !was_locked {
            effects.push(ModalEffect::LockScroll);
        }
        if viewport_width < NARROW_VIEWPORT {
            effects.push(ModalEffect::ScrollPanelToTop(id));
        }
        effects
    }

    pub fn close(&mut self, id: ModalId) -> Vec<ModalEffect> {
        if self.active != Some(id) {
            return Vec::new();
        }
        self.close_all()
    }

    pub fn close_all(&mut self) -> Vec<ModalEffect> {
        match self.active.take() {
            Some(_) => vec![ModalEffect::UnlockScroll],
            None => Vec::new(),
        }
    }

    /// Activates question box `index` of modal `id` and the panel it targets.
    /// Returns false when the modal or box does not exist.
    pub fn select_question(&mut self, id: ModalId, index: usize) -> bool {
        let Some(state) = self.modals.get_mut(&id) else {
            return false;
        };
        let Some(target) = state.question_targets.get(index).cloned() else {
            return false;
        };

        state.active_question = Some(index);
        state.active_panel = state.panels.contains(&target).then_some(target);
        true
    }

    /// Accordion toggle. `None` when the list does not exist.
    pub fn toggle_expandable(
        &mut self,
        id: ModalId,
        panel: &PanelId,
        list: usize,
        item: usize,
    ) -> Option<bool> {
        self.modals
            .get_mut(&id)?
            .accordions
            .get_mut(panel)?
            .get_mut(list)
            .map(|accordion| accordion.toggle(item))
    }

    pub fn select_exchange(&mut self, card: &ExchangeId, viewport_width: f64) -> Vec<ModalEffect> {
        let Some(state) = self.modals.get_mut(&ModalId::Private) else {
            return Vec::new();
        };
        if !state.exchanges.contains(card) {
            return Vec::new();
        }

        state.active_exchange = Some(card.clone());
        if viewport_width < NARROW_VIEWPORT {
            vec![ModalEffect::ScrollDetailIntoView {
                detail: card.clone(),
                delay: DETAIL_SCROLL_DELAY,
                offset: DETAIL_SCROLL_OFFSET,
            }]
        } else {
            Vec::new()
        }
    }

    pub fn close_exchange_detail(&mut self) {
        if let Some(state) = self.modals.get_mut(&ModalId::Private) {
            state.active_exchange = None;
        }
    }
}
