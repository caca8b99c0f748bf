use std::cell::RefCell;
use std::rc::Rc;

use super::Placeholder;
use crate::images::{DecodedImage, FetchError};

/// What a placeholder currently shows.
#[derive(Debug, Clone, Default)]
pub enum BindingState {
    #[default]
    Idle,
    Loading,
    Displayed(DecodedImage),
    Failed(FetchError),
}

impl BindingState {
    pub fn is_settled(&self) -> bool {
        matches!(self, BindingState::Displayed(_) | BindingState::Failed(_))
    }
}

#[derive(Debug, Default)]
struct SlotState {
    binding: BindingState,
    detached: bool,
}

/// Render-thread handle to one cover position on screen.
///
/// Clones share state, so the view keeps one and hands another to the loader.
#[derive(Debug, Clone, Default)]
pub struct CoverSlot {
    state: Rc<RefCell<SlotState>>,
}

impl CoverSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BindingState {
        self.state.borrow().binding.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().binding.is_settled()
    }

    pub fn image(&self) -> Option<DecodedImage> {
        match &self.state.borrow().binding {
            BindingState::Displayed(image) => Some(image.clone()),
            _ => None,
        }
    }

    /// The view went away; later deliveries for this slot are dropped.
    pub fn detach(&self) {
        self.state.borrow_mut().detached = true;
    }
}

impl Placeholder for CoverSlot {
    fn show_loading(&mut self) {
        self.state.borrow_mut().binding = BindingState::Loading;
    }

    fn show_image(&mut self, image: &DecodedImage) {
        self.state.borrow_mut().binding = BindingState::Displayed(image.clone());
    }

    fn show_failed(&mut self, error: &FetchError) {
        self.state.borrow_mut().binding = BindingState::Failed(error.clone());
    }

    fn is_attached(&self) -> bool {
        !self.state.borrow().detached
    }
}
