use live_state::{LiveCell, LiveStream, Subscription};

use crate::contract::model::Section;

/// Which dashboard section is showing. Every section is reachable from
/// every other; setting the current one again delivers nothing.
#[derive(Clone)]
pub struct SectionState {
    cell: LiveCell<Section>,
}

impl Default for SectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionState {
    pub fn new() -> Self {
        Self {
            cell: LiveCell::with_value(Section::default()),
        }
    }

    pub fn set_section(&self, section: Section) {
        if self.cell.set_if_changed(section) {
            tracing::debug!(?section, "section changed");
        }
    }

    pub fn current(&self) -> Section {
        self.cell.get().unwrap_or_default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Section) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }

    pub fn stream(&self) -> LiveStream<Section> {
        self.cell.stream()
    }
}
