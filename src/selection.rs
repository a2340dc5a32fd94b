use crate::holon::HolonId;

/// Flow-drawing state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    /// A provisional source is armed and the next distinct node click asks
    /// for a connection.
    SourceArmed { source: HolonId },
}

/// What a node click asks the caller to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Plain selection; flow drawing is off.
    Selected(HolonId),
    /// The node became the provisional flow source.
    SourceArmed(HolonId),
    /// Validate and store `source → destination`, then call
    /// [`SelectionController::commit`] or [`SelectionController::reject`].
    ConnectRequested {
        source: HolonId,
        destination: HolonId,
    },
    /// Clicking the armed source again does nothing.
    Ignored,
}

/// Token for the delayed post-commit reset.
///
/// Only honored while no other transition has happened since it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetTicket {
    generation: u64,
}

impl ResetTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks hover, selection and the provisional source/destination while
/// drawing flows.
///
/// Every transition bumps a generation counter. A [`ResetTicket`] carries
/// the generation at which it was issued so that a delayed reset arriving
/// after the user moved on is a no-op.
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<HolonId>,
    hovered: Option<HolonId>,
    source: Option<HolonId>,
    destination: Option<HolonId>,
    drawing_enabled: bool,
    generation: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match &self.source {
            Some(source) => SelectionState::SourceArmed {
                source: source.clone(),
            },
            None => SelectionState::Idle,
        }
    }

    /// Handle a click on `node_id`.
    pub fn click(&mut self, node_id: &str) -> ClickOutcome {
        if !self.drawing_enabled {
            self.select(node_id);
            return ClickOutcome::Selected(node_id.to_string());
        }

        match self.source.clone() {
            None => {
                self.selected = Some(node_id.to_string());
                self.source = Some(node_id.to_string());
                self.destination = None;
                self.bump();
                ClickOutcome::SourceArmed(node_id.to_string())
            }
            Some(source) if source == node_id => ClickOutcome::Ignored,
            Some(source) => {
                self.selected = Some(node_id.to_string());
                self.destination = Some(node_id.to_string());
                ClickOutcome::ConnectRequested {
                    source,
                    destination: node_id.to_string(),
                }
            }
        }
    }

    /// The requested connection went through; return to `Idle`.
    ///
    /// The destination stays recorded until the returned ticket is redeemed
    /// with [`finish_reset`](Self::finish_reset).
    pub fn commit(&mut self) -> ResetTicket {
        self.source = None;
        self.bump();
        self.ticket()
    }

    /// The requested connection failed validation; stay armed on the same
    /// source.
    pub fn reject(&mut self) {
        self.destination = None;
    }

    /// Redeem a reset ticket. Returns `false` for a stale ticket.
    pub fn finish_reset(&mut self, ticket: ResetTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.source = None;
        self.destination = None;
        self.bump();
        true
    }

    /// A ticket for the current generation.
    pub fn ticket(&self) -> ResetTicket {
        ResetTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: ResetTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Turn flow drawing on or off. Returns `true` if the mode changed.
    ///
    /// Turning it off drops any armed source.
    pub fn set_drawing_enabled(&mut self, enabled: bool) -> bool {
        if self.drawing_enabled == enabled {
            return false;
        }
        self.drawing_enabled = enabled;
        if !enabled {
            self.source = None;
            self.destination = None;
        }
        self.bump();
        true
    }

    /// Flip flow drawing and return the new mode.
    pub fn toggle_drawing(&mut self) -> bool {
        self.set_drawing_enabled(!self.drawing_enabled);
        self.drawing_enabled
    }

    /// A click on empty canvas clears selection and any armed source.
    pub fn pane_click(&mut self) {
        self.selected = None;
        self.source = None;
        self.destination = None;
        self.bump();
    }

    /// Returns `true` if the hovered node changed.
    pub fn hover(&mut self, node_id: Option<&str>) -> bool {
        if self.hovered.as_deref() == node_id {
            return false;
        }
        self.hovered = node_id.map(str::to_string);
        true
    }

    /// Drop every reference to a node that no longer exists.
    pub fn forget(&mut self, node_id: &str) {
        let mut changed = false;
        for slot in [
            &mut self.selected,
            &mut self.source,
            &mut self.destination,
        ] {
            if slot.as_deref() == Some(node_id) {
                *slot = None;
                changed = true;
            }
        }
        if self.hovered.as_deref() == Some(node_id) {
            self.hovered = None;
        }
        if changed {
            self.bump();
        }
    }

    pub fn drawing_enabled(&self) -> bool {
        self.drawing_enabled
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn select(&mut self, node_id: &str) {
        if self.selected.as_deref() != Some(node_id) {
            self.selected = Some(node_id.to_string());
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
