use tracing::{debug, info, warn};

use auth_cell::SessionContext;
use doctor_cell::services::SlotRepository;
use shared_models::scheduling::Slot;

use crate::models::{BookingConfirmation, BookingError, BookingSelection};
use crate::services::booking::BookingCoordinator;

/// One patient's booking flow for one doctor: load candidates, pick one,
/// submit. Candidates are private to the session and go stale as soon as
/// they are loaded; the coordinator re-checks on submit.
pub struct BookingSession {
    doctor_id: String,
    session: SessionContext,
    slots: SlotRepository,
    coordinator: BookingCoordinator,
    candidates: Vec<Slot>,
    selected_slot: Option<String>,
    selection: BookingSelection,
}

impl BookingSession {
    pub fn new(
        doctor_id: impl Into<String>,
        session: SessionContext,
        slots: SlotRepository,
        coordinator: BookingCoordinator,
    ) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            session,
            slots,
            coordinator,
            candidates: Vec::new(),
            selected_slot: None,
            selection: BookingSelection::default(),
        }
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    /// Replaces the candidate list. A selection that is no longer a
    /// candidate is dropped.
    pub async fn load(&mut self) -> &[Slot] {
        self.candidates = self.slots.load_available_slots(&self.doctor_id).await;

        let still_listed = self
            .selected_slot
            .as_ref()
            .is_some_and(|id| self.candidates.iter().any(|slot| &slot.id == id));
        if !still_listed {
            self.clear_selection();
        }

        debug!("Session for doctor {} has {} candidates", self.doctor_id, self.candidates.len());
        &self.candidates
    }

    pub fn candidates(&self) -> &[Slot] {
        &self.candidates
    }

    pub fn selection(&self) -> BookingSelection {
        self.selection
    }

    pub fn selected_slot(&self) -> Option<&str> {
        self.selected_slot.as_deref()
    }

    /// Selecting the selected slot again deselects it. Ids that are not
    /// candidates are ignored.
    pub fn toggle_selection(&mut self, slot_id: &str) {
        if self.selected_slot.as_deref() == Some(slot_id) {
            self.clear_selection();
            return;
        }

        if let Some(slot) = self.candidates.iter().find(|slot| slot.id == slot_id) {
            self.selection = BookingSelection::new(slot.date, slot.start_time);
            self.selected_slot = Some(slot.id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_slot = None;
        self.selection = BookingSelection::default();
    }

    pub fn can_submit(&self) -> bool {
        self.selection.is_complete() && self.session.is_signed_in()
    }

    pub async fn submit(&mut self) -> Result<BookingConfirmation, BookingError> {
        let identity = self.session.current_identity();
        let result = self
            .coordinator
            .submit(identity.as_ref(), &self.doctor_id, self.selection)
            .await;

        match &result {
            Ok(confirmation) => {
                info!("Session booked slot {} of doctor {}", confirmation.slot_id, self.doctor_id);
                self.candidates.retain(|slot| slot.id != confirmation.slot_id);
                self.clear_selection();
            }
            Err(BookingError::Unavailable) => {
                warn!("Selected slot of doctor {} is gone, back to selection", self.doctor_id);
                if let Some(stale) = self.selected_slot.take() {
                    self.candidates.retain(|slot| slot.id != stale);
                }
                self.clear_selection();
            }
            Err(_) => {}
        }

        result
    }
}
