//! Inspection state shared between the map presenter and the refresh
//! controller.
//!
//! The presenter owns the [`InspectionState`] and is the only writer. The
//! refresh controller gets a [`StateView`], which can read the state and wait
//! for it to change but never set it.

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::map::MarkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Refresh active.
    #[default]
    Idle,
    /// A train popup is open; refresh paused.
    Inspecting { marker: MarkerId, train_number: u32, generation: u64 },
}

impl ViewState {
    pub const fn is_inspecting(&self) -> bool {
        matches!(self, Self::Inspecting { .. })
    }
}

/// Identifies one composition request. Only a ticket whose generation still
/// matches the current inspection may update the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionTicket {
    pub generation: u64,
    pub marker: MarkerId,
    pub train_number: u32,
    pub departure_date: NaiveDate,
}

#[derive(Debug)]
pub struct InspectionState {
    tx: watch::Sender<ViewState>,
    generation: u64,
}

impl Default for InspectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectionState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewState::Idle);
        Self { tx, generation: 0 }
    }

    pub fn get(&self) -> ViewState {
        *self.tx.borrow()
    }

    pub fn is_inspecting(&self) -> bool {
        self.get().is_inspecting()
    }

    /// Enter (or re-target) an inspection. Each call yields a fresh generation.
    pub fn begin(
        &mut self, marker: MarkerId, train_number: u32, departure_date: NaiveDate,
    ) -> InspectionTicket {
        self.generation += 1;
        let generation = self.generation;
        self.tx.send_replace(ViewState::Inspecting { marker, train_number, generation });
        InspectionTicket { generation, marker, train_number, departure_date }
    }

    pub fn end(&mut self) {
        self.tx.send_replace(ViewState::Idle);
    }

    pub fn is_current(&self, ticket: &InspectionTicket) -> bool {
        matches!(self.get(), ViewState::Inspecting { generation, .. } if generation == ticket.generation)
    }

    pub fn subscribe(&self) -> StateView {
        StateView { rx: self.tx.subscribe() }
    }
}

/// Read-only handle on an [`InspectionState`].
#[derive(Debug, Clone)]
pub struct StateView {
    rx: watch::Receiver<ViewState>,
}

impl StateView {
    pub fn get(&self) -> ViewState {
        *self.rx.borrow()
    }

    pub fn is_inspecting(&self) -> bool {
        self.get().is_inspecting()
    }

    /// Resolves once the state is `Idle`. Never resolves if the owner is
    /// dropped while inspecting.
    pub async fn wait_idle(&mut self) {
        if self.rx.wait_for(|state| !state.is_inspecting()).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Resolves when the state switches to `Inspecting`.
    pub async fn wait_inspecting(&mut self) {
        if self.rx.wait_for(ViewState::is_inspecting).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
