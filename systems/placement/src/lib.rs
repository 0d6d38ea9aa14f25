#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure drag-and-drop system that turns pointer gestures into drop commands.
//!
//! The system walks a small state machine: a gesture starts a drag, the end
//! of the gesture emits [`Command::DropItem`] and parks the session until the
//! world answers, and the answer always brings the system back to idle.

use space_defense_core::{CellCoord, Command, DragSource, Event, ItemId, PlacementError, WorldPoint};

/// A drag gesture in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    /// What is being dragged.
    pub source: DragSource,
    /// Where the dragged entity rests when no drag is active.
    pub origin: WorldPoint,
    /// Latest pointer position.
    pub position: WorldPoint,
}

/// Phases of the drag-and-drop protocol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementState {
    /// No gesture in progress.
    Idle,
    /// The pointer carries an entity.
    Dragging(DragSession),
    /// A drop was submitted and awaits the world's verdict.
    Resolving(DragSession),
}

/// Verdict reported once a drop resolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DropOutcome {
    /// The entity now occupies a grid cell.
    Placed {
        /// Item that occupies the cell.
        item: ItemId,
        /// Cell the item occupies.
        cell: CellCoord,
    },
    /// The entity bounced back.
    Rejected {
        /// Reason the world refused the drop.
        reason: PlacementError,
        /// Position the entity returned to.
        return_to: WorldPoint,
    },
    /// The dragged item left the world before the drop resolved.
    Discarded,
}

/// Drag-and-drop system.
#[derive(Debug, Clone)]
pub struct Placement {
    state: PlacementState,
}

impl Default for Placement {
    fn default() -> Self {
        Self::new()
    }
}

impl Placement {
    /// Creates a new idle placement system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PlacementState::Idle,
        }
    }

    /// Current phase of the protocol.
    #[must_use]
    pub const fn state(&self) -> &PlacementState {
        &self.state
    }

    /// Active drag session, if the pointer carries an entity.
    #[must_use]
    pub fn dragging(&self) -> Option<&DragSession> {
        match &self.state {
            PlacementState::Dragging(session) => Some(session),
            PlacementState::Idle | PlacementState::Resolving(_) => None,
        }
    }

    /// Starts a drag. Returns `false` when another gesture is in progress.
    pub fn begin(&mut self, source: DragSource, origin: WorldPoint) -> bool {
        if self.state != PlacementState::Idle {
            return false;
        }
        self.state = PlacementState::Dragging(DragSession {
            source,
            origin,
            position: origin,
        });
        true
    }

    /// Follows the pointer while dragging.
    pub fn drag_to(&mut self, position: WorldPoint) {
        if let PlacementState::Dragging(session) = &mut self.state {
            session.position = position;
        }
    }

    /// Ends the gesture at `position` and submits the drop.
    pub fn end(&mut self, position: WorldPoint, out: &mut Vec<Command>) {
        let PlacementState::Dragging(mut session) = self.state else {
            return;
        };
        session.position = position;
        self.state = PlacementState::Resolving(session);
        out.push(Command::DropItem {
            source: session.source,
            position,
        });
    }

    /// Consumes the world's answer to a submitted drop.
    ///
    /// Returns `None` unless a drop was awaiting resolution; otherwise the
    /// system is idle again afterwards.
    pub fn handle(&mut self, events: &[Event]) -> Option<DropOutcome> {
        let PlacementState::Resolving(session) = self.state else {
            return None;
        };
        self.state = PlacementState::Idle;

        let outcome = events.iter().find_map(|event| match event {
            Event::ItemPlaced {
                item,
                kind,
                cell,
                from_toolbar,
            } => {
                let matches = match session.source {
                    DragSource::Toolbar(template) => *from_toolbar && template == *kind,
                    DragSource::Item(dragged) => !*from_toolbar && dragged == *item,
                };
                matches.then_some(DropOutcome::Placed {
                    item: *item,
                    cell: *cell,
                })
            }
            Event::PlacementRejected {
                source,
                reason,
                return_to,
            } if *source == session.source => Some(DropOutcome::Rejected {
                reason: *reason,
                return_to: *return_to,
            }),
            _ => None,
        });

        Some(outcome.unwrap_or(DropOutcome::Discarded))
    }
}
