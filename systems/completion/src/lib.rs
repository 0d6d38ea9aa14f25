#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Completion checker for plate levels.
//!
//! A level is complete once every plate is claimed and no enemy is alive.
//! Each claim, enemy removal or explosion that leaves both facts true
//! (re)starts a countdown; when it expires the facts are checked again and,
//! if they still hold, a scene transition is requested.

use std::time::Duration;

use space_defense_core::{Command, EnemyView, Event, SceneId};
use tracing::info;

/// Stateful completion system driven by world events.
#[derive(Debug)]
pub struct Completion {
    delay: Duration,
    target: SceneId,
    remaining_slots: usize,
    pending: Option<Duration>,
    finished: bool,
}

impl Completion {
    /// Creates a checker that requests `target` `delay` after completion.
    #[must_use]
    pub const fn new(delay: Duration, target: SceneId, remaining_slots: usize) -> Self {
        Self {
            delay,
            target,
            remaining_slots,
            pending: None,
            finished: false,
        }
    }

    /// Time left before the transition fires, if a countdown is running.
    #[must_use]
    pub const fn pending(&self) -> Option<Duration> {
        self.pending
    }

    /// Consumes the frame's events and emits at most one transition request.
    pub fn handle(&mut self, events: &[Event], enemies: &EnemyView, out: &mut Vec<Command>) {
        if self.finished {
            return;
        }

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    let Some(left) = self.pending else {
                        continue;
                    };
                    if *dt < left {
                        self.pending = Some(left - *dt);
                        continue;
                    }
                    self.pending = None;
                    if self.is_complete(enemies) {
                        info!(target_scene = ?self.target, "level complete");
                        self.finished = true;
                        out.push(Command::RequestTransition {
                            target: self.target,
                        });
                        return;
                    }
                }
                Event::SlotClaimed { remaining, .. } => {
                    self.remaining_slots = *remaining;
                    self.restart_if_complete(enemies);
                }
                Event::EnemyRemoved { .. } | Event::ExplosionTriggered { .. } => {
                    self.restart_if_complete(enemies);
                }
                _ => {}
            }
        }
    }

    fn restart_if_complete(&mut self, enemies: &EnemyView) {
        if self.is_complete(enemies) {
            self.pending = Some(self.delay);
        }
    }

    fn is_complete(&self, enemies: &EnemyView) -> bool {
        self.remaining_slots == 0 && enemies.is_empty()
    }
}
