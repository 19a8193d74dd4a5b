//! Headless presenter that reports session output through `tracing`.

use std::collections::BTreeMap;

use glam::Vec2;
use mob_runner_core::{Counter, MobId, MobKind, Presenter, Screen, SessionPhase, Sound};

/// Tracks what a real front end would display and logs every change.
#[derive(Debug, Default)]
pub(crate) struct LogPresenter {
    visuals: BTreeMap<MobId, MobKind>,
    screen: Option<Screen>,
    population: u64,
    distance: u64,
    score: u64,
    stars: u8,
    sounds: u64,
}

impl LogPresenter {
    /// Number of mob visuals currently instantiated.
    pub(crate) fn live_visuals(&self) -> usize {
        self.visuals.len()
    }

    pub(crate) fn visuals_of(&self, kind: MobKind) -> usize {
        self.visuals.values().filter(|visual| **visual == kind).count()
    }

    pub(crate) const fn population(&self) -> u64 {
        self.population
    }

    pub(crate) const fn distance(&self) -> u64 {
        self.distance
    }

    pub(crate) const fn score(&self) -> u64 {
        self.score
    }

    pub(crate) const fn stars(&self) -> u8 {
        self.stars
    }

    pub(crate) const fn sounds(&self) -> u64 {
        self.sounds
    }
}

impl Presenter for LogPresenter {
    fn show_screen(&mut self, screen: Screen) {
        tracing::debug!(?screen, "screen shown");
        if screen == Screen::LevelComplete {
            self.stars = 0;
        }
        self.screen = Some(screen);
    }

    fn hide_screen(&mut self, screen: Screen) {
        tracing::debug!(?screen, "screen hidden");
        if self.screen == Some(screen) {
            self.screen = None;
        }
    }

    fn play_sound(&mut self, sound: Sound) {
        tracing::trace!(?sound, "sound");
        self.sounds += 1;
    }

    fn spawn_visual(&mut self, mob: MobId, kind: MobKind, position: Vec2) {
        tracing::trace!(mob = mob.get(), ?kind, x = position.x, y = position.y, "visual spawned");
        if self.visuals.insert(mob, kind).is_some() {
            tracing::warn!(mob = mob.get(), "visual spawned twice");
        }
    }

    fn release_visual(&mut self, mob: MobId) {
        tracing::trace!(mob = mob.get(), "visual released");
        if self.visuals.remove(&mob).is_none() {
            tracing::warn!(mob = mob.get(), "released a visual that was never spawned");
        }
    }

    fn set_counter(&mut self, counter: Counter, value: u64) {
        match counter {
            Counter::Population => self.population = value,
            Counter::Distance => self.distance = value,
            Counter::Score => self.score = value,
        }
    }

    fn reveal_star(&mut self, index: u8) {
        tracing::info!(star = index + 1, "star revealed");
        self.stars = self.stars.max(index + 1);
    }

    fn phase_changed(&mut self, from: SessionPhase, to: SessionPhase) {
        tracing::debug!(?from, ?to, population = self.population, "presenter saw phase change");
    }
}
