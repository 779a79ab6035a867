//! Polled input snapshots with edge detection.
//!
//! The host polls the device once per update tick and hands the "currently
//! pressed" set to a tracker via `advance`. Level queries (`is_down`) read the
//! current snapshot; edge queries (`just_pressed` / `just_released`) diff it
//! against the previous one, so they are true for exactly one tick.
//!
//! Gamepads are not global: the application owns a `PlayerSlots` registry and
//! looks trackers up by `PlayerIndex`.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    Enter,
    F1,
    F2,
    F3,
    F4,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LeftShoulder,
    RightShoulder,
}

/// Previous/current snapshot pair for any button-like input.
#[derive(Debug, Clone)]
pub struct SnapshotTracker<T: Copy + Eq + Hash> {
    previous: HashSet<T>,
    current: HashSet<T>,
}

impl<T: Copy + Eq + Hash> SnapshotTracker<T> {
    pub fn new() -> Self {
        Self {
            previous: HashSet::new(),
            current: HashSet::new(),
        }
    }

    /// Install this tick's snapshot; the old current becomes previous.
    pub fn advance<I: IntoIterator<Item = T>>(&mut self, pressed: I) {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.current.extend(pressed);
    }

    pub fn is_down(&self, input: T) -> bool {
        self.current.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.current.contains(&input) && !self.previous.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        !self.current.contains(&input) && self.previous.contains(&input)
    }

    pub fn pressed(&self) -> impl Iterator<Item = &T> {
        self.current.iter()
    }
}

impl<T: Copy + Eq + Hash> Default for SnapshotTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type KeyboardTracker = SnapshotTracker<Key>;
pub type GamePadTracker = SnapshotTracker<Button>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerIndex {
    One,
    Two,
    Three,
    Four,
}

impl PlayerIndex {
    pub const ALL: [PlayerIndex; 4] = [
        PlayerIndex::One,
        PlayerIndex::Two,
        PlayerIndex::Three,
        PlayerIndex::Four,
    ];

    fn slot(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
            Self::Four => 3,
        }
    }
}

/// One value per player slot, owned by the application.
#[derive(Debug, Clone, Default)]
pub struct PlayerSlots<T> {
    slots: [T; 4],
}

impl<T> PlayerSlots<T> {
    pub fn from_fn(mut f: impl FnMut(PlayerIndex) -> T) -> Self {
        Self {
            slots: PlayerIndex::ALL.map(&mut f),
        }
    }

    pub fn get(&self, player: PlayerIndex) -> &T {
        &self.slots[player.slot()]
    }

    pub fn get_mut(&mut self, player: PlayerIndex) -> &mut T {
        &mut self.slots[player.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerIndex, &T)> {
        PlayerIndex::ALL.into_iter().zip(self.slots.iter())
    }
}
