//! Thumbs-up tokens that float up from the "我好棒！" button.

use rand::Rng;

pub const EMOJI: &str = "👍";
/// Horizontal scatter either side of the button centre.
const SPREAD_X: f64 = 60.0;
/// Maximum lift above the button's top edge.
const LIFT_Y: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmojiBurst {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

/// Live tokens. Every tap adds a batch; the whole batch is removed together
/// when its timer runs out.
#[derive(Debug, Default)]
pub struct EmojiPool {
    next_id: u64,
    live: Vec<EmojiBurst>,
}

impl EmojiPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> &[EmojiBurst] {
        &self.live
    }

    /// Add `count` tokens scattered around the top centre of a button and
    /// return the new batch.
    pub fn spawn<R: Rng + ?Sized>(&mut self, count: usize, center_x: f64, top_y: f64, rng: &mut R) -> Vec<EmojiBurst> {
        let batch: Vec<EmojiBurst> = (0..count)
            .map(|_| {
                self.next_id += 1;
                EmojiBurst {
                    id: self.next_id,
                    x: center_x + rng.gen_range(-SPREAD_X..SPREAD_X),
                    y: top_y - rng.gen_range(0.0..LIFT_Y),
                }
            })
            .collect();
        self.live.extend_from_slice(&batch);
        batch
    }

    /// Drop every token whose id is in `ids`. Returns how many were removed.
    pub fn expire(&mut self, ids: &[u64]) -> usize {
        let before = self.live.len();
        self.live.retain(|e| !ids.contains(&e.id));
        before - self.live.len()
    }
}
