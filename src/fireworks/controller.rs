//! Phase bookkeeping and the one-shot completion signal.

use rand::Rng;

use super::{PhaseKind, Simulation, Transition, Viewport};

/// Boolean consumed exactly once. `try_fire` answers true on the first call only.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    fired: bool,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Owns one animation run: the simulation, the phases it has passed through and
/// the caller's completion callback.
pub struct Controller {
    sim: Simulation,
    latch: CompletionLatch,
    on_complete: Box<dyn FnMut()>,
    visited: Vec<PhaseKind>,
}

impl Controller {
    pub fn new(sim: Simulation, on_complete: impl FnMut() + 'static) -> Self {
        let visited = vec![sim.kind()];
        Self { sim, latch: CompletionLatch::new(), on_complete: Box::new(on_complete), visited }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn phase(&self) -> PhaseKind {
        self.sim.kind()
    }

    /// Phases entered so far, in order.
    pub fn visited(&self) -> &[PhaseKind] {
        &self.visited
    }

    pub fn is_complete(&self) -> bool {
        self.latch.has_fired()
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Transition> {
        let transition = self.sim.step(rng);
        if transition.is_some() {
            let kind = self.sim.kind();
            if self.visited.last() != Some(&kind) {
                self.visited.push(kind);
            }
        }
        if self.sim.kind() == PhaseKind::Frozen {
            self.signal_complete();
        }
        transition
    }

    /// Invoke the completion callback unless it already ran.
    pub fn signal_complete(&mut self) {
        if self.latch.try_fire() {
            log::debug!("fireworks settled");
            (self.on_complete)();
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.sim.resize(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FireworksConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_controller(viewport: Viewport) -> (Controller, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let sim = Simulation::new(FireworksConfig::default(), viewport);
        (Controller::new(sim, move || c.set(c.get() + 1)), calls)
    }

    #[test]
    fn latch_fires_once() {
        let mut latch = CompletionLatch::new();
        assert!(!latch.has_fired());
        assert!(latch.try_fire());
        assert!(!latch.try_fire());
        assert!(!latch.try_fire());
        assert!(latch.has_fired());
    }

    #[test]
    fn phases_visited_in_order_exactly_once() {
        let (mut ctl, _) = counting_controller(Viewport::new(1024.0, 768.0));
        let mut rng = StdRng::seed_from_u64(11);
        let mut transitions = Vec::new();
        for _ in 0..2_000 {
            if let Some(t) = ctl.tick(&mut rng) {
                transitions.push(t);
            }
        }
        assert_eq!(ctl.visited(), &[PhaseKind::Ascending, PhaseKind::Exploding, PhaseKind::Frozen]);
        assert_eq!(transitions, vec![Transition::Exploded, Transition::Settled]);
    }

    #[test]
    fn completion_callback_runs_once_across_many_frames() {
        let (mut ctl, calls) = counting_controller(Viewport::new(400.0, 400.0));
        let mut rng = StdRng::seed_from_u64(12);
        while !ctl.is_complete() {
            assert_eq!(calls.get(), 0);
            ctl.tick(&mut rng);
        }
        assert_eq!(calls.get(), 1);
        for _ in 0..100 {
            ctl.tick(&mut rng);
            ctl.signal_complete();
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(ctl.phase(), PhaseKind::Frozen);
    }

    #[test]
    fn callback_not_invoked_before_settling() {
        let (mut ctl, calls) = counting_controller(Viewport::new(400.0, 400.0));
        let mut rng = StdRng::seed_from_u64(13);
        while ctl.phase() != PhaseKind::Exploding {
            ctl.tick(&mut rng);
        }
        ctl.tick(&mut rng);
        assert_eq!(calls.get(), 0);
        assert!(!ctl.is_complete());
    }
}
