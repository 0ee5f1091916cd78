// Integration tests (native) for the `grade-reveal` crate.
// These tests avoid wasm-specific functionality and exercise pure Rust logic so
// they can run under `cargo test` on the host.

use std::cell::Cell;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::executor::block_on;
use rand::SeedableRng;
use rand::rngs::StdRng;

use grade_reveal::encouragement::GeminiClient;
use grade_reveal::fireworks::render::{Backdrop, backdrop, disks};
use grade_reveal::fireworks::{Controller, PhaseKind, Simulation, Viewport};
use grade_reveal::shell::{RevealFlow, View};
use grade_reveal::{EncouragementProvider, FALLBACK_COMMENTS, FireworksConfig, RevealConfig, StudentData};

// Decoding the documented example payload.
#[test]
fn decode_example_payload() {
    let encoded = STANDARD.encode("{\"name\":\"小華\",\"grade\":\"B\"}");
    let data = StudentData::decode_or_default(&encoded);
    assert_eq!(data, StudentData { name: "小華".into(), grade: "B".into(), context: String::new() });
}

#[test]
fn decode_helper_export_returns_triple() {
    assert_eq!(grade_reveal::decode_student_data("!!"), vec!["".to_string(), "A".to_string(), "".to_string()]);
}

// Without a key the provider never builds a client and answers from the pool.
#[test]
fn unconfigured_provider_answers_from_pool() {
    let config = RevealConfig { api_key: None, ..RevealConfig::default() };
    let client = GeminiClient::from_config(&config);
    assert!(client.is_none());
    let mut provider = EncouragementProvider::new(client, config.temperature, StdRng::seed_from_u64(1));
    assert!(!provider.has_generator());
    let text = block_on(provider.provide("小明", "A+", "主動幫助同學"));
    assert!(FALLBACK_COMMENTS.contains(&text.as_str()));
}

// Whole page flow with the animation driven frame by frame instead of by the browser.
#[test]
fn animation_completion_unlocks_reveal_once() {
    let flow = Rc::new(std::cell::RefCell::new(RevealFlow::new()));
    let completions = Rc::new(Cell::new(0u32));
    let (f, c) = (flow.clone(), completions.clone());
    let sim = Simulation::new(FireworksConfig::default(), Viewport::new(390.0, 844.0));
    let mut controller = Controller::new(sim, move || {
        c.set(c.get() + 1);
        f.borrow_mut().animation_finished();
    });

    let mut rng = StdRng::seed_from_u64(99);
    let mut backdrops = Vec::new();
    for _ in 0..600 {
        backdrops.push(backdrop(controller.simulation().phase()));
        controller.tick(&mut rng);
    }

    assert_eq!(completions.get(), 1);
    assert_eq!(controller.visited(), &[PhaseKind::Ascending, PhaseKind::Exploding, PhaseKind::Frozen]);
    assert_eq!(flow.borrow().view(), View::Ready);
    // trails while moving, hard clears after settling, never back
    let first_clear = backdrops.iter().position(|b| *b == Backdrop::Clear).unwrap();
    assert!(backdrops[..first_clear].iter().all(|b| *b == Backdrop::Trail));
    assert!(backdrops[first_clear..].iter().all(|b| *b == Backdrop::Clear));
    assert_eq!(disks(controller.simulation()).len(), 500);

    let ticket = flow.borrow_mut().begin_reveal().unwrap();
    let mut provider = EncouragementProvider::<GeminiClient>::new(None, 0.7, StdRng::seed_from_u64(2));
    let text = block_on(provider.provide("", "A", ""));
    assert!(flow.borrow_mut().comment_arrived(ticket, text));
    assert!(flow.borrow_mut().show_result(ticket));
    assert_eq!(flow.borrow().view(), View::Result);
}
