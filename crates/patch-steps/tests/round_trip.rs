//! Randomized diff -> encode -> decode -> patch round trips.
//!
//! Seeds are fixed, so a failing seed reproduces exactly.

use serde_json::Value;

use patch_steps::patch::codec::json as codec;
use patch_steps::patch::{DebugState, DenyLoader, PatchDocument, Patcher};
use patch_steps::patch_diff::{diff, DiffSettings};
use patch_steps_util::{copy, deep_equal, RandomJson};

fn apply(root: &mut Value, doc: &PatchDocument) {
    let mut debug = DebugState::new();
    Patcher::new(&DenyLoader)
        .patch_traced(root, doc, "<round-trip>", &mut debug)
        .unwrap_or_else(|e| panic!("{e}\n{}", debug.render()));
}

fn assert_round_trip(a: &Value, b: &Value, settings: &DiffSettings, seed: u64) {
    let steps = diff(a, b, settings).expect("object roots are always patchable");

    // Through the wire format: diff output must be directly applicable.
    let encoded = codec::to_json_steps(&steps);
    let decoded = codec::from_json_steps(&encoded)
        .unwrap_or_else(|e| panic!("seed {seed}: diff output failed to decode: {e}"));
    assert_eq!(steps, decoded, "seed {seed}: codec round trip changed steps");

    let mut doc = copy(a);
    apply(&mut doc, &PatchDocument::Steps(decoded));
    assert!(
        deep_equal(&doc, b),
        "seed {seed}: applying the diff did not reproduce the target\n\
         a: {a}\nb: {b}\ngot: {doc}\nsteps: {encoded}"
    );
}

#[test]
fn random_mutations_round_trip() {
    let settings = DiffSettings::default();
    for seed in 0..200 {
        let mut gen = RandomJson::new(seed);
        let a = gen.document();
        let b = gen.mutate(&a);
        assert_round_trip(&a, &b, &settings, seed);
    }
}

#[test]
fn unrelated_documents_round_trip() {
    let settings = DiffSettings::default();
    for seed in 500..560 {
        let a = RandomJson::new(seed).document();
        let b = RandomJson::new(seed + 10_000).document();
        assert_round_trip(&a, &b, &settings, seed);
    }
}

#[test]
fn round_trip_with_comments_and_without_optimization() {
    let settings = DiffSettings {
        comment: Some("root".into()),
        optimize: false,
        ..DiffSettings::default()
    };
    for seed in 900..940 {
        let mut gen = RandomJson::new(seed);
        let a = gen.document();
        let b = gen.mutate(&a);
        assert_round_trip(&a, &b, &settings, seed);
    }
}

#[test]
fn diff_against_self_is_always_empty() {
    let settings = DiffSettings::default();
    for seed in 0..100 {
        let doc = RandomJson::new(seed).document();
        let steps = diff(&doc, &doc, &settings).unwrap();
        assert!(steps.is_empty(), "seed {seed}: {steps:?}");
    }
}

#[test]
fn copies_are_never_entangled_by_patching() {
    let settings = DiffSettings::default();
    for seed in 300..330 {
        let mut gen = RandomJson::new(seed);
        let a = gen.document();
        let b = gen.mutate(&a);
        let pristine = copy(&a);
        let steps = diff(&a, &b, &settings).unwrap();
        let mut doc = copy(&a);
        apply(&mut doc, &PatchDocument::Steps(steps));
        // The source document the diff was computed from is untouched.
        assert!(deep_equal(&a, &pristine), "seed {seed}");
    }
}
