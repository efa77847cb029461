use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use effect_core::{
    AttributeModifier, EffectApplication, EffectDefinition, EffectHooks, EffectId, EffectInstance,
    EffectOwner, EffectState, Tag, TagContainer,
};
use effect_runtime::{
    AbilityComponent, Attribute, FileSnapshotRepository, InMemorySnapshotRepo, RepositoryError,
    RuntimeError, SnapshotRepository,
};

const DT: f64 = 0.125;

fn tags(names: &[&str]) -> TagContainer {
    names.iter().copied().collect()
}

fn component() -> AbilityComponent {
    let mut component = AbilityComponent::default();
    component.define_attribute("Attribute.Health", Attribute::new(100.0).with_clamp(0.0, 100.0));
    component.define_attribute("Attribute.Speed", Attribute::new(600.0));
    component.define_attribute("Attribute.BurnStacks", Attribute::new(0.0));
    component
}

fn burn() -> EffectDefinition {
    EffectDefinition::new("Effect.Burn")
        .with_duration(3.0)
        .with_period(0.5)
        .with_stack_attribute("Attribute.BurnStacks")
        .with_modifier(AttributeModifier::add("Attribute.Health", -4.0))
        .with_granted_tags(tags(&["State.Burning"]))
}

fn haste() -> EffectDefinition {
    EffectDefinition::new("Effect.Haste")
        .with_duration(1.5)
        .with_modifier(AttributeModifier::add("Attribute.Speed", 120.0))
}

/// Deterministic input script: which effects are applied before which step.
fn step_script(component: &mut AbilityComponent, step: u64) {
    match step {
        2 => {
            component
                .apply_effect(burn(), EffectApplication::predicted())
                .unwrap();
        }
        6 | 14 => {
            component
                .apply_effect(haste(), EffectApplication::predicted())
                .unwrap();
        }
        9 => {
            component
                .apply_effect(
                    burn().with_delay(0.25),
                    EffectApplication::predicted(),
                )
                .unwrap();
        }
        _ => {}
    }
}

fn simulate(component: &mut AbilityComponent, until_step: u64) {
    while component.step() < until_step {
        step_script(component, component.step() + 1);
        component.tick(DT);
    }
}

#[test]
fn identical_runs_produce_identical_digests() {
    let mut a = component();
    let mut b = component();
    simulate(&mut a, 40);
    simulate(&mut b, 40);

    let digest = a.state_digest().unwrap();
    assert_eq!(digest, b.state_digest().unwrap());
    assert_eq!(digest.to_hex().len(), 64);
}

#[test]
fn resimulating_from_snapshot_reproduces_state() {
    let mut component = component();
    let repository = InMemorySnapshotRepo::from_config(component.config());

    simulate(&mut component, 7);
    component.save_to(&repository).unwrap();
    simulate(&mut component, 30);
    let expected = component.state_digest().unwrap();
    let expected_health = component.attribute(&Tag::new("Attribute.Health"));

    component.rollback_to(&repository, 7).unwrap();
    assert_eq!(component.step(), 7);
    simulate(&mut component, 30);

    assert_eq!(component.state_digest().unwrap(), expected);
    assert_eq!(component.attribute(&Tag::new("Attribute.Health")), expected_health);
}

#[test]
fn rollback_is_idempotent_past_effect_end() {
    let mut component = component();
    component
        .apply_effect(haste(), EffectApplication::predicted())
        .unwrap();
    let snapshot = component.save();

    let ticks = |component: &mut AbilityComponent, steps: usize| {
        for _ in 0..steps {
            component.tick(DT);
        }
    };

    ticks(&mut component, 20);
    let after_end = component.state_digest().unwrap();
    assert_eq!(component.attribute(&Tag::new("Attribute.Speed")), Some(600.0));

    component.rollback(snapshot).unwrap();
    assert_eq!(component.attribute(&Tag::new("Attribute.Speed")), Some(720.0));
    ticks(&mut component, 20);
    assert_eq!(component.state_digest().unwrap(), after_end);

    // Ticking past the end again reverts nothing twice.
    ticks(&mut component, 10);
    assert_eq!(component.attribute(&Tag::new("Attribute.Speed")), Some(600.0));
}

#[test]
fn rollback_to_unknown_step_fails() {
    let repository = InMemorySnapshotRepo::new(4);
    let mut component = component();
    simulate(&mut component, 5);
    component.save_to(&repository).unwrap();

    let err = component.rollback_to(&repository, 3).unwrap_err();
    assert!(matches!(err, RuntimeError::MissingSnapshot { step: 3 }));
}

#[test]
fn rollback_discards_snapshots_of_abandoned_timeline() {
    let repository = InMemorySnapshotRepo::new(16);
    let mut component = component();
    for step in [2, 4, 6, 8] {
        simulate(&mut component, step);
        component.save_to(&repository).unwrap();
    }

    component.rollback_to(&repository, 5).unwrap();

    assert_eq!(component.step(), 4);
    assert_eq!(repository.list_steps().unwrap(), vec![2, 4]);
}

#[test]
fn in_memory_repository_keeps_most_recent_snapshots() {
    let repository = InMemorySnapshotRepo::new(3);
    let mut component = component();
    for step in 1..=5 {
        simulate(&mut component, step);
        component.save_to(&repository).unwrap();
    }

    assert_eq!(repository.list_steps().unwrap(), vec![3, 4, 5]);
    assert!(!repository.exists(1));
    assert_eq!(repository.load(4).unwrap().unwrap().step, 4);
}

#[test]
fn file_repository_round_trips_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let repository = FileSnapshotRepository::new(dir.path().join("snapshots")).unwrap();
    let mut component = component();

    simulate(&mut component, 10);
    component.save_to(&repository).unwrap();
    let saved = component.save();
    simulate(&mut component, 12);
    component.save_to(&repository).unwrap();

    assert_eq!(repository.list_steps().unwrap(), vec![10, 12]);
    assert_eq!(repository.load(10).unwrap(), Some(saved.clone()));
    assert_eq!(repository.latest_at_or_before(11).unwrap(), Some(saved));
    assert!(repository.load(11).unwrap().is_none());

    repository.delete(12).unwrap();
    assert!(!repository.exists(12));
}

#[test]
fn file_repository_reports_corrupted_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let repository = FileSnapshotRepository::new(dir.path()).unwrap();
    std::fs::write(dir.path().join("snapshot_3.bin"), [0u8; 4]).unwrap();

    assert_eq!(repository.list_steps().unwrap(), vec![3]);
    assert!(matches!(
        repository.load(3),
        Err(RepositoryError::Serialization(_))
    ));
}

#[test]
fn predictions_become_overdue_until_confirmed() {
    let mut component = component();
    let definition = haste().with_client_grace_time(0.25);
    let id = component
        .apply_effect(definition, EffectApplication::predicted())
        .unwrap();

    simulate(&mut component, 2);
    assert!(component.overdue_predictions().is_empty());

    simulate(&mut component, 3);
    assert_eq!(component.overdue_predictions(), vec![id]);

    // Authority says the effect started at 0 and only lasts half a second.
    component.confirm_effect(id, 0.0, 0.5).unwrap();
    assert!(component.overdue_predictions().is_empty());
    assert!(component.effect(id).unwrap().is_confirmed());

    simulate(&mut component, 4);
    assert!(component.effect(id).is_none());
    assert_eq!(component.attribute(&Tag::new("Attribute.Speed")), Some(600.0));
}

#[test]
fn unset_confirmation_keeps_predicted_timing() {
    let mut component = component();
    let id = component
        .apply_effect(haste().with_duration(10.0), EffectApplication::predicted())
        .unwrap();
    component.tick(0.5);

    component.confirm_effect(id, 0.0, 0.0).unwrap();
    component.tick(0.5);

    let instance = component.effect(id).unwrap();
    assert_eq!(instance.state(), EffectState::Started);
    assert_eq!(instance.end_time(), 10.0);
    assert!(component.overdue_predictions().is_empty());
}

#[test]
fn confirmed_application_uses_authority_timing() {
    let mut component = component();
    simulate(&mut component, 8);

    let id = component
        .apply_effect(haste(), EffectApplication::confirmed(0.5, 1.25))
        .unwrap();
    let instance = component.effect(id).unwrap();
    assert_eq!(instance.state(), EffectState::Started);
    assert_eq!(instance.end_time(), 1.25);
    assert!(component.overdue_predictions().is_empty());

    simulate(&mut component, 10);
    assert!(component.effect(id).is_none());
}

#[test]
fn confirming_unknown_effect_fails() {
    let mut component = component();
    assert!(matches!(
        component.confirm_effect(EffectId(5), 0.0, 1.0),
        Err(RuntimeError::UnknownEffect { .. })
    ));
}

#[derive(Debug, Default)]
struct CountTicks(AtomicUsize);

impl EffectHooks for CountTicks {
    fn on_tick(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner, _dt: f64) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn rollback_rebinds_registered_hooks() {
    let hooks = Arc::new(CountTicks::default());
    let mut component = component();
    component.register_hooks("Effect.Haste", hooks.clone());

    component
        .apply_effect(haste(), EffectApplication::predicted())
        .unwrap();
    let snapshot = component.save();
    simulate(&mut component, 2);
    assert_eq!(hooks.0.load(Ordering::SeqCst), 2);

    component.rollback(snapshot).unwrap();
    simulate(&mut component, 2);
    assert_eq!(hooks.0.load(Ordering::SeqCst), 4);
}
