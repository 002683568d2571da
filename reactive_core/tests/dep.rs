use reactive_core::*;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[test]
fn dep_reruns_tracking_effects() {
    let dep = Dep::new();
    let data = Rc::new(Cell::new(1));

    let seen = Rc::new(Cell::new(0));
    create_effect({
        let dep = dep.clone();
        let data = data.clone();
        let seen = seen.clone();
        move || {
            dep.track();
            seen.set(data.get());
        }
    });
    assert_eq!(seen.get(), 1);

    // the cell is invisible to the tracking layer until the dep says so
    data.set(2);
    assert_eq!(seen.get(), 1);

    dep.trigger();
    assert_eq!(seen.get(), 2);
}

#[test]
fn dep_links_an_effect_at_most_once_per_run() {
    let dep = Dep::new();

    let runs = Rc::new(Cell::new(0));
    create_effect({
        let dep = dep.clone();
        let runs = runs.clone();
        move || {
            // tracked twice, linked once
            dep.track();
            dep.track();
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    dep.trigger();
    assert_eq!(runs.get(), 2);
}

#[test]
fn dep_ignores_stopped_effects() {
    let dep = Dep::new();

    let runs = Rc::new(Cell::new(0));
    let runner = create_effect({
        let dep = dep.clone();
        let runs = runs.clone();
        move || {
            dep.track();
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    stop(&runner);
    dep.trigger();
    assert_eq!(runs.get(), 1);
}

#[test]
fn stopping_an_effect_mid_trigger_skips_its_pending_rerun() {
    let dep = Dep::new();

    // armed later; empty while the stopper's own first runs happen
    let victim_slot: Rc<RefCell<Option<EffectRunner<()>>>> =
        Rc::new(RefCell::new(None));

    // subscribed first, so a trigger notifies it before the victim
    create_effect({
        let dep = dep.clone();
        let victim_slot = victim_slot.clone();
        move || {
            dep.track();
            if let Some(victim) = victim_slot.borrow().as_ref() {
                stop(victim);
            }
        }
    });

    let runs = Rc::new(Cell::new(0));
    let victim = create_effect({
        let dep = dep.clone();
        let runs = runs.clone();
        move || {
            dep.track();
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    // nobody armed yet: the victim still reruns
    dep.trigger();
    assert_eq!(runs.get(), 2);

    *victim_slot.borrow_mut() = Some(victim.clone());

    // the stopper deactivates the victim while both sit in the same
    // trigger snapshot; the victim's turn never comes
    dep.trigger();
    assert_eq!(runs.get(), 2);
    assert!(!victim.effect().is_active());
}

#[test]
fn stopping_an_effect_mid_trigger_skips_its_scheduler_too() {
    let shared = Dep::new();
    let own = Dep::new();

    let victim_slot: Rc<RefCell<Option<EffectRunner<()>>>> =
        Rc::new(RefCell::new(None));

    create_effect({
        let shared = shared.clone();
        let victim_slot = victim_slot.clone();
        move || {
            shared.track();
            if let Some(victim) = victim_slot.borrow().as_ref() {
                stop(victim);
            }
        }
    });

    let scheduled = Rc::new(Cell::new(0));
    let victim = create_effect_with(
        {
            let shared = shared.clone();
            let own = own.clone();
            move || {
                shared.track();
                own.track();
            }
        },
        EffectOptions::default().scheduler({
            let scheduled = scheduled.clone();
            move || scheduled.set(scheduled.get() + 1)
        }),
    );

    // unstopped, a trigger reaches the victim's scheduler
    own.trigger();
    assert_eq!(scheduled.get(), 1);

    *victim_slot.borrow_mut() = Some(victim.clone());

    // stopped mid-trigger, the victim is skipped before its scheduler
    // is consulted
    shared.trigger();
    assert_eq!(scheduled.get(), 1);
    assert!(!victim.effect().is_active());
}

#[test]
fn trigger_during_a_run_skips_the_running_effect() {
    let dep = Dep::new();

    let runs = Rc::new(Cell::new(0));
    create_effect({
        let dep = dep.clone();
        let runs = runs.clone();
        move || {
            dep.track();
            runs.set(runs.get() + 1);
            dep.trigger();
        }
    });

    assert_eq!(runs.get(), 1);
}

#[test]
fn tracking_outside_any_effect_is_inert() {
    let dep = Dep::new();

    dep.track();
    dep.trigger();
}
