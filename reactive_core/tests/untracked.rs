use reactive_core::*;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[test]
fn untrack_mutes_reads() {
    let state = reactive(&object! { "n": -1 });

    // simulate an arbitrary side effect
    let b = Rc::new(RefCell::new(String::new()));

    create_effect({
        let state = state.clone();
        let b = b.clone();
        move || {
            let n = untrack(|| {
                state.get("n").and_then(|n| n.as_int()).unwrap_or(0)
            });
            *b.borrow_mut() = format!("Value is {n}");
        }
    });
    assert_eq!(b.borrow().as_str(), "Value is -1");

    state.set("n", 1).unwrap();
    assert_eq!(b.borrow().as_str(), "Value is -1");
}

#[test]
fn untracked_and_tracked_reads_mix_in_one_effect() {
    let state = reactive(&object! { "watched": 1, "peeked": 1 });

    let runs = Rc::new(Cell::new(0));
    create_effect({
        let state = state.clone();
        let runs = runs.clone();
        move || {
            let _ = state.get("watched");
            untrack(|| {
                let _ = state.get("peeked");
            });
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    state.set("peeked", 2).unwrap();
    assert_eq!(runs.get(), 1);

    state.set("watched", 2).unwrap();
    assert_eq!(runs.get(), 2);
}

#[test]
fn is_tracking_reflects_the_running_context() {
    assert!(!is_tracking());

    let observed = Rc::new(RefCell::new(Vec::new()));
    create_effect({
        let observed = observed.clone();
        move || {
            observed.borrow_mut().push(is_tracking());
            untrack(|| observed.borrow_mut().push(is_tracking()));
            observed.borrow_mut().push(is_tracking());
        }
    });

    assert_eq!(*observed.borrow(), [true, false, true]);
    assert!(!is_tracking());
}

#[test]
fn track_and_trigger_are_no_ops_without_subscribers() {
    let raw = object! { "n": 1 };

    // nothing is running: track subscribes nothing, trigger notifies nobody
    track(&raw, TrackOp::Get, &"n".into());
    trigger(&raw, TriggerOp::Set, &"n".into());
    assert_eq!(raw.get("n"), Some(Value::Int(1)));
}

#[test]
fn manual_track_connects_external_writes() {
    let raw = object! { "version": 1 };
    let key = Key::from("version");

    let runs = Rc::new(Cell::new(0));
    create_effect({
        let raw = raw.clone();
        let key = key.clone();
        let runs = runs.clone();
        move || {
            track(&raw, TrackOp::Get, &key);
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    // the raw write itself notifies nobody; the paired trigger does
    raw.insert("version", 2);
    assert_eq!(runs.get(), 1);

    trigger(&raw, TriggerOp::Set, &key);
    assert_eq!(runs.get(), 2);
}
