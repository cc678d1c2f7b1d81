//! End-to-end slot router scenarios: activate, replace, dismiss, back.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use waypoint_core::{
    ComponentContext, LifecycleCallbacks, LifecycleEvent, LifecycleRegistry, LifecycleState,
    Subscription,
};
use waypoint_runtime::reactive::Value;
use waypoint_runtime::router::{
    ChildSlotValue, SlotConfig, SlotNavigation, SlotNavigator, child_slot,
};

type Log = Rc<RefCell<Vec<(&'static str, LifecycleEvent)>>>;

struct Dialog {
    context: ComponentContext,
    _lifecycle: Subscription,
}

fn resumed_root() -> (LifecycleRegistry, ComponentContext) {
    let lifecycle = LifecycleRegistry::new();
    let root = ComponentContext::root(lifecycle.clone());
    lifecycle.resume();
    (lifecycle, root)
}

fn build(
    root: &ComponentContext,
    navigation: &SlotNavigation<&'static str>,
    config: SlotConfig<&'static str>,
    log: &Log,
) -> ChildSlotValue<&'static str, Dialog> {
    let log = Rc::clone(log);
    child_slot(root, navigation, config, move |name: &&'static str, context| {
        let log = Rc::clone(&log);
        let name = *name;
        let subscription = context
            .lifecycle()
            .subscribe(LifecycleCallbacks::on_any(move |e| log.borrow_mut().push((name, e))));
        Dialog {
            context,
            _lifecycle: subscription,
        }
    })
    .unwrap()
}

fn shown(slot: &ChildSlotValue<&'static str, Dialog>) -> Option<&'static str> {
    slot.value().child.map(|c| c.configuration)
}

#[test]
fn starts_empty_and_activates() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::default(), &log);
    assert_eq!(shown(&slot), None);

    let done = Rc::new(Cell::new(false));
    let d = Rc::clone(&done);
    navigation.activate_with("confirm", move || d.set(true)).unwrap();
    assert!(done.get());
    let child = slot.value().child.unwrap();
    assert_eq!(child.configuration, "confirm");
    assert_eq!(child.instance.context.lifecycle().state(), LifecycleState::Resumed);
}

#[test]
fn activating_same_configuration_keeps_instance() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::new(|| Some("confirm")), &log);
    let before = slot.value().child.unwrap().instance;

    navigation.activate("confirm").unwrap();
    let after = slot.value().child.unwrap().instance;
    assert!(Rc::ptr_eq(&before, &after));
    assert_eq!(log.borrow().iter().filter(|(_, e)| *e == LifecycleEvent::Create).count(), 1);
}

#[test]
fn replacing_destroys_previous_before_resuming_next() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::new(|| Some("first")), &log);
    log.borrow_mut().clear();

    navigation.activate("second").unwrap();
    assert_eq!(shown(&slot), Some("second"));

    let log = log.borrow();
    let destroyed = log.iter().position(|e| *e == ("first", LifecycleEvent::Destroy)).unwrap();
    let resumed = log.iter().position(|e| *e == ("second", LifecycleEvent::Resume)).unwrap();
    assert!(destroyed < resumed, "{log:?}");
}

#[test]
fn dismiss_reports_whether_anything_was_shown() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::new(|| Some("sheet")), &log);

    let results = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&results);
    navigation.dismiss_with(move |was_shown| r.borrow_mut().push(was_shown)).unwrap();
    let r = Rc::clone(&results);
    navigation.dismiss_with(move |was_shown| r.borrow_mut().push(was_shown)).unwrap();

    assert_eq!(*results.borrow(), vec![true, false]);
    assert_eq!(shown(&slot), None);
    assert_eq!(
        log.borrow().iter().filter(|(_, e)| *e == LifecycleEvent::Destroy).count(),
        1
    );
}

#[test]
fn back_dismisses_when_enabled() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(
        &root,
        &navigation,
        SlotConfig::new(|| Some("sheet")).handle_back_button(true),
        &log,
    );

    assert!(root.back_dispatcher().back());
    assert_eq!(shown(&slot), None);
    assert!(!root.back_dispatcher().is_enabled());
    assert!(!root.back_dispatcher().back());
}

#[test]
fn back_ignored_when_disabled() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::new(|| Some("sheet")), &log);

    assert!(!root.back_dispatcher().back());
    assert_eq!(shown(&slot), Some("sheet"));
}

#[test]
fn child_follows_parent_lifecycle() {
    let (lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::new(|| Some("sheet")), &log);
    let child = slot.value().child.unwrap().instance;

    lifecycle.stop();
    assert_eq!(child.context.lifecycle().state(), LifecycleState::Created);
    lifecycle.resume();
    assert_eq!(child.context.lifecycle().state(), LifecycleState::Resumed);
    lifecycle.destroy();
    assert_eq!(child.context.lifecycle().state(), LifecycleState::Destroyed);
    assert!(slot.is_destroyed());
}

#[test]
fn navigating_after_destroy_is_harmless() {
    let (_lifecycle, root) = resumed_root();
    let log = Log::default();
    let navigation = SlotNavigation::new();
    let slot = build(&root, &navigation, SlotConfig::default(), &log);
    slot.destroy();

    navigation.activate("late").unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn factory_navigation_during_construction_is_applied() {
    let (_lifecycle, root) = resumed_root();
    let navigation = SlotNavigation::new();
    let echo = navigation.clone();
    let slot = child_slot(
        &root,
        &navigation,
        SlotConfig::new(|| Some("splash")),
        move |name: &&'static str, _: ComponentContext| {
            if *name == "splash" {
                echo.activate("home").unwrap();
            }
            *name
        },
    )
    .unwrap();

    assert_eq!(slot.value().child.map(|c| c.configuration), Some("home"));
    assert_eq!(navigation.observer_count(), 1);
}
