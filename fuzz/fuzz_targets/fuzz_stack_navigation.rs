#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use waypoint_core::{ComponentContext, LifecycleRegistry, LifecycleState};
use waypoint_runtime::reactive::Value;
use waypoint_runtime::router::{StackConfig, StackNavigation, StackNavigator, child_stack};

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Push(u8),
    PushNew(u8),
    PushToFront(u8),
    BringToFront(u8),
    Pop,
    PopTo(u8),
    ReplaceCurrent(u8),
    ReplaceAll(Vec<u8>),
    Hint(Vec<u8>),
    Back,
    Parent(u8),
    Save,
}

fn parent_target(raw: u8) -> LifecycleState {
    match raw % 4 {
        0 => LifecycleState::Created,
        1 => LifecycleState::Started,
        _ => LifecycleState::Resumed,
    }
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let lifecycle = LifecycleRegistry::new();
    let root = ComponentContext::root(lifecycle.clone());
    lifecycle.resume();
    let navigation = StackNavigation::new();
    let Ok(stack) = child_stack(
        &root,
        &navigation,
        StackConfig::single(0u8).handle_back_button(true),
        |c: &u8, context: ComponentContext| (*c, context),
    ) else {
        return;
    };

    for op in ops.into_iter().take(256) {
        let _ = match op {
            FuzzOp::Push(c) => navigation.push(c % 16),
            FuzzOp::PushNew(c) => navigation.push_new(c % 16),
            FuzzOp::PushToFront(c) => navigation.push_to_front(c % 16),
            FuzzOp::BringToFront(c) => navigation.bring_to_front(c % 16, move |x| x % 4 == c % 4),
            FuzzOp::Pop => navigation.pop(),
            FuzzOp::PopTo(i) => navigation.pop_to(usize::from(i % 16)),
            FuzzOp::ReplaceCurrent(c) => navigation.replace_current(c % 16),
            FuzzOp::ReplaceAll(list) => navigation.replace_all(list.into_iter().take(16).collect()),
            FuzzOp::Hint(hint) => stack.on_visibility_hint(hint),
            FuzzOp::Back => {
                root.back_dispatcher().back();
                Ok(())
            }
            FuzzOp::Parent(raw) => {
                lifecycle.move_to(parent_target(raw));
                Ok(())
            }
            FuzzOp::Save => {
                let _ = root.state_keeper().save();
                Ok(())
            }
        };

        let value = stack.value();
        let parent = lifecycle.state();
        let configurations = stack.configurations();
        assert!(!configurations.is_empty());
        assert!(
            configurations
                .iter()
                .enumerate()
                .all(|(i, c)| !configurations[..i].contains(c))
        );
        let resumed = value
            .items()
            .filter(|c| c.instance.1.lifecycle().state() == LifecycleState::Resumed)
            .count();
        assert!(resumed <= 1);
        for child in value.items() {
            assert!(child.instance.1.lifecycle().state() <= parent);
        }
    }

    lifecycle.destroy();
    assert!(stack.is_destroyed());
    for child in stack.value().items() {
        assert_eq!(child.instance.1.lifecycle().state(), LifecycleState::Destroyed);
    }
});
