#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_core::{ComponentContext, LifecycleRegistry, SavedState};
use waypoint_runtime::reactive::Value;
use waypoint_runtime::router::{StackConfig, StackNavigation, StateCodec, child_stack};

// Arbitrary persisted blobs must either fail to parse or restore into a
// valid stack; never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let saved = SavedState::from_json_str(text)
        .or_else(|_| SavedState::from_base64(text.trim()))
        .unwrap_or_default();

    let lifecycle = LifecycleRegistry::new();
    let root = ComponentContext::restored(lifecycle.clone(), saved);
    lifecycle.resume();
    let navigation = StackNavigation::new();
    let stack = child_stack(
        &root,
        &navigation,
        StackConfig::single(0u32).codec(StateCodec::serde()),
        |c: &u32, _: ComponentContext| *c,
    )
    .expect("restore never fails for a fresh key");

    let configurations = stack.configurations();
    assert!(!configurations.is_empty());
    assert_eq!(stack.value().active.configuration, *configurations.last().unwrap());
    lifecycle.destroy();
});
