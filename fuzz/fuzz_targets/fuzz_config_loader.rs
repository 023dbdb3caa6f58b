#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = turntable_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A config that passes validation must also pass the builder's checks.
    let built = turntable_core::TurntableBuilder::from_config(&cfg).build();
    assert!(built.is_ok(), "validated config rejected by builder: {built:?}");
});
