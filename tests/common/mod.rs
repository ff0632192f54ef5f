use std::sync::Once;

static INIT: Once = Once::new();

/// Set up log configuration once for the whole test binary.
pub fn setup() {
    INIT.call_once(small_queue::init_log);
}
