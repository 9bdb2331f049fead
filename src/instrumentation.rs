// Lightweight instrumentation for counting tiling hotspots in development.
// Counters are thread-local so the hot path never synchronizes; under a
// parallel run each worker counts on its own, so snapshot from the thread
// that did the work (the dev binaries run sequentially).
use std::cell::Cell;

thread_local! {
    static WINDOWS_INDEXED: Cell<u64> = const { Cell::new(0) };
    static INDEX_BUILD_NS: Cell<u64> = const { Cell::new(0) };
    static LOOKUP_COUNT: Cell<u64> = const { Cell::new(0) };
    static CANDIDATES_EXAMINED: Cell<u64> = const { Cell::new(0) };
    static TOKENS_COMPARED: Cell<u64> = const { Cell::new(0) };
    static EXTENSION_NS: Cell<u64> = const { Cell::new(0) };
}

/// Point-in-time copy of the counters of the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub windows_indexed: u64,
    pub index_build_ns: u64,
    pub lookups: u64,
    pub candidates: u64,
    pub tokens_compared: u64,
    pub extension_ns: u64,
}

pub fn reset_counters() {
    WINDOWS_INDEXED.with(|c| c.set(0));
    INDEX_BUILD_NS.with(|c| c.set(0));
    LOOKUP_COUNT.with(|c| c.set(0));
    CANDIDATES_EXAMINED.with(|c| c.set(0));
    TOKENS_COMPARED.with(|c| c.set(0));
    EXTENSION_NS.with(|c| c.set(0));
}

pub fn counters_snapshot() -> Counters {
    Counters {
        windows_indexed: WINDOWS_INDEXED.with(|c| c.get()),
        index_build_ns: INDEX_BUILD_NS.with(|c| c.get()),
        lookups: LOOKUP_COUNT.with(|c| c.get()),
        candidates: CANDIDATES_EXAMINED.with(|c| c.get()),
        tokens_compared: TOKENS_COMPARED.with(|c| c.get()),
        extension_ns: EXTENSION_NS.with(|c| c.get()),
    }
}

pub fn add_windows_indexed(n: u64) {
    WINDOWS_INDEXED.with(|c| c.set(c.get().wrapping_add(n)));
}
pub fn add_index_build_ns(n: u64) {
    INDEX_BUILD_NS.with(|c| c.set(c.get().wrapping_add(n)));
}
pub fn add_lookup(n: u64) {
    LOOKUP_COUNT.with(|c| c.set(c.get().wrapping_add(n)));
}
pub fn add_candidates(n: u64) {
    CANDIDATES_EXAMINED.with(|c| c.set(c.get().wrapping_add(n)));
}
pub fn add_tokens_compared(n: u64) {
    TOKENS_COMPARED.with(|c| c.set(c.get().wrapping_add(n)));
}
pub fn add_extension_ns(n: u64) {
    EXTENSION_NS.with(|c| c.set(c.get().wrapping_add(n)));
}
