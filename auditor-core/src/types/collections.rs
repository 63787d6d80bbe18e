//! Hash collection aliases used on hot paths.

/// FxHasher-backed HashMap.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// FxHasher-backed HashSet.
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;
