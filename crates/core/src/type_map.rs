//! Heterogeneous storage keyed by concrete type.
//!
//! A [`TypeMap`] holds at most one value per Rust type. Values share no common
//! trait beyond [`Any`]; the key is the [`TypeId`] of the stored type, so a
//! lookup can never hand back a value of the wrong type.
//!
//! ## Interface-typed values
//!
//! Trait objects (`dyn Trait`) are unsized and cannot be stored behind
//! `Box<dyn Any>` directly. The `*_dyn` methods move the fat `Arc<D>` (data
//! pointer + vtable) into its own heap allocation, which makes every stored
//! entry a thin `Box<dyn Any>` regardless of which trait `D` is. The key is
//! `TypeId::of::<D>()`, so `dyn Fn(u8)` and `dyn Fn(u16)` never collide.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Erased = Box<dyn Any + Send + Sync>;

/// At-most-one-value-per-type container.
///
/// Last write wins; nothing is ever evicted.
#[derive(Default)]
pub struct TypeMap {
    entries: HashMap<TypeId, Erased>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) the value stored for `T`, returning the previous one.
    pub fn insert<T>(&mut self, value: T) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T>(&mut self) -> Option<&mut T>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Return the value for `T`, creating it with `init` if absent.
    ///
    /// Callers that share a map behind a lock use this under the write guard:
    /// the existence check and the insert happen under the same borrow.
    pub fn get_or_insert_with<T, F>(&mut self, init: F) -> &mut T
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
            .expect("TypeMap entry keyed by TypeId::of::<T>() always holds a T")
    }

    /// Insert (or overwrite) an interface-typed value, keyed by the trait object type `D`.
    ///
    /// Returns `true` if a previous value for `D` was replaced.
    pub fn insert_dyn<D>(&mut self, value: Arc<D>) -> bool
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .insert(TypeId::of::<D>(), Box::new(value))
            .is_some()
    }

    /// Shared handle to the interface-typed value stored for `D`.
    pub fn get_dyn<D>(&self) -> Option<Arc<D>>
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<D>())
            .and_then(|v| v.downcast_ref::<Arc<D>>())
            .map(Arc::clone)
    }

    pub fn contains_dyn<D>(&self) -> bool
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.entries.contains_key(&TypeId::of::<D>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for TypeMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    struct Loud(&'static str);

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    impl Greeter for Loud {
        fn greet(&self) -> String {
            self.0.to_uppercase()
        }
    }

    #[test]
    fn get_returns_none_for_missing_type() {
        let map = TypeMap::new();
        assert!(map.get::<u32>().is_none());
        assert!(!map.contains::<u32>());
        assert!(map.is_empty());
    }

    #[test]
    fn values_are_keyed_by_type() {
        let mut map = TypeMap::new();
        map.insert(7u32);
        map.insert(String::from("seven"));
        map.insert(7u64);

        assert_eq!(map.get::<u32>(), Some(&7));
        assert_eq!(map.get::<u64>(), Some(&7));
        assert_eq!(map.get::<String>().map(String::as_str), Some("seven"));
        assert!(map.get::<i32>().is_none());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn insert_overwrites_and_returns_previous() {
        let mut map = TypeMap::new();
        assert_eq!(map.insert(1u8), None);
        assert_eq!(map.insert(2u8), Some(1));
        assert_eq!(map.get::<u8>(), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn get_mut_mutates_in_place() {
        let mut map = TypeMap::new();
        map.insert(vec![1, 2]);
        map.get_mut::<Vec<i32>>().unwrap().push(3);
        assert_eq!(map.get::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn get_or_insert_with_only_initialises_once() {
        let mut map = TypeMap::new();
        let mut calls = 0;
        *map.get_or_insert_with(|| {
            calls += 1;
            10u32
        }) += 1;
        let v = *map.get_or_insert_with(|| {
            calls += 1;
            0u32
        });
        assert_eq!(v, 11);
        assert_eq!(calls, 1);
    }

    #[test]
    fn dyn_values_recover_through_trait_object_key() {
        let mut map = TypeMap::new();
        assert!(!map.insert_dyn::<dyn Greeter>(Arc::new(English)));
        assert_eq!(map.get_dyn::<dyn Greeter>().unwrap().greet(), "hello");

        assert!(map.insert_dyn::<dyn Greeter>(Arc::new(Loud("hey"))));
        assert_eq!(map.get_dyn::<dyn Greeter>().unwrap().greet(), "HEY");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn dyn_closures_with_different_signatures_do_not_collide() {
        type ByteFn = dyn Fn(u8) -> u32 + Send + Sync;
        type WordFn = dyn Fn(u16) -> u32 + Send + Sync;

        let mut map = TypeMap::new();
        map.insert_dyn::<ByteFn>(Arc::new(|b: u8| b as u32 + 1));
        map.insert_dyn::<WordFn>(Arc::new(|w: u16| w as u32 * 2));

        assert_eq!((map.get_dyn::<ByteFn>().unwrap())(1), 2);
        assert_eq!((map.get_dyn::<WordFn>().unwrap())(300), 600);
        assert!(map.contains_dyn::<ByteFn>());
        assert!(!map.contains::<u8>());
    }

    #[test]
    fn sized_and_dyn_keys_share_one_map_without_clashing() {
        let mut map = TypeMap::new();
        map.insert(1u32);
        map.insert_dyn::<dyn Greeter>(Arc::new(English));
        assert_eq!(map.get::<u32>(), Some(&1));
        assert!(map.get_dyn::<dyn Greeter>().is_some());
        assert!(map.get::<Arc<dyn Greeter>>().is_none());
    }

    #[test]
    fn get_dyn_hands_out_shared_handles() {
        let mut map = TypeMap::new();
        map.insert_dyn::<dyn Greeter>(Arc::new(English));
        let first = map.get_dyn::<dyn Greeter>().unwrap();
        map.insert_dyn::<dyn Greeter>(Arc::new(Loud("later")));

        // A handle taken before the overwrite keeps the old value alive.
        assert_eq!(first.greet(), "hello");
        assert_eq!(map.get_dyn::<dyn Greeter>().unwrap().greet(), "LATER");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after any write sequence, each type reads back its last write.
        #[test]
        fn last_write_wins_per_type(
            writes in prop::collection::vec((any::<bool>(), any::<u32>()), 1..50)
        ) {
            let mut map = TypeMap::new();
            let mut last_u32 = None;
            let mut last_i64 = None;

            for (as_u32, v) in writes {
                if as_u32 {
                    map.insert(v);
                    last_u32 = Some(v);
                } else {
                    map.insert(v as i64);
                    last_i64 = Some(v as i64);
                }
            }

            prop_assert_eq!(map.get::<u32>().copied(), last_u32);
            prop_assert_eq!(map.get::<i64>().copied(), last_i64);
            prop_assert_eq!(map.len(), last_u32.is_some() as usize + last_i64.is_some() as usize);
        }
    }
}
