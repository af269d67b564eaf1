//! Emptiness guards for combined tuples.
//!
//! A combined tuple is only safe to consume once every required input carries
//! a real value. [`MaybeEmpty`] classifies a single value as "still empty";
//! [`SomeEmpty`] lifts that over tuples so a `filter(not_some_empty, ..)`
//! stage can sit between every `combine_latest` and its consumer.
//!
//! Domain types with non-obvious emptiness (renderer handles, row sets)
//! implement [`MaybeEmpty`] next to their definitions.

/// Classification of a single value as not-yet-populated.
pub trait MaybeEmpty {
    fn is_empty_value(&self) -> bool;
}

impl<T> MaybeEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl MaybeEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

/// True when any element of a tuple is still empty.
pub trait SomeEmpty {
    fn some_empty(&self) -> bool;
}

macro_rules! impl_some_empty {
    ($($name:ident),+) => {
        impl<$($name: MaybeEmpty),+> SomeEmpty for ($($name,)+) {
            fn some_empty(&self) -> bool {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                false $(|| $name.is_empty_value())+
            }
        }
    };
}

impl_some_empty!(A);
impl_some_empty!(A, B);
impl_some_empty!(A, B, C);
impl_some_empty!(A, B, C, D);

/// Predicate form for `filter`: the tuple has no empty element.
pub fn not_some_empty<T: SomeEmpty>(value: &T) -> bool {
    !value.some_empty()
}

// =============================================================================
// Tests
// =============================================================================
