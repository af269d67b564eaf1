//! Pure operators over observables.
//!
//! Each combinator returns a new derived [`Observable`] wired to its sources:
//!
//! - [`map`] - always holds `f(source)`, re-evaluated on every emission
//! - [`filter`] - re-emits only when the predicate holds, otherwise keeps
//!   its previous value
//! - [`start_with`] - seeds a derived cell with a safe default, forwarding
//!   only subsequent emissions
//! - [`combine_latest2`]/[`combine_latest3`]/[`combine_latest4`] - tuple of
//!   latest values, re-emitting whenever any input emits
//! - [`combine_map2`]/[`combine_map3`]/[`combine_map4`] - map over a combined
//!   tuple
//! - [`with_deep_equals`] - suppresses re-emission when the new value is
//!   structurally equal to the last one
//!
//! Derived cells are eagerly evaluated: their initial value is computed from
//! the sources' current values at construction time, so a graph assembled
//! over already-populated inputs is immediately consistent.
//!
//! Because every cell carries a value from birth, combined tuples are always
//! well-typed; "not yet valid" states travel as `Option::None` or empty
//! collections and are filtered out by the emptiness guards in
//! [`guards`](super::guards) before any consumer acts on them.

use super::cell::Observable;

/// Derived observable whose value is always `f(source)`.
pub fn map<T, U, F>(f: F, source: &Observable<T>) -> Observable<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&T) -> U + 'static,
{
    let out = Observable::new(f(&source.read()));
    let weak = out.downgrade();
    let sub = source.subscribe(move |value| {
        if let Some(out) = weak.upgrade() {
            out.update(f(value));
        }
    });
    out.retain(sub);
    out
}

/// Derived observable that re-emits only when `pred` holds.
///
/// The initial value is taken from the source as-is, whether or not it
/// satisfies the predicate; compose with [`start_with`] below the filter when
/// the natural initial value is not a safe one. Rejected updates leave the
/// previous value in place and notify nobody.
pub fn filter<T, P>(pred: P, source: &Observable<T>) -> Observable<T>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    let out = Observable::new(source.read());
    let weak = out.downgrade();
    let sub = source.subscribe(move |value| {
        if pred(value) {
            if let Some(out) = weak.upgrade() {
                out.update(value.clone());
            }
        }
    });
    out.retain(sub);
    out
}

/// Derived observable seeded with `initial`, forwarding every subsequent
/// source emission. The source's current value at construction time is
/// deliberately ignored.
pub fn start_with<T>(initial: T, source: &Observable<T>) -> Observable<T>
where
    T: Clone + 'static,
{
    let out = Observable::new(initial);
    let weak = out.downgrade();
    let sub = source.subscribe(move |value| {
        if let Some(out) = weak.upgrade() {
            out.update(value.clone());
        }
    });
    out.retain(sub);
    out
}

/// Deep-equality dedup: re-emits only when the new value differs structurally
/// from the previously emitted one.
///
/// This is the guard that prevents unnecessary downstream rebuilds (and
/// renderer teardown/recreate cycles) when upstream churn produces an
/// unchanged derived value.
pub fn with_deep_equals<T>(source: &Observable<T>) -> Observable<T>
where
    T: Clone + PartialEq + 'static,
{
    let out = Observable::new(source.read());
    let weak = out.downgrade();
    let sub = source.subscribe(move |value| {
        if let Some(out) = weak.upgrade() {
            if *value != out.read() {
                out.update(value.clone());
            }
        }
    });
    out.retain(sub);
    out
}

/// Tuple of the latest values of two observables, re-emitted whenever either
/// input emits.
pub fn combine_latest2<A, B>(a: &Observable<A>, b: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let out = Observable::new((a.read(), b.read()));

    {
        let weak_out = out.downgrade();
        let weak_b = b.downgrade();
        let sub = a.subscribe(move |value| {
            let (Some(out), Some(b)) = (weak_out.upgrade(), weak_b.upgrade()) else {
                return;
            };
            out.update((value.clone(), b.read()));
        });
        out.retain(sub);
    }
    {
        let weak_out = out.downgrade();
        let weak_a = a.downgrade();
        let sub = b.subscribe(move |value| {
            let (Some(out), Some(a)) = (weak_out.upgrade(), weak_a.upgrade()) else {
                return;
            };
            out.update((a.read(), value.clone()));
        });
        out.retain(sub);
    }

    out
}

/// Three-way [`combine_latest2`].
pub fn combine_latest3<A, B, C>(
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
) -> Observable<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    let pair = combine_latest2(a, b);
    map(|((a, b), c)| (a.clone(), b.clone(), c.clone()), &combine_latest2(&pair, c))
}

/// Four-way [`combine_latest2`].
pub fn combine_latest4<A, B, C, D>(
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
    d: &Observable<D>,
) -> Observable<(A, B, C, D)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
{
    let left = combine_latest2(a, b);
    let right = combine_latest2(c, d);
    map(
        |((a, b), (c, d))| (a.clone(), b.clone(), c.clone(), d.clone()),
        &combine_latest2(&left, &right),
    )
}

/// Map over a combined pair.
pub fn combine_map2<A, B, U, F>(f: F, a: &Observable<A>, b: &Observable<B>) -> Observable<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&(A, B)) -> U + 'static,
{
    map(f, &combine_latest2(a, b))
}

/// Map over a combined triple.
pub fn combine_map3<A, B, C, U, F>(
    f: F,
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
) -> Observable<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&(A, B, C)) -> U + 'static,
{
    map(f, &combine_latest3(a, b, c))
}

/// Map over a combined quadruple.
pub fn combine_map4<A, B, C, D, U, F>(
    f: F,
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
    d: &Observable<D>,
) -> Observable<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&(A, B, C, D)) -> U + 'static,
{
    map(f, &combine_latest4(a, b, c, d))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::cell::observable;
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_map_tracks_source() {
        let src = observable(2);
        let doubled = map(|v| v * 2, &src);
        assert_eq!(doubled.read(), 4);

        src.update(5);
        assert_eq!(doubled.read(), 10);
    }

    #[test]
    fn test_map_chains() {
        let src = observable(1);
        let plus_one = map(|v| v + 1, &src);
        let squared = map(|v| v * v, &plus_one);

        src.update(3);
        assert_eq!(squared.read(), 16);
    }

    #[test]
    fn test_filter_holds_previous_value() {
        let src = observable(2);
        let even = filter(|v| v % 2 == 0, &src);

        src.update(3);
        assert_eq!(even.read(), 2);

        src.update(4);
        assert_eq!(even.read(), 4);
    }

    #[test]
    fn test_filter_does_not_notify_on_rejection() {
        let src = observable(0);
        let even = filter(|v| v % 2 == 0, &src);
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let _sub = even.subscribe(move |_| count2.set(count2.get() + 1));

        src.update(1);
        src.update(2);
        src.update(3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_start_with_seeds_and_forwards() {
        let src = observable(Some(1));
        let seeded = start_with(None, &src);
        assert_eq!(seeded.read(), None);

        src.update(Some(2));
        assert_eq!(seeded.read(), Some(2));
    }

    #[test]
    fn test_combine_latest2_reemits_on_either_input() {
        let a = observable(1);
        let b = observable(String::from("x"));
        let combined = combine_latest2(&a, &b);
        assert_eq!(combined.read(), (1, String::from("x")));

        a.update(2);
        assert_eq!(combined.read(), (2, String::from("x")));

        b.update(String::from("y"));
        assert_eq!(combined.read(), (2, String::from("y")));
    }

    #[test]
    fn test_combine_latest3_and_4() {
        let a = observable(1);
        let b = observable(2);
        let c = observable(3);
        let d = observable(4);

        let triple = combine_latest3(&a, &b, &c);
        let quad = combine_latest4(&a, &b, &c, &d);

        c.update(30);
        assert_eq!(triple.read(), (1, 2, 30));
        assert_eq!(quad.read(), (1, 2, 30, 4));

        d.update(40);
        assert_eq!(quad.read(), (1, 2, 30, 40));
    }

    #[test]
    fn test_combine_map2() {
        let a = observable(3);
        let b = observable(4);
        let sum = combine_map2(|(a, b)| a + b, &a, &b);
        assert_eq!(sum.read(), 7);

        a.update(10);
        assert_eq!(sum.read(), 14);
    }

    #[test]
    fn test_combine_map3_and_4() {
        let a = observable(1);
        let b = observable(2);
        let c = observable(3);
        let d = observable(4);

        let sum3 = combine_map3(|(a, b, c)| a + b + c, &a, &b, &c);
        let sum4 = combine_map4(|(a, b, c, d)| a + b + c + d, &a, &b, &c, &d);
        assert_eq!(sum3.read(), 6);
        assert_eq!(sum4.read(), 10);

        b.update(20);
        assert_eq!(sum3.read(), 24);
        assert_eq!(sum4.read(), 28);
    }

    #[test]
    fn test_with_deep_equals_suppresses_equal_values() {
        let src = observable(vec![1, 2]);
        let deduped = with_deep_equals(&src);
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let _sub = deduped.subscribe(move |_| count2.set(count2.get() + 1));

        src.update(vec![1, 2]);
        assert_eq!(count.get(), 0);

        src.update(vec![1, 2, 3]);
        assert_eq!(count.get(), 1);

        src.update(vec![1, 2, 3]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_graph_stays_alive_through_tail() {
        // Only the tail is owned; intermediate cells must be kept alive by
        // the downstream-owns-upstream subscription guards.
        let src = observable(1);
        let tail = {
            let a = map(|v| v + 1, &src);
            let b = map(|v| v * 10, &a);
            b
        };

        src.update(4);
        assert_eq!(tail.read(), 50);
    }

    #[test]
    fn test_dropping_tail_releases_subscriptions() {
        let src = observable(1);
        let count = Rc::new(Cell::new(0));
        {
            let count2 = count.clone();
            // One evaluation at construction, one per update while alive.
            let tail = map(move |v: &i32| { count2.set(count2.get() + 1); *v }, &src);
            let _ = tail.read();
            src.update(2);
        }
        assert_eq!(count.get(), 2);

        // Tail dropped: the source no longer propagates to it.
        src.update(3);
        assert_eq!(count.get(), 2);
    }
}
