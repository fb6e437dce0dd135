//! Derivations over live sources.
//!
//! Every derived view is a [`SharedView`]: lazy, shared between consumers and
//! released after the grace period. Mappers and predicates are fallible; an
//! `Err` terminates the derived view only, never its upstream.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use crate::{Delivery, LiveSource, SharedSource, SharedView, Snapshot, ViewError, ViewSink};

/// Recompute `f` on every upstream delivery.
pub fn derive_map<A, T, F>(
    name: &str,
    grace: Duration,
    source: SharedSource<A>,
    f: F,
) -> SharedView<T>
where
    A: 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&A) -> Result<T, ViewError> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    SharedView::new(name, grace, move |sink: ViewSink<T>| {
        let f = f.clone();
        source.observe(Arc::new(move |delivery: &Delivery<A>| match delivery {
            Ok(value) => match f(value) {
                Ok(out) => sink.emit(out),
                Err(e) => sink.fail(e),
            },
            Err(e) => sink.fail(e.clone()),
        }))
    })
}

/// Subset of the source snapshot matching `predicate`, in source order.
pub fn derive_filtered<R, P>(
    name: &str,
    grace: Duration,
    source: SharedSource<Snapshot<R>>,
    predicate: P,
) -> SharedView<Snapshot<R>>
where
    R: Clone + PartialEq + Send + Sync + 'static,
    P: Fn(&R) -> Result<bool, ViewError> + Send + Sync + 'static,
{
    derive_map(name, grace, source, move |snapshot: &Snapshot<R>| {
        let mut matching = Vec::new();
        for record in snapshot.iter() {
            if predicate(record)? {
                matching.push(record.clone());
            }
        }
        Ok(Arc::new(matching))
    })
}

/// Number of source elements matching `predicate`.
pub fn derive_count<R, P>(
    name: &str,
    grace: Duration,
    source: SharedSource<Snapshot<R>>,
    predicate: P,
) -> SharedView<usize>
where
    R: Send + Sync + 'static,
    P: Fn(&R) -> Result<bool, ViewError> + Send + Sync + 'static,
{
    derive_map(name, grace, source, move |snapshot: &Snapshot<R>| {
        let mut count = 0;
        for record in snapshot.iter() {
            if predicate(record)? {
                count += 1;
            }
        }
        Ok(count)
    })
}

/// Recompute `f` whenever either source delivers, once both have a value.
pub fn derive_combined<A, B, T, F>(
    name: &str,
    grace: Duration,
    a: SharedSource<A>,
    b: SharedSource<B>,
    f: F,
) -> SharedView<T>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&A, &B) -> Result<T, ViewError> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    SharedView::new(name, grace, move |sink: ViewSink<T>| {
        // Reentrant so a listener reacting to this view may poke either input.
        let latest = Arc::new(ReentrantMutex::new(RefCell::new(Latest::<A, B>::default())));

        let on_a = {
            let (latest, sink, f) = (latest.clone(), sink.clone(), f.clone());
            a.observe(Arc::new(move |delivery: &Delivery<A>| {
                let guard = latest.lock();
                match delivery {
                    Ok(value) => {
                        guard.borrow_mut().a = Some(value.clone());
                        recompute(&guard, &sink, f.as_ref());
                    }
                    Err(e) => sink.fail(e.clone()),
                }
            }))
        };
        let on_b = {
            let (latest, sink, f) = (latest.clone(), sink.clone(), f.clone());
            b.observe(Arc::new(move |delivery: &Delivery<B>| {
                let guard = latest.lock();
                match delivery {
                    Ok(value) => {
                        guard.borrow_mut().b = Some(value.clone());
                        recompute(&guard, &sink, f.as_ref());
                    }
                    Err(e) => sink.fail(e.clone()),
                }
            }))
        };
        crate::Subscription::merge([on_a, on_b])
    })
}

struct Latest<A, B> {
    a: Option<A>,
    b: Option<B>,
}

impl<A, B> Default for Latest<A, B> {
    fn default() -> Self {
        Self { a: None, b: None }
    }
}

fn recompute<A, B, T, F>(latest: &RefCell<Latest<A, B>>, sink: &ViewSink<T>, f: &F)
where
    A: Clone,
    B: Clone,
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&A, &B) -> Result<T, ViewError>,
{
    let inputs = {
        let latest = latest.borrow();
        match (&latest.a, &latest.b) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    };
    if let Some((a, b)) = inputs {
        match f(&a, &b) {
            Ok(out) => sink.emit(out),
            Err(e) => sink.fail(e),
        }
    }
}
