// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component-local state.
//!
//! A function component receives a [`RenderCx`] and calls hooks on it in a
//! fixed order. Each call claims the next cell of the fiber's hook list: on
//! the first render the cell is created, on later renders it is replayed
//! against the cell at the same position in the committed generation. The
//! order must be the same on every render; a call whose kind differs from
//! the recorded one fails the render with [`Error::HookMismatch`].
//!
//! Effects are kept twice: as a cell in the hook list (so their
//! dependencies can be compared on the next render) and in a separate
//! per-fiber effect list that the commit phase walks without touching
//! state cells.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::cell::{Ref as CellRef, RefCell, RefMut};
use core::fmt;
use core::marker::PhantomData;

use crate::context::{ContextDependency, ContextStack};
use crate::element::{Callback, Context, Value};
use crate::error::{ComponentError, Error};
use crate::fiber::FiberId;
use crate::flags::{Flags, HookFlags};
use crate::lane::Lanes;
use crate::update_queue::{AnyRc, QueueState, SharedQueue, Update};
use crate::updates::{ScheduledUpdate, UpdateContext, Updates};

/// Tears down what an effect set up.
pub type Cleanup = Box<dyn FnOnce() -> Result<(), ComponentError>>;

/// What an effect's creation thunk returns.
pub type EffectResult = Result<Option<Cleanup>, ComponentError>;

type Create = Box<dyn FnOnce() -> EffectResult>;

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// A hook dependency list.
///
/// `Deps::always()` recomputes on every render. An empty list computes
/// once. Otherwise the hook recomputes when any element differs from the
/// previous render by [`Value::is_same`], or when the length changes.
#[derive(Clone, Debug, Default)]
pub struct Deps(Option<Vec<Value>>);

impl Deps {
    /// No dependency list: recompute on every render.
    #[must_use]
    pub const fn always() -> Self {
        Self(None)
    }

    /// An empty list: compute on mount only.
    #[must_use]
    pub const fn once() -> Self {
        Self(Some(Vec::new()))
    }
}

impl From<()> for Deps {
    fn from((): ()) -> Self {
        Self::once()
    }
}

impl From<Vec<Value>> for Deps {
    fn from(v: Vec<Value>) -> Self {
        Self(Some(v))
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Deps {
    fn from(v: [V; N]) -> Self {
        Self(Some(v.into_iter().map(Into::into).collect()))
    }
}

impl From<Option<Vec<Value>>> for Deps {
    fn from(v: Option<Vec<Value>>) -> Self {
        Self(v)
    }
}

/// Returns `true` if both lists exist and match element-wise.
pub(crate) fn deps_equal(prev: Option<&[Value]>, next: Option<&[Value]>) -> bool {
    match (prev, next) {
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_same(y)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Cleanup slot shared by every generation of one effect cell.
#[derive(Default)]
pub(crate) struct EffectInstance {
    destroy: RefCell<Option<Cleanup>>,
}

impl EffectInstance {
    /// Runs and clears the stored cleanup.
    pub(crate) fn run_destroy(&self) -> Result<(), ComponentError> {
        let destroy = self.destroy.borrow_mut().take();
        match destroy {
            Some(destroy) => destroy(),
            None => Ok(()),
        }
    }

    pub(crate) fn has_destroy(&self) -> bool {
        self.destroy.borrow().is_some()
    }
}

impl fmt::Debug for EffectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectInstance")
            .field("has_destroy", &self.has_destroy())
            .finish()
    }
}

/// One effect record of a render.
pub(crate) struct Effect {
    pub(crate) tag: HookFlags,
    create: RefCell<Option<Create>>,
    pub(crate) inst: Rc<EffectInstance>,
    deps: Option<Vec<Value>>,
}

impl Effect {
    pub(crate) fn has_effect(&self) -> bool {
        self.tag.contains(HookFlags::HAS_EFFECT)
    }

    pub(crate) fn is(&self, kind: HookFlags) -> bool {
        self.tag.contains(kind)
    }

    /// Runs the creation thunk once, keeping its cleanup.
    pub(crate) fn mount(&self) -> Result<(), ComponentError> {
        let create = self.create.borrow_mut().take();
        if let Some(create) = create {
            let destroy = create()?;
            *self.inst.destroy.borrow_mut() = destroy;
        }
        Ok(())
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tag", &self.tag)
            .field("deps", &self.deps)
            .field("inst", &self.inst)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Hook cells
// ---------------------------------------------------------------------------

/// One cell of a fiber's hook list.
#[derive(Clone)]
pub(crate) enum Hook {
    /// `use_state` and `use_reducer`.
    State(QueueState),
    /// `use_memo` and `use_callback`.
    Memo {
        value: AnyRc,
        deps: Option<Vec<Value>>,
    },
    /// `use_ref`.
    Ref(AnyRc),
    /// `use_effect` and `use_layout_effect`.
    Effect(Rc<Effect>),
    /// `use_deferred_value`; `deferred` is set while a newer value waits.
    Deferred { value: AnyRc, deferred: bool },
}

impl Hook {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Memo { .. } => "memo",
            Self::Ref(_) => "ref",
            Self::Effect(e) if e.is(HookFlags::LAYOUT) => "layout effect",
            Self::Effect(_) => "effect",
            Self::Deferred { .. } => "deferred value",
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(q) => f.debug_tuple("State").field(q).finish(),
            Self::Effect(e) => f.debug_tuple("Effect").field(e).finish(),
            Self::Memo { deps, .. } => f.debug_struct("Memo").field("deps", deps).finish(),
            Self::Deferred { deferred, .. } => {
                f.debug_struct("Deferred").field("deferred", deferred).finish()
            }
            Self::Ref(_) => f.write_str("Ref"),
        }
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

enum StateAction<T> {
    Set(T),
    Update(Rc<dyn Fn(&T) -> T>),
}

/// Setter returned by [`RenderCx::use_state`].
///
/// The setter is stable for the lifetime of the component and may be called
/// at any time. Once the component is unmounted, calls do nothing.
pub struct SetState<T> {
    queue: Rc<SharedQueue>,
    fiber: FiberId,
    updates: Rc<UpdateContext>,
    _marker: PhantomData<fn(T)>,
}

impl<T: 'static> SetState<T> {
    /// Replaces the state.
    pub fn set(&self, value: T) {
        self.dispatch(StateAction::Set(value));
    }

    /// Computes the next state from the previous one.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.dispatch(StateAction::Update(Rc::new(f)));
    }

    fn dispatch(&self, action: StateAction<T>) {
        enqueue(&self.queue, self.fiber, &self.updates, Rc::new(action));
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            fiber: self.fiber,
            updates: self.updates.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState").field("fiber", &self.fiber).finish_non_exhaustive()
    }
}

/// Dispatcher returned by [`RenderCx::use_reducer`].
pub struct Dispatch<A> {
    queue: Rc<SharedQueue>,
    fiber: FiberId,
    updates: Rc<UpdateContext>,
    _marker: PhantomData<fn(A)>,
}

impl<A: 'static> Dispatch<A> {
    /// Queues `action` for the reducer.
    pub fn dispatch(&self, action: A) {
        enqueue(&self.queue, self.fiber, &self.updates, Rc::new(action));
    }
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            fiber: self.fiber,
            updates: self.updates.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").field("fiber", &self.fiber).finish_non_exhaustive()
    }
}

fn enqueue(queue: &SharedQueue, fiber: FiberId, updates: &UpdateContext, action: AnyRc) {
    let lane = updates.request_update_lane();
    queue.push(Update { lane, action });
    updates.schedule(ScheduledUpdate::Fiber(fiber, lane));
}

/// A mutable cell that survives re-renders, returned by
/// [`RenderCx::use_ref`]. Writing to it does not schedule a render.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Ref<T> {
    /// Borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> CellRef<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replaces the value, returning the old one.
    pub fn set(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Returns `true` if both handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Ref<T> {
    /// Clones the value out.
    #[must_use]
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0.borrow()).finish()
    }
}

// ---------------------------------------------------------------------------
// RenderCx
// ---------------------------------------------------------------------------

/// The context of one function-component render.
///
/// Hooks are methods on this type, so they can only be called while the
/// component renders.
pub struct RenderCx<'a> {
    fiber: FiberId,
    render_lanes: Lanes,
    prev: Option<Vec<Hook>>,
    next: Vec<Hook>,
    effects: Vec<Rc<Effect>>,
    fiber_flags: Flags,
    skipped_lanes: Lanes,
    did_receive_update: bool,
    mismatched: bool,
    contexts: &'a ContextStack,
    dependencies: Vec<ContextDependency>,
    updates: &'a Rc<UpdateContext>,
    error: Option<Error>,
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("fiber", &self.fiber)
            .field("render_lanes", &self.render_lanes)
            .field("position", &self.next.len())
            .field("mounting", &self.prev.is_none())
            .finish_non_exhaustive()
    }
}

/// Everything a render left behind.
#[derive(Debug)]
pub(crate) struct HookOutcome {
    pub(crate) hooks: Vec<Hook>,
    pub(crate) effects: Vec<Rc<Effect>>,
    pub(crate) flags: Flags,
    pub(crate) skipped_lanes: Lanes,
    pub(crate) did_receive_update: bool,
    pub(crate) dependencies: Vec<ContextDependency>,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(
        fiber: FiberId,
        render_lanes: Lanes,
        prev: Option<Vec<Hook>>,
        did_receive_update: bool,
        contexts: &'a ContextStack,
        updates: &'a Rc<UpdateContext>,
    ) -> Self {
        Self {
            fiber,
            render_lanes,
            prev,
            next: Vec::new(),
            effects: Vec::new(),
            fiber_flags: Flags::empty(),
            skipped_lanes: Lanes::NONE,
            did_receive_update,
            mismatched: false,
            contexts,
            dependencies: Vec::new(),
            updates,
            error: None,
        }
    }

    /// Ends the render. Hook-order errors take precedence over whatever
    /// the component returned.
    ///
    /// The committed generation's cells are handed back either way, with
    /// their pending updates absorbed, so a failed render loses nothing.
    pub(crate) fn finish(mut self) -> (Option<Vec<Hook>>, Result<HookOutcome, Error>) {
        if let Some(prev) = &self.prev
            && !self.mismatched
            && prev.len() != self.next.len()
        {
            let err = Error::HookCountMismatch {
                previous: prev.len(),
                current: self.next.len(),
            };
            self.fail(err);
        }
        if let Some(err) = self.error {
            return (self.prev, Err(err));
        }
        let outcome = HookOutcome {
            hooks: self.next,
            effects: self.effects,
            flags: self.fiber_flags,
            skipped_lanes: self.skipped_lanes,
            did_receive_update: self.did_receive_update,
            dependencies: self.dependencies,
        };
        (self.prev, Ok(outcome))
    }

    /// Handle of the fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Lanes of the render in progress.
    #[must_use]
    pub fn render_lanes(&self) -> Lanes {
        self.render_lanes
    }

    /// Returns `true` on the component's first render.
    #[must_use]
    pub fn is_mounting(&self) -> bool {
        self.prev.is_none()
    }

    /// A handle for starting transitions from event handlers and effects.
    #[must_use]
    pub fn updates(&self) -> Updates {
        Updates(self.updates.clone())
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// The committed cell at the current position, if it is of kind
    /// `found`. Returns `None` on mount and after a mismatch, in which case
    /// the caller creates a fresh cell.
    fn prev_hook(&mut self, found: &'static str) -> Option<&mut Hook> {
        if self.mismatched {
            return None;
        }
        let position = self.next.len();
        let (expected, previous) = {
            let prev = self.prev.as_ref()?;
            (prev.get(position).map(Hook::kind), prev.len())
        };
        match expected {
            Some(kind) if kind == found => self.prev.as_mut().and_then(|p| p.get_mut(position)),
            Some(kind) => {
                self.mismatched = true;
                self.fail(Error::HookMismatch {
                    position,
                    expected: kind,
                    found,
                });
                None
            }
            None => {
                self.mismatched = true;
                self.fail(Error::HookCountMismatch {
                    previous,
                    current: position + 1,
                });
                None
            }
        }
    }

    fn type_mismatch<T>(&mut self, expected: &'static str) {
        self.mismatched = true;
        let position = self.next.len();
        self.fail(Error::HookMismatch {
            position,
            expected,
            found: type_name::<T>(),
        });
    }

    fn reducer_cell<S, F>(&mut self, init: impl FnOnce() -> S, reduce: F) -> (S, Rc<SharedQueue>)
    where
        S: Clone + PartialEq + 'static,
        F: Fn(&S, &AnyRc) -> Option<S>,
    {
        let render_lanes = self.render_lanes;
        let processed = self.prev_hook("state").map(|hook| {
            let Hook::State(queue) = hook else {
                return Err(());
            };
            queue.absorb_pending();
            let prev_value = queue.memoized.downcast_ref::<S>().cloned();
            queue
                .process(render_lanes, |state, action| {
                    let state = state.downcast_ref::<S>().ok_or(())?;
                    reduce(state, action).map(|s| Rc::new(s) as AnyRc).ok_or(())
                })
                .map(|p| (p, prev_value))
        });

        match processed {
            Some(Ok((processed, prev_value))) => {
                if let Some(value) = processed.next.memoized.downcast_ref::<S>().cloned() {
                    self.skipped_lanes |= processed.skipped_lanes;
                    if prev_value.as_ref() != Some(&value) {
                        self.did_receive_update = true;
                    }
                    let queue = processed.next.queue.clone();
                    self.next.push(Hook::State(processed.next));
                    return (value, queue);
                }
                self.type_mismatch::<S>("state");
            }
            Some(Err(())) => self.type_mismatch::<S>("state"),
            None => {}
        }

        let value = init();
        let state = QueueState::new(Rc::new(value.clone()));
        let queue = state.queue.clone();
        self.next.push(Hook::State(state));
        (value, queue)
    }

    /// A piece of state and its setter.
    ///
    /// `init` runs on mount only. Setting a value equal to the current one
    /// still schedules a render, but the component bails out of it.
    pub fn use_state<T>(&mut self, init: impl FnOnce() -> T) -> (T, SetState<T>)
    where
        T: Clone + PartialEq + 'static,
    {
        let (value, queue) = self.reducer_cell(init, |state: &T, action| {
            let action = action.downcast_ref::<StateAction<T>>()?;
            Some(match action {
                StateAction::Set(v) => v.clone(),
                StateAction::Update(f) => f(state),
            })
        });
        let setter = SetState {
            queue,
            fiber: self.fiber,
            updates: self.updates.clone(),
            _marker: PhantomData,
        };
        (value, setter)
    }

    /// State managed by a reducer.
    ///
    /// Queued actions are folded with the `reducer` passed to the render
    /// that processes them.
    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, &A) -> S,
        init: impl FnOnce() -> S,
    ) -> (S, Dispatch<A>)
    where
        S: Clone + PartialEq + 'static,
        A: 'static,
    {
        let (value, queue) = self.reducer_cell(init, |state: &S, action| {
            action.downcast_ref::<A>().map(|a| reducer(state, a))
        });
        let dispatch = Dispatch {
            queue,
            fiber: self.fiber,
            updates: self.updates.clone(),
            _marker: PhantomData,
        };
        (value, dispatch)
    }

    /// A value recomputed only when `deps` change.
    pub fn use_memo<T>(&mut self, deps: impl Into<Deps>, compute: impl FnOnce() -> T) -> T
    where
        T: Clone + 'static,
    {
        let Deps(deps) = deps.into();
        let reused = match self.prev_hook("memo") {
            Some(Hook::Memo {
                value,
                deps: prev_deps,
            }) if deps_equal(prev_deps.as_deref(), deps.as_deref()) => Some(value.clone()),
            _ => None,
        };
        if let Some(value) = reused {
            if let Some(out) = value.downcast_ref::<T>().cloned() {
                self.next.push(Hook::Memo { value, deps });
                return out;
            }
            self.type_mismatch::<T>("memo");
        }
        let out = compute();
        self.next.push(Hook::Memo {
            value: Rc::new(out.clone()),
            deps,
        });
        out
    }

    /// A handler whose identity changes only when `deps` change.
    pub fn use_callback<F>(&mut self, deps: impl Into<Deps>, f: F) -> Callback
    where
        F: Fn(&Value) -> Result<(), ComponentError> + 'static,
    {
        self.use_memo(deps, move || Callback::new(f))
    }

    /// A mutable cell that keeps its identity across renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Ref<T> {
        let existing = match self.prev_hook("ref") {
            Some(Hook::Ref(cell)) => Some(cell.clone()),
            _ => None,
        };
        if let Some(cell) = existing {
            if let Ok(typed) = cell.clone().downcast::<RefCell<T>>() {
                self.next.push(Hook::Ref(cell));
                return Ref(typed);
            }
            self.type_mismatch::<T>("ref");
        }
        let typed = Rc::new(RefCell::new(init()));
        self.next.push(Hook::Ref(typed.clone()));
        Ref(typed)
    }

    fn effect_cell(
        &mut self,
        kind: HookFlags,
        fiber_flag: Flags,
        deps: Deps,
        create: Create,
    ) {
        let Deps(deps) = deps;
        let name = if kind == HookFlags::LAYOUT {
            "layout effect"
        } else {
            "effect"
        };
        let prev = match self.prev_hook(name) {
            Some(Hook::Effect(prev)) => Some((
                prev.inst.clone(),
                deps_equal(prev.deps.as_deref(), deps.as_deref()),
            )),
            _ => None,
        };
        let (inst, unchanged) = prev.unwrap_or_else(|| (Rc::new(EffectInstance::default()), false));
        let tag = if unchanged {
            kind
        } else {
            self.fiber_flags |= fiber_flag;
            kind | HookFlags::HAS_EFFECT
        };
        let effect = Rc::new(Effect {
            tag,
            create: RefCell::new(Some(create)),
            inst,
            deps,
        });
        self.effects.push(effect.clone());
        self.next.push(Hook::Effect(effect));
    }

    /// An effect that runs after the commit, in a separately scheduled
    /// pass, whenever `deps` change.
    ///
    /// The previous cleanup runs before the new effect, and on unmount.
    pub fn use_effect<F>(&mut self, deps: impl Into<Deps>, create: F)
    where
        F: FnOnce() -> EffectResult + 'static,
    {
        self.effect_cell(HookFlags::PASSIVE, Flags::PASSIVE, deps.into(), Box::new(create));
    }

    /// An effect that runs synchronously in the mutation pass, whenever
    /// `deps` change.
    ///
    /// Its previous cleanup runs first, then the new effect, both once the
    /// component's descendants have been mutated and before any sibling
    /// that follows it is visited.
    pub fn use_layout_effect<F>(&mut self, deps: impl Into<Deps>, create: F)
    where
        F: FnOnce() -> EffectResult + 'static,
    {
        self.effect_cell(HookFlags::LAYOUT, Flags::UPDATE, deps.into(), Box::new(create));
    }

    /// Reads the nearest provided value of `context`.
    ///
    /// The component re-renders when that value changes, even below
    /// ancestors that skip rendering.
    pub fn use_context(&mut self, context: &Context) -> Value {
        let value = self.contexts.read(context);
        self.dependencies.push(ContextDependency {
            context: context.clone(),
            value: value.clone(),
        });
        value
    }

    /// Returns a value that lags behind `value` during urgent renders.
    ///
    /// An urgent render keeps returning the previous value and schedules a
    /// follow-up render in a transition lane, which then returns `value`.
    pub fn use_deferred_value<T>(&mut self, value: T) -> T
    where
        T: Clone + PartialEq + 'static,
    {
        let render_lanes = self.render_lanes;
        let prev = match self.prev_hook("deferred value") {
            Some(Hook::Deferred {
                value: prev,
                deferred,
            }) => Some((prev.clone(), *deferred)),
            _ => None,
        };
        let Some((prev, was_deferred)) = prev else {
            self.next.push(Hook::Deferred {
                value: Rc::new(value.clone()),
                deferred: false,
            });
            return value;
        };
        let Some(prev_value) = prev.downcast_ref::<T>().cloned() else {
            self.type_mismatch::<T>("deferred value");
            self.next.push(Hook::Deferred {
                value: Rc::new(value.clone()),
                deferred: false,
            });
            return value;
        };

        if prev_value == value {
            self.next.push(Hook::Deferred {
                value: prev,
                deferred: false,
            });
            return value;
        }
        if render_lanes.includes_only_non_urgent() {
            if was_deferred {
                self.did_receive_update = true;
            }
            self.next.push(Hook::Deferred {
                value: Rc::new(value.clone()),
                deferred: false,
            });
            value
        } else {
            let lane = self.updates.claim_transition_lane();
            self.skipped_lanes |= lane;
            self.next.push(Hook::Deferred {
                value: prev,
                deferred: true,
            });
            prev_value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualLoop;
    use alloc::vec;

    struct Fixture {
        contexts: ContextStack,
        updates: Rc<UpdateContext>,
        fiber: FiberId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                contexts: ContextStack::default(),
                updates: Rc::new(UpdateContext::new(Rc::new(ManualLoop::new()))),
                fiber: FiberId {
                    idx: 0,
                    generation: 0,
                },
            }
        }

        fn render<R>(
            &self,
            lanes: Lanes,
            prev: Option<Vec<Hook>>,
            f: impl FnOnce(&mut RenderCx<'_>) -> R,
        ) -> (R, Result<HookOutcome, Error>) {
            let mut cx = RenderCx::new(self.fiber, lanes, prev, false, &self.contexts, &self.updates);
            let out = f(&mut cx);
            (out, cx.finish().1)
        }
    }

    #[test]
    fn deps_compare_element_wise() {
        let a = vec![Value::from(1), Value::from("x")];
        let b = vec![Value::from(1), Value::from("x")];
        let c = vec![Value::from(2), Value::from("x")];
        let empty: &[Value] = &[];
        assert!(deps_equal(Some(a.as_slice()), Some(b.as_slice())));
        assert!(!deps_equal(Some(a.as_slice()), Some(c.as_slice())));
        assert!(!deps_equal(Some(a.as_slice()), Some(&a[..1])), "length change");
        assert!(!deps_equal(None, None), "no list means always");
        assert!(deps_equal(Some(empty), Some(empty)));
    }

    #[test]
    fn state_persists_and_applies_queued_updates() {
        let fx = Fixture::new();
        let ((v, set), out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_state(|| 1_i32));
        assert_eq!(v, 1);
        let hooks = out.unwrap().hooks;

        set.update(|n| n + 10);
        set.update(|n| n * 2);
        assert_eq!(fx.updates.take_pending().len(), 2);

        let ((v, _), out) = fx.render(Lanes::DEFAULT, Some(hooks), |cx| cx.use_state(|| 0_i32));
        assert_eq!(v, 22);
        assert!(out.unwrap().did_receive_update);
    }

    #[test]
    fn equal_state_does_not_mark_an_update() {
        let fx = Fixture::new();
        let ((_, set), out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_state(|| 5_i32));
        set.set(5);
        let (_, out) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| cx.use_state(|| 0_i32));
        assert!(!out.unwrap().did_receive_update);
    }

    #[test]
    fn updates_outside_render_lanes_are_skipped() {
        let fx = Fixture::new();
        let ((_, set), out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_state(|| 0_i32));
        fx.updates.start_transition(|| set.set(7));
        let ((v, _), out) =
            fx.render(Lanes::SYNC, Some(out.unwrap().hooks), |cx| cx.use_state(|| 0_i32));
        let out = out.unwrap();
        assert_eq!(v, 0, "transition update waits");
        assert!(out.skipped_lanes.is_transition());
    }

    #[test]
    fn reducer_folds_actions() {
        let fx = Fixture::new();
        let reducer = |s: &i64, a: &i64| s + a;
        let ((_, dispatch), out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_reducer(reducer, || 0_i64));
        dispatch.dispatch(3);
        dispatch.dispatch(4);
        let ((v, _), _) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| {
            cx.use_reducer(reducer, || 0_i64)
        });
        assert_eq!(v, 7);
    }

    #[test]
    fn memo_recomputes_only_on_dep_change() {
        let fx = Fixture::new();
        let calls = Rc::new(core::cell::Cell::new(0));
        let memo = |cx: &mut RenderCx<'_>, dep: i32, calls: &Rc<core::cell::Cell<i32>>| {
            cx.use_memo([dep], || {
                calls.set(calls.get() + 1);
                dep * 10
            })
        };
        let (v, out) = fx.render(Lanes::DEFAULT, None, |cx| memo(cx, 1, &calls));
        assert_eq!(v, 10);
        let (v, out) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| memo(cx, 1, &calls));
        assert_eq!((v, calls.get()), (10, 1));
        let (v, _) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| memo(cx, 2, &calls));
        assert_eq!((v, calls.get()), (20, 2));
    }

    #[test]
    fn refs_keep_identity() {
        let fx = Fixture::new();
        let (r1, out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_ref(|| vec![1]));
        r1.borrow_mut().push(2);
        let (r2, _) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| cx.use_ref(Vec::new));
        assert!(r1.ptr_eq(&r2));
        assert_eq!(r2.get(), vec![1, 2]);
    }

    #[test]
    fn effects_arm_only_when_deps_change() {
        let fx = Fixture::new();
        let (_, out) = fx.render(Lanes::DEFAULT, None, |cx| cx.use_effect([1], || Ok(None)));
        let out = out.unwrap();
        assert!(out.flags.contains(Flags::PASSIVE));
        assert!(out.effects[0].has_effect());

        let (_, same) = fx.render(Lanes::DEFAULT, Some(out.hooks), |cx| cx.use_effect([1], || Ok(None)));
        let same = same.unwrap();
        assert!(same.flags.is_empty());
        assert!(!same.effects[0].has_effect());

        let (_, changed) = fx.render(Lanes::DEFAULT, Some(same.hooks), |cx| {
            cx.use_layout_effect([2], || Ok(None));
        });
        assert!(
            matches!(changed, Err(Error::HookMismatch { expected: "effect", found: "layout effect", .. })),
            "switching effect kinds is a hook-order error"
        );
    }

    #[test]
    fn extra_hook_is_a_count_mismatch() {
        let fx = Fixture::new();
        let (_, out) = fx.render(Lanes::DEFAULT, None, |cx| {
            cx.use_ref(|| 0);
        });
        let (_, out) = fx.render(Lanes::DEFAULT, Some(out.unwrap().hooks), |cx| {
            cx.use_ref(|| 0);
            cx.use_ref(|| 0);
        });
        assert_eq!(
            out.err(),
            Some(Error::HookCountMismatch {
                previous: 1,
                current: 2
            })
        );
    }

    #[test]
    fn deferred_value_lags_during_urgent_renders() {
        let fx = Fixture::new();
        let (v, out) = fx.render(Lanes::SYNC, None, |cx| cx.use_deferred_value(1));
        assert_eq!(v, 1);

        let (v, out) = fx.render(Lanes::SYNC, Some(out.unwrap().hooks), |cx| cx.use_deferred_value(2));
        let out = out.unwrap();
        assert_eq!(v, 1, "urgent render keeps the old value");
        assert!(out.skipped_lanes.is_transition());

        let (v, out) = fx.render(out.skipped_lanes, Some(out.hooks), |cx| cx.use_deferred_value(2));
        assert_eq!(v, 2);
        assert!(out.unwrap().did_receive_update);
    }
}
