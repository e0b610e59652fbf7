//! Self-reconciling view with private state.
//!
//! # Responsibility
//! - Render a component template into the document from private state.
//! - Rebuild the subtree on reconciling updates and swap it in place.
//! - Re-attach handler records and restore focus, caret and scroll.
//!
//! # Invariants
//! - Lifecycle is `Uninitialized -> Rendered -> Destroyed`; nothing leaves
//!   `Destroyed`.
//! - At most one render runs per view; a reconciling update requested while
//!   one runs marks the view dirty and the running loop renders once more.
//! - Handlers are attached to the fresh node only, one record per
//!   (node, event kind), so a listener can never be registered twice.
//! - No state borrow is held while a template, handler or hook runs.

use crate::bus::Subscription;
use crate::dom::{
    Document, Dom, DomError, DomEvent, DomEventKind, DomResult, Listener, NodeId,
    RenderPosition, Selector, TransientDomState,
};
use log::{debug, warn};
use maud::Markup;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

pub type ViewResult<T> = Result<T, ViewError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The view was destroyed and cannot render again.
    Destroyed,
    Dom(DomError),
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Destroyed => write!(f, "view is destroyed"),
            Self::Dom(err) => write!(f, "dom error: {err}"),
        }
    }
}

impl Error for ViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Destroyed => None,
            Self::Dom(err) => Some(err),
        }
    }
}

impl From<DomError> for ViewError {
    fn from(value: DomError) -> Self {
        Self::Dom(value)
    }
}

/// How `set_state` treats the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Mutate state only; the DOM already shows the change.
    Silent,
    /// Mutate state, then rebuild and swap the subtree.
    Reconcile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Uninitialized,
    Rendered,
    Destroyed,
}

/// Where a binding is attached inside the rendered subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Root,
    /// Every matching element, root included.
    Select(Selector),
}

/// Handler entry point of a binding.
pub type BindingHandler<C> = fn(&StatefulView<C>, &DomEvent);

/// One handler registration record.
pub struct Binding<C: ViewComponent> {
    pub target: Target,
    pub kind: DomEventKind,
    pub handler: BindingHandler<C>,
}

impl<C: ViewComponent> Binding<C> {
    pub fn root(kind: DomEventKind, handler: BindingHandler<C>) -> Self {
        Self {
            target: Target::Root,
            kind,
            handler,
        }
    }

    pub fn on(selector: Selector, kind: DomEventKind, handler: BindingHandler<C>) -> Self {
        Self {
            target: Target::Select(selector),
            kind,
            handler,
        }
    }
}

/// Capabilities a concrete view provides.
pub trait ViewComponent: Sized + 'static {
    type State: Clone + 'static;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Markup for `state`. Must have exactly one root element.
    fn template(&self, state: &Self::State) -> Markup;

    /// Handler records attached after every render.
    fn bindings(&self) -> Vec<Binding<Self>> {
        Vec::new()
    }

    /// Reapplies focus, caret and scroll captured from the replaced subtree.
    ///
    /// `Ok(false)` means the focused control is gone; the render goes on.
    fn restore_transient_dom_state(
        &self,
        document: &mut Document,
        fresh: NodeId,
        snapshot: &TransientDomState,
    ) -> DomResult<bool> {
        document.restore_transient(fresh, snapshot)
    }

    /// Runs after each render, once handlers are attached.
    fn after_render(_view: &StatefulView<Self>) {}
}

struct ViewCell<C: ViewComponent> {
    component: C,
    dom: Dom,
    state: RefCell<C::State>,
    element: Cell<Option<NodeId>>,
    phase: Cell<ViewPhase>,
    rendering: Cell<bool>,
    dirty: Cell<bool>,
    render_count: Cell<u64>,
    subscriptions: RefCell<Vec<Subscription>>,
}

/// Clears the render flags on every exit from the render loop, unwinding
/// included, so a panicking render does not wedge later updates.
struct RenderGuard<'a> {
    rendering: &'a Cell<bool>,
    dirty: &'a Cell<bool>,
}

impl<'a> RenderGuard<'a> {
    fn enter(rendering: &'a Cell<bool>, dirty: &'a Cell<bool>) -> Self {
        rendering.set(true);
        Self { rendering, dirty }
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.rendering.set(false);
        self.dirty.set(false);
    }
}

/// Handle to one view; clones share the same view.
pub struct StatefulView<C: ViewComponent> {
    cell: Rc<ViewCell<C>>,
}

impl<C: ViewComponent> Clone for StatefulView<C> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

/// Non-owning handle for callbacks that must not keep a view alive.
pub struct WeakView<C: ViewComponent> {
    cell: Weak<ViewCell<C>>,
}

impl<C: ViewComponent> Clone for WeakView<C> {
    fn clone(&self) -> Self {
        Self {
            cell: Weak::clone(&self.cell),
        }
    }
}

impl<C: ViewComponent> WeakView<C> {
    pub fn upgrade(&self) -> Option<StatefulView<C>> {
        self.cell.upgrade().map(|cell| StatefulView { cell })
    }
}

impl<C: ViewComponent> StatefulView<C> {
    pub fn new(dom: &Dom, component: C, state: C::State) -> Self {
        Self {
            cell: Rc::new(ViewCell {
                component,
                dom: dom.clone(),
                state: RefCell::new(state),
                element: Cell::new(None),
                phase: Cell::new(ViewPhase::Uninitialized),
                rendering: Cell::new(false),
                dirty: Cell::new(false),
                render_count: Cell::new(0),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakView<C> {
        WeakView {
            cell: Rc::downgrade(&self.cell),
        }
    }

    pub fn component(&self) -> &C {
        &self.cell.component
    }

    pub fn dom(&self) -> &Dom {
        &self.cell.dom
    }

    pub fn phase(&self) -> ViewPhase {
        self.cell.phase.get()
    }

    /// Number of subtrees built so far.
    pub fn render_count(&self) -> u64 {
        self.cell.render_count.get()
    }

    /// Copy of the current state.
    pub fn state(&self) -> C::State {
        self.cell.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&C::State) -> R) -> R {
        f(&self.cell.state.borrow())
    }

    /// Root node, rendering it on first access.
    pub fn element(&self) -> ViewResult<NodeId> {
        match self.phase() {
            ViewPhase::Destroyed => Err(ViewError::Destroyed),
            ViewPhase::Rendered => self.cell.element.get().ok_or(ViewError::Destroyed),
            ViewPhase::Uninitialized => {
                let element = self.build()?;
                self.cell.element.set(Some(element));
                self.cell.phase.set(ViewPhase::Rendered);
                self.attach_handlers(element)?;
                C::after_render(self);
                Ok(element)
            }
        }
    }

    /// Renders if needed and inserts the root under `parent`.
    pub fn mount(&self, parent: NodeId, position: RenderPosition) -> ViewResult<NodeId> {
        let element = self.element()?;
        self.cell
            .dom
            .with_mut(|document| document.insert(parent, element, position))?;
        Ok(element)
    }

    /// Keeps `subscription` alive until the view is destroyed.
    pub fn own_subscription(&self, subscription: Subscription) {
        self.cell.subscriptions.borrow_mut().push(subscription);
    }

    pub fn owned_subscription_count(&self) -> usize {
        self.cell.subscriptions.borrow().len()
    }

    /// Applies `patch` to the private state.
    ///
    /// With `UpdateMode::Reconcile` a rendered view rebuilds its subtree;
    /// an unrendered view picks the change up on first render.
    ///
    /// # Errors
    /// - `Destroyed` after `destroy`; the state is left untouched.
    /// - `Dom` when the fresh template cannot be built or swapped in.
    pub fn set_state(&self, mode: UpdateMode, patch: impl FnOnce(&mut C::State)) -> ViewResult<()> {
        if self.phase() == ViewPhase::Destroyed {
            return Err(ViewError::Destroyed);
        }
        patch(&mut self.cell.state.borrow_mut());

        if mode == UpdateMode::Silent || self.phase() == ViewPhase::Uninitialized {
            return Ok(());
        }
        if self.cell.rendering.get() {
            self.cell.dirty.set(true);
            debug!(
                "event=view_render module=view status=deferred view={}",
                self.cell.component.name()
            );
            return Ok(());
        }

        let _guard = RenderGuard::enter(&self.cell.rendering, &self.cell.dirty);
        self.render_loop()
    }

    /// Reconciling shorthand for `set_state`.
    pub fn update_element(&self, patch: impl FnOnce(&mut C::State)) -> ViewResult<()> {
        self.set_state(UpdateMode::Reconcile, patch)
    }

    fn render_loop(&self) -> ViewResult<()> {
        loop {
            self.cell.dirty.set(false);
            self.reconcile()?;
            if !self.cell.dirty.get() || self.phase() == ViewPhase::Destroyed {
                return Ok(());
            }
        }
    }

    fn build(&self) -> ViewResult<NodeId> {
        let markup = {
            let state = self.cell.state.borrow();
            self.cell.component.template(&state).into_string()
        };
        let element = self
            .cell
            .dom
            .with_mut(|document| document.create_fragment(&markup))?;
        self.cell.render_count.set(self.cell.render_count.get() + 1);
        Ok(element)
    }

    fn reconcile(&self) -> ViewResult<()> {
        let Some(old) = self.cell.element.get() else {
            return Ok(());
        };
        let fresh = self.build()?;
        let dom = &self.cell.dom;
        let swapped = dom.with_mut(|document| -> DomResult<(TransientDomState, bool)> {
            let snapshot = document.capture_transient(old);
            let compatible = document.tag(old) == document.tag(fresh);
            if document.parent(old).is_some() {
                document.replace_node(old, fresh)?;
            }
            document.discard(old)?;
            Ok((snapshot, compatible))
        });
        let (snapshot, compatible) = match swapped {
            Ok(swapped) => swapped,
            Err(err) => {
                if let Err(discard_err) = dom.with_mut(|document| document.discard(fresh)) {
                    warn!(
                        "event=view_render module=view status=error view={} error={}",
                        self.cell.component.name(),
                        discard_err
                    );
                }
                return Err(err.into());
            }
        };
        self.cell.element.set(Some(fresh));
        self.attach_handlers(fresh)?;

        if compatible {
            let restored = dom.with_mut(|document| {
                self.cell
                    .component
                    .restore_transient_dom_state(document, fresh, &snapshot)
            });
            match restored {
                Ok(true) => {}
                Ok(false) => debug!(
                    "event=view_restore module=view status=skipped view={} reason=missing_control",
                    self.cell.component.name()
                ),
                Err(err) => debug!(
                    "event=view_restore module=view status=skipped view={} error={}",
                    self.cell.component.name(),
                    err
                ),
            }
        } else {
            debug!(
                "event=view_restore module=view status=skipped view={} reason=root_changed",
                self.cell.component.name()
            );
        }

        debug!(
            "event=view_render module=view status=ok view={} renders={}",
            self.cell.component.name(),
            self.render_count()
        );
        C::after_render(self);
        Ok(())
    }

    fn attach_handlers(&self, root: NodeId) -> ViewResult<()> {
        let dom = &self.cell.dom;
        for binding in self.cell.component.bindings() {
            let targets = match &binding.target {
                Target::Root => vec![root],
                Target::Select(selector) => dom.with(|document| document.query_all(root, selector)),
            };
            for target in targets {
                let weak = self.downgrade();
                let handler = binding.handler;
                let listener: Listener = Rc::new(move |event: &DomEvent| {
                    let Some(view) = weak.upgrade() else {
                        return;
                    };
                    if view.phase() == ViewPhase::Destroyed {
                        return;
                    }
                    handler(&view, event);
                });
                dom.with_mut(|document| document.set_listener(target, binding.kind, listener))?;
            }
        }
        Ok(())
    }

    /// Removes the subtree with its listeners and drops owned subscriptions.
    ///
    /// Idempotent.
    pub fn destroy(&self) {
        if self.phase() == ViewPhase::Destroyed {
            return;
        }
        self.cell.phase.set(ViewPhase::Destroyed);
        if let Some(element) = self.cell.element.take() {
            if let Err(err) = self.cell.dom.with_mut(|document| document.discard(element)) {
                warn!(
                    "event=view_destroy module=view status=error view={} error={}",
                    self.cell.component.name(),
                    err
                );
            }
        }
        let subscriptions = std::mem::take(&mut *self.cell.subscriptions.borrow_mut());
        drop(subscriptions);
        debug!(
            "event=view_destroy module=view status=ok view={}",
            self.cell.component.name()
        );
    }
}

/// Puts `new`'s root where `old`'s root is; `old` stays rendered, detached.
pub fn replace_view<A: ViewComponent, B: ViewComponent>(
    new: &StatefulView<A>,
    old: &StatefulView<B>,
) -> ViewResult<()> {
    let fresh = new.element()?;
    let current = old.element()?;
    new.dom()
        .with_mut(|document| document.replace_node(current, fresh))?;
    Ok(())
}
