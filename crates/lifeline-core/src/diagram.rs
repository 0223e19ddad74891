//! Object-oriented builder over the [`Engine`].
//!
//! Scopes are opened by methods that return guards; dropping a guard closes its scope, so nested
//! Rust blocks give the nesting of the diagram:
//!
//! ```
//! use lifeline_core::{Action, Diagram, params};
//!
//! let trace = Diagram::build(|c| {
//!     let foo = c.object("foo", None)?;
//!     let bar = c.object("bar", None)?;
//!     let _foo = foo.enter()?;
//!     let _opt = c.opt()?;
//!     bar.invoke("func", params!())?;
//!     Ok(())
//! })?;
//! assert_eq!(trace.len(), 4);
//! assert_eq!(trace.actions()[3], Action::fragment_end("opt"));
//! # Ok::<(), lifeline_core::Error>(())
//! ```
//!
//! Bind guards to named variables (`let _opt = ...`): `let _ = ...` drops the guard at once.

use crate::actor::Actor;
use crate::engine::{Engine, ScopeHandle};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::trace::Trace;
use std::cell::RefCell;

#[derive(Debug)]
struct Focus {
    actor: Actor,
    depth: usize,
}

/// One diagram-building session.
#[derive(Debug, Default)]
pub struct Diagram {
    engine: RefCell<Engine>,
    focus: RefCell<Vec<Focus>>,
    deferred: RefCell<Option<Error>>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `define` against a fresh session and returns the finished trace.
    pub fn build<F>(define: F) -> Result<Trace>
    where
        F: FnOnce(&Diagram) -> Result<()>,
    {
        let diagram = Diagram::new();
        define(&diagram)?;
        diagram.finish()
    }

    fn check(&self) -> Result<()> {
        match self.deferred.borrow().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Keeps the first error raised while a guard was dropped.
    fn defer(&self, err: Error) {
        tracing::debug!(error = %err, "scope close failed during drop");
        let mut slot = self.deferred.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// The object new calls originate from: the most recently entered object or the callee of
    /// the innermost open call, whichever was opened last.
    fn current_object(&self, operation: &str) -> Result<Actor> {
        let engine = self.engine.borrow();
        let focus = self.focus.borrow();
        let call = engine.innermost_call();
        let entered = focus.last();
        let actor = match (call, entered) {
            (Some((pos, callee)), Some(f)) => {
                if f.depth > pos {
                    &f.actor
                } else {
                    callee
                }
            }
            (Some((_, callee)), None) => callee,
            (None, Some(f)) => &f.actor,
            (None, None) => {
                return Err(Error::NoCurrentObject {
                    operation: operation.to_string(),
                });
            }
        };
        Ok(actor.clone())
    }

    pub fn object(&self, name: &str, class: Option<&str>) -> Result<Object<'_>> {
        self.check()?;
        let actor = self.engine.borrow_mut().declare_actor(name, class)?;
        Ok(Object {
            diagram: self,
            actor,
        })
    }

    /// Wraps an actor already declared in this session.
    pub fn object_for(&self, actor: &Actor) -> Object<'_> {
        Object {
            diagram: self,
            actor: actor.clone(),
        }
    }

    pub fn fragment(&self, op_name: &str, condition: Option<&str>) -> Result<FragmentGuard<'_>> {
        self.check()?;
        let handle = self
            .engine
            .borrow_mut()
            .begin_fragment(op_name, condition)?;
        Ok(FragmentGuard::new(self, handle))
    }

    pub fn opt(&self) -> Result<FragmentGuard<'_>> {
        self.fragment("opt", None)
    }

    pub fn loop_(&self) -> Result<FragmentGuard<'_>> {
        self.fragment("loop", None)
    }

    pub fn alt(&self) -> Result<FragmentGuard<'_>> {
        self.fragment("alt", None)
    }

    /// Opens a branch of the innermost fragment (normally an [`alt`](Self::alt)).
    pub fn choice(&self, label: &str) -> Result<BranchGuard<'_>> {
        self.check()?;
        self.engine.borrow_mut().begin_branch(label)?;
        Ok(BranchGuard {
            diagram: self,
            open: true,
        })
    }

    /// Declares a new object whose lifeline starts inside the returned scope.
    pub fn create(&self, name: &str, class: Option<&str>) -> Result<(Object<'_>, FragmentGuard<'_>)> {
        self.check()?;
        let (actor, handle) = self.engine.borrow_mut().create_actor(name, class)?;
        Ok((
            Object {
                diagram: self,
                actor,
            },
            FragmentGuard::new(self, handle),
        ))
    }

    pub fn destroy(&self, object: &Object<'_>) -> Result<FragmentGuard<'_>> {
        self.check()?;
        let handle = self.engine.borrow_mut().destroy_actor(&object.actor)?;
        Ok(FragmentGuard::new(self, handle))
    }

    /// Records the return of the innermost open call.
    pub fn ret(&self, params: Params) -> Result<()> {
        self.check()?;
        self.engine.borrow_mut().record_return(params)
    }

    /// Adds a note over the current object.
    pub fn note(&self, text: &str) -> Result<()> {
        self.check()?;
        let actor = self.current_object("note")?;
        self.engine.borrow_mut().note(&[actor], text)
    }

    pub fn note_over(&self, over: &[&Object<'_>], text: &str) -> Result<()> {
        self.check()?;
        let actors: Vec<Actor> = over.iter().map(|o| o.actor.clone()).collect();
        self.engine.borrow_mut().note(&actors, text)
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.engine.borrow().depth()
    }

    /// Number of actions recorded so far.
    pub fn action_count(&self) -> usize {
        self.engine.borrow().actions().len()
    }

    pub fn finish(self) -> Result<Trace> {
        if let Some(err) = self.deferred.into_inner() {
            return Err(err);
        }
        if let Some(f) = self.focus.borrow().last() {
            return Err(Error::UnbalancedScope {
                message: format!("diagram finished while object `{}` is entered", f.actor),
            });
        }
        self.engine.into_inner().finish()
    }

    fn end_call(&self, handle: ScopeHandle) -> Result<()> {
        self.engine.borrow_mut().end_call(handle)
    }

    fn end_fragment(&self, handle: ScopeHandle) -> Result<()> {
        self.engine.borrow_mut().end_fragment(handle)
    }
}

/// A participant handle bound to its diagram.
#[derive(Debug, Clone)]
pub struct Object<'d> {
    diagram: &'d Diagram,
    actor: Actor,
}

impl<'d> Object<'d> {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn name(&self) -> &str {
        self.actor.name()
    }

    /// Makes this object the origin of calls issued while the guard lives.
    pub fn enter(&self) -> Result<FocusGuard<'d>> {
        self.diagram.check()?;
        let depth = self.diagram.depth();
        self.diagram.focus.borrow_mut().push(Focus {
            actor: self.actor.clone(),
            depth,
        });
        Ok(FocusGuard {
            diagram: self.diagram,
            actor: Some(self.actor.clone()),
        })
    }

    /// Calls `method` on this object from the current object; the call stays open until the
    /// guard is dropped, closed or returned from.
    pub fn call(&self, method: &str, params: Params) -> Result<CallGuard<'d>> {
        self.diagram.check()?;
        let caller = self.diagram.current_object(method)?;
        let handle = self
            .diagram
            .engine
            .borrow_mut()
            .begin_call(&caller, &self.actor, method, params)?;
        Ok(CallGuard {
            diagram: self.diagram,
            handle: Some(handle),
        })
    }

    /// A call with nothing nested in it and an implicit return.
    pub fn invoke(&self, method: &str, params: Params) -> Result<()> {
        self.call(method, params)?.close()
    }

    pub fn note(&self, text: &str) -> Result<()> {
        self.diagram.check()?;
        self.diagram
            .engine
            .borrow_mut()
            .note(std::slice::from_ref(&self.actor), text)
    }
}

/// Open call scope.
#[must_use = "dropping the guard closes the call immediately"]
#[derive(Debug)]
pub struct CallGuard<'d> {
    diagram: &'d Diagram,
    handle: Option<ScopeHandle>,
}

impl CallGuard<'_> {
    /// Records an explicit return for this call and closes it. Nothing is recorded unless the
    /// call is the innermost open scope.
    pub fn ret(self, params: Params) -> Result<()> {
        self.diagram.check()?;
        if let Some(handle) = self.handle.as_ref() {
            self.diagram
                .engine
                .borrow_mut()
                .record_return_for(handle, params)?;
        }
        self.close()
    }

    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.diagram.end_call(handle),
            None => Ok(()),
        }
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.diagram.end_call(handle) {
                self.diagram.defer(err);
            }
        }
    }
}

/// Open fragment scope (`opt`, `loop`, `alt`, `create`, `destroy`, ...).
#[must_use = "dropping the guard closes the fragment immediately"]
#[derive(Debug)]
pub struct FragmentGuard<'d> {
    diagram: &'d Diagram,
    handle: Option<ScopeHandle>,
}

impl<'d> FragmentGuard<'d> {
    fn new(diagram: &'d Diagram, handle: ScopeHandle) -> Self {
        Self {
            diagram,
            handle: Some(handle),
        }
    }

    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.diagram.end_fragment(handle),
            None => Ok(()),
        }
    }
}

impl Drop for FragmentGuard<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.diagram.end_fragment(handle) {
                self.diagram.defer(err);
            }
        }
    }
}

/// Open branch of an alternative fragment.
#[must_use = "dropping the guard ends the branch immediately"]
#[derive(Debug)]
pub struct BranchGuard<'d> {
    diagram: &'d Diagram,
    open: bool,
}

impl BranchGuard<'_> {
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.diagram.engine.borrow_mut().end_branch()
    }
}

impl Drop for BranchGuard<'_> {
    fn drop(&mut self) {
        if self.open {
            self.open = false;
            if let Err(err) = self.diagram.engine.borrow_mut().end_branch() {
                self.diagram.defer(err);
            }
        }
    }
}

/// Entered object; see [`Object::enter`].
#[must_use = "dropping the guard leaves the object immediately"]
#[derive(Debug)]
pub struct FocusGuard<'d> {
    diagram: &'d Diagram,
    actor: Option<Actor>,
}

impl FocusGuard<'_> {
    fn leave(&mut self) -> Result<()> {
        let Some(actor) = self.actor.take() else {
            return Ok(());
        };
        let mut focus = self.diagram.focus.borrow_mut();
        if !focus.last().is_some_and(|top| top.actor == actor) {
            return Err(Error::UnbalancedScope {
                message: format!("object `{actor}` left while another object is entered"),
            });
        }
        focus.pop();
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.leave()
    }
}

impl Drop for FocusGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            self.diagram.defer(err);
        }
    }
}
