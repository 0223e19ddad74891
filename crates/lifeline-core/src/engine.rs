//! Scope stack engine.
//!
//! The engine is a stack machine over a single append-only action buffer. Every `begin_*`
//! appends the opening action and pushes a scope; every `end_*` pops the top scope (and only the
//! top scope) and appends the closing action. Calls closed without an explicit return get an
//! [`Action::ImplicitReturn`] right before they pop.

use crate::action::Action;
use crate::actor::{Actor, SessionId};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::trace::{Marker, Trace};
use rustc_hash::{FxHashMap, FxHashSet};

pub const OP_CREATE: &str = "create";
pub const OP_DESTROY: &str = "destroy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Call,
    Fragment,
}

/// Ticket for an open scope. Closing consumes it, so a scope cannot be closed twice.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an open scope must be closed with `end_call`/`end_fragment`"]
pub struct ScopeHandle {
    serial: u64,
    kind: ScopeKind,
}

impl ScopeHandle {
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }
}

#[derive(Debug)]
enum Scope {
    Call {
        serial: u64,
        caller: Actor,
        callee: Actor,
        method: String,
        returned: bool,
    },
    Fragment {
        serial: u64,
        op_name: String,
        begin_at: usize,
        branch: Option<String>,
        target: Option<Actor>,
    },
}

impl Scope {
    fn serial(&self) -> u64 {
        match self {
            Scope::Call { serial, .. } | Scope::Fragment { serial, .. } => *serial,
        }
    }

    fn describe(&self) -> String {
        match self {
            Scope::Call {
                caller,
                callee,
                method,
                ..
            } => format!("call {caller} -> {callee}::{method}"),
            Scope::Fragment {
                op_name,
                branch: Some(label),
                ..
            } => format!("fragment `{op_name}` (branch `{label}`)"),
            Scope::Fragment { op_name, .. } => format!("fragment `{op_name}`"),
        }
    }
}

fn describe_innermost(stack: &[Scope]) -> String {
    stack
        .last()
        .map(Scope::describe)
        .unwrap_or_else(|| "none".to_string())
}

fn require_name(value: &str, what: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::EmptyName { what });
    }
    Ok(())
}

#[derive(Debug)]
pub struct Engine {
    session: SessionId,
    actors: Vec<Actor>,
    actor_ids: FxHashMap<String, u32>,
    destroyed: FxHashSet<u32>,
    actions: Vec<Action>,
    markers: Vec<Marker>,
    stack: Vec<Scope>,
    next_serial: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            session: SessionId::new(),
            actors: Vec::new(),
            actor_ids: FxHashMap::default(),
            destroyed: FxHashSet::default(),
            actions: Vec::new(),
            markers: Vec::new(),
            stack: Vec::new(),
            next_serial: 0,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Registers a participant. Records nothing in the trace.
    pub fn declare_actor(&mut self, name: &str, class: Option<&str>) -> Result<Actor> {
        require_name(name, "actor name")?;
        if self.actor_ids.contains_key(name) {
            return Err(Error::DuplicateActor {
                name: name.to_string(),
            });
        }
        let id = self.actors.len() as u32;
        let actor = Actor::new(
            self.session,
            id,
            name.to_string(),
            class.filter(|c| !c.is_empty()).map(str::to_string),
        );
        self.actor_ids.insert(name.to_string(), id);
        self.actors.push(actor.clone());
        tracing::trace!(actor = name, id, "declare actor");
        Ok(actor)
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        let id = *self.actor_ids.get(name)?;
        self.actors.get(id as usize)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Actions recorded so far.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Stack position and callee of the innermost open call, if any.
    pub fn innermost_call(&self) -> Option<(usize, &Actor)> {
        self.stack
            .iter()
            .enumerate()
            .rev()
            .find_map(|(pos, scope)| match scope {
                Scope::Call { callee, .. } => Some((pos, callee)),
                Scope::Fragment { .. } => None,
            })
    }

    pub fn current_callee(&self) -> Option<&Actor> {
        self.innermost_call().map(|(_, callee)| callee)
    }

    fn ensure_known(&self, actor: &Actor) -> Result<()> {
        let known = actor.session() == self.session
            && self
                .actors
                .get(actor.id() as usize)
                .is_some_and(|a| a == actor);
        if !known {
            return Err(Error::UnknownActor {
                name: actor.name().to_string(),
            });
        }
        Ok(())
    }

    fn ensure_alive(&self, actor: &Actor, method: &str) -> Result<()> {
        if self.destroyed.contains(&actor.id()) {
            return Err(Error::DestroyedActor {
                name: actor.name().to_string(),
                method: method.to_string(),
            });
        }
        Ok(())
    }

    fn push(&mut self, scope: impl FnOnce(u64) -> Scope) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.stack.push(scope(serial));
        serial
    }

    /// Fails unless `handle` names the top of the stack and has the expected kind.
    fn check_top(&self, handle: &ScopeHandle, kind: ScopeKind, op: &str) -> Result<()> {
        if handle.kind != kind {
            return Err(Error::UnbalancedScope {
                message: format!("`{op}` was given a {:?} scope handle", handle.kind),
            });
        }
        match self.stack.last() {
            Some(top) if top.serial() == handle.serial => Ok(()),
            Some(top) => Err(Error::UnbalancedScope {
                message: format!(
                    "`{op}` targets a scope that is not innermost; {} is still open",
                    top.describe()
                ),
            }),
            None => Err(Error::UnbalancedScope {
                message: format!("`{op}` called with no open scope"),
            }),
        }
    }

    pub fn begin_call(
        &mut self,
        caller: &Actor,
        callee: &Actor,
        method: &str,
        params: Params,
    ) -> Result<ScopeHandle> {
        require_name(method, "method name")?;
        self.ensure_known(caller)?;
        self.ensure_known(callee)?;
        self.ensure_alive(caller, method)?;
        self.ensure_alive(callee, method)?;

        tracing::trace!(
            depth = self.stack.len(),
            caller = caller.name(),
            callee = callee.name(),
            method,
            "begin call"
        );
        self.actions
            .push(Action::call(caller, callee, method, params));
        let serial = self.push(|serial| Scope::Call {
            serial,
            caller: caller.clone(),
            callee: callee.clone(),
            method: method.to_string(),
            returned: false,
        });
        Ok(ScopeHandle {
            serial,
            kind: ScopeKind::Call,
        })
    }

    /// Records the return of the innermost scope, which must be a call without a return yet.
    pub fn record_return(&mut self, params: Params) -> Result<()> {
        match self.stack.last() {
            Some(Scope::Call {
                returned: true,
                callee,
                method,
                ..
            }) => {
                return Err(Error::DuplicateReturn {
                    call: format!("{callee}::{method}"),
                });
            }
            Some(Scope::Call { .. }) => {}
            _ => {
                return Err(Error::NoActiveCall {
                    innermost: describe_innermost(&self.stack),
                });
            }
        }
        if let Some(Scope::Call { returned, .. }) = self.stack.last_mut() {
            *returned = true;
        }
        tracing::trace!(depth = self.stack.len(), "record return");
        self.actions.push(Action::ret(params));
        Ok(())
    }

    /// Records the return of the call opened as `handle`. Fails, recording nothing, unless that
    /// call is the innermost scope.
    pub fn record_return_for(&mut self, handle: &ScopeHandle, params: Params) -> Result<()> {
        self.check_top(handle, ScopeKind::Call, "ret")?;
        self.record_return(params)
    }

    pub fn end_call(&mut self, handle: ScopeHandle) -> Result<()> {
        self.check_top(&handle, ScopeKind::Call, "end_call")?;
        let Some(Scope::Call { returned, .. }) = self.stack.pop() else {
            return Err(Error::UnbalancedScope {
                message: "`end_call` popped a scope that is not a call".to_string(),
            });
        };
        if !returned {
            self.actions.push(Action::ImplicitReturn);
        }
        tracing::trace!(depth = self.stack.len(), implicit = !returned, "end call");
        Ok(())
    }

    pub fn begin_fragment(&mut self, op_name: &str, condition: Option<&str>) -> Result<ScopeHandle> {
        self.open_fragment(op_name, condition, None)
    }

    fn open_fragment(
        &mut self,
        op_name: &str,
        condition: Option<&str>,
        target: Option<Actor>,
    ) -> Result<ScopeHandle> {
        require_name(op_name, "fragment operator")?;
        tracing::trace!(depth = self.stack.len(), op_name, ?condition, "begin fragment");
        let begin_at = self.actions.len();
        self.actions.push(Action::fragment_begin(op_name, condition));
        let serial = self.push(|serial| Scope::Fragment {
            serial,
            op_name: op_name.to_string(),
            begin_at,
            branch: None,
            target,
        });
        Ok(ScopeHandle {
            serial,
            kind: ScopeKind::Fragment,
        })
    }

    pub fn end_fragment(&mut self, handle: ScopeHandle) -> Result<()> {
        self.check_top(&handle, ScopeKind::Fragment, "end_fragment")?;
        if let Some(Scope::Fragment {
            op_name,
            branch: Some(label),
            ..
        }) = self.stack.last()
        {
            return Err(Error::UnbalancedScope {
                message: format!("fragment `{op_name}` closed while branch `{label}` is open"),
            });
        }
        let Some(Scope::Fragment {
            op_name, target, ..
        }) = self.stack.pop()
        else {
            return Err(Error::UnbalancedScope {
                message: "`end_fragment` popped a scope that is not a fragment".to_string(),
            });
        };
        if op_name == OP_DESTROY {
            if let Some(actor) = target {
                self.destroyed.insert(actor.id());
            }
        }
        tracing::trace!(depth = self.stack.len(), op_name = %op_name, "end fragment");
        self.actions.push(Action::fragment_end(op_name));
        Ok(())
    }

    /// Starts an alternative branch (e.g. a `choice` of an `alt`) in the innermost fragment.
    ///
    /// No action is appended; the branch start is kept as a [`Marker::Branch`].
    pub fn begin_branch(&mut self, label: &str) -> Result<()> {
        let at = self.actions.len();
        let Some(Scope::Fragment {
            op_name,
            begin_at,
            branch,
            ..
        }) = self.stack.last_mut()
        else {
            return Err(Error::NoActiveFragment {
                label: label.to_string(),
                innermost: describe_innermost(&self.stack),
            });
        };
        if let Some(open) = branch {
            return Err(Error::UnbalancedScope {
                message: format!(
                    "branch `{label}` started in fragment `{op_name}` while branch `{open}` is open"
                ),
            });
        }
        *branch = Some(label.to_string());
        tracing::trace!(op_name = %op_name, label, "begin branch");
        self.markers.push(Marker::Branch {
            at,
            fragment: *begin_at,
            label: label.to_string(),
        });
        Ok(())
    }

    pub fn end_branch(&mut self) -> Result<()> {
        if let Some(Scope::Fragment {
            branch: branch @ Some(_),
            ..
        }) = self.stack.last_mut()
        {
            *branch = None;
            return Ok(());
        }
        Err(Error::UnbalancedScope {
            message: format!(
                "`end_branch` with no open branch (innermost scope: {})",
                describe_innermost(&self.stack)
            ),
        })
    }

    /// The branch open in the innermost fragment, if any.
    pub fn current_branch(&self) -> Option<&str> {
        match self.stack.last() {
            Some(Scope::Fragment { branch, .. }) => branch.as_deref(),
            _ => None,
        }
    }

    /// Declares `name` and opens the `create` scope that brings its lifeline into view.
    pub fn create_actor(&mut self, name: &str, class: Option<&str>) -> Result<(Actor, ScopeHandle)> {
        let actor = self.declare_actor(name, class)?;
        let handle = self.open_fragment(OP_CREATE, Some(name), Some(actor.clone()))?;
        Ok((actor, handle))
    }

    /// Opens the `destroy` scope of `actor`; once it closes the actor can take no further calls.
    pub fn destroy_actor(&mut self, actor: &Actor) -> Result<ScopeHandle> {
        self.ensure_known(actor)?;
        self.ensure_alive(actor, OP_DESTROY)?;
        self.open_fragment(OP_DESTROY, Some(actor.name()), Some(actor.clone()))
    }

    pub fn note(&mut self, over: &[Actor], text: &str) -> Result<()> {
        if over.is_empty() {
            return Err(Error::NoCurrentObject {
                operation: "note".to_string(),
            });
        }
        for actor in over {
            self.ensure_known(actor)?;
        }
        self.markers.push(Marker::Note {
            at: self.actions.len(),
            over: over.to_vec(),
            text: text.to_string(),
        });
        Ok(())
    }

    /// Completes the session. Fails if any scope is still open.
    pub fn finish(self) -> Result<Trace> {
        if !self.stack.is_empty() {
            let open = self
                .stack
                .iter()
                .map(Scope::describe)
                .collect::<Vec<_>>()
                .join(" > ");
            return Err(Error::UnbalancedScope {
                message: format!("diagram finished with open scopes: {open}"),
            });
        }
        tracing::debug!(
            actors = self.actors.len(),
            actions = self.actions.len(),
            markers = self.markers.len(),
            "diagram session finished"
        );
        Ok(Trace::new(self.actors, self.actions, self.markers))
    }
}
