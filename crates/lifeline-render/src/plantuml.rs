//! PlantUML sequence-diagram text.
//!
//! One pass over the trace: every action emits one block, fragments indent their body, branch
//! markers become `else` lines and notes become `note over` blocks.

use crate::config::RenderConfig;
use crate::{Error, Result};
use lifeline_core::engine::{OP_CREATE, OP_DESTROY};
use lifeline_core::{Action, Actor, Marker, Trace};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantUmlOptions {
    /// Spaces per nesting level inside fragments.
    pub indent: usize,
    /// Emit `activate`/`deactivate` around every call.
    pub activation: bool,
    pub autonumber: bool,
    pub hide_footbox: bool,
    pub title: Option<String>,
}

impl Default for PlantUmlOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            activation: true,
            autonumber: false,
            hide_footbox: false,
            title: None,
        }
    }
}

impl PlantUmlOptions {
    pub fn from_config(config: &RenderConfig) -> Self {
        let defaults = Self::default();
        Self {
            indent: config
                .get_u64("plantuml.indent")
                .map(|n| n as usize)
                .unwrap_or(defaults.indent),
            activation: config
                .get_bool("plantuml.activation")
                .unwrap_or(defaults.activation),
            autonumber: config
                .get_bool("plantuml.autonumber")
                .unwrap_or(defaults.autonumber),
            hide_footbox: config
                .get_bool("plantuml.hideFootbox")
                .unwrap_or(defaults.hide_footbox),
            title: config
                .get_str("title")
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string),
        }
    }
}

fn participant_decl(actor: &Actor) -> String {
    match actor.class() {
        Some(_) => format!("participant \"{}\" as {}", actor.label(), actor.name()),
        None => format!("participant {}", actor.name()),
    }
}

struct Writer {
    out: String,
    unit: String,
    depth: usize,
}

impl Writer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn outdented_line(&mut self, text: &str) {
        let depth = self.depth;
        self.depth = depth.saturating_sub(1);
        self.line(text);
        self.depth = depth;
    }

    fn note(&mut self, over: &[Actor], text: &str) {
        let names = over.iter().map(Actor::name).collect::<Vec<_>>().join(", ");
        if text.contains('\n') {
            self.line(&format!("note over {names}"));
            for l in text.lines() {
                self.line(l);
            }
            self.line("end note");
        } else {
            self.line(&format!("note over {names} : {text}"));
        }
    }
}

/// Open scope while walking the trace; calls and fragments share one stack so they must nest.
enum Open<'a> {
    Call {
        caller: &'a str,
        callee: &'a str,
    },
    Fragment {
        begin: usize,
        op_name: &'a str,
        target: Option<&'a str>,
        indents: bool,
    },
}

impl Open<'_> {
    fn describe(&self) -> String {
        match self {
            Open::Call { caller, callee } => format!("call {caller} -> {callee}"),
            Open::Fragment { op_name, .. } => format!("fragment `{op_name}`"),
        }
    }
}

pub fn render_plantuml(trace: &Trace, options: &PlantUmlOptions) -> Result<String> {
    let actions = trace.actions();

    let mut created: FxHashSet<&str> = FxHashSet::default();
    for action in actions {
        if let Action::FragmentBegin {
            op_name,
            condition: Some(name),
        } = action
        {
            if op_name == OP_CREATE {
                created.insert(name.as_str());
            }
        }
    }

    let mut markers: Vec<&Marker> = trace.markers().iter().collect();
    markers.sort_by_key(|m| m.at());
    let mut first_branch: FxHashMap<usize, &str> = FxHashMap::default();
    for marker in trace.markers() {
        if let Marker::Branch {
            fragment, label, ..
        } = marker
        {
            first_branch.entry(*fragment).or_insert(label.as_str());
        }
    }

    let mut w = Writer {
        out: String::from("@startuml\n"),
        unit: " ".repeat(options.indent),
        depth: 0,
    };

    let mut preamble = false;
    if let Some(title) = options.title.as_deref() {
        w.line(&format!("title {title}"));
        preamble = true;
    }
    if options.autonumber {
        w.line("autonumber");
        preamble = true;
    }
    if options.hide_footbox {
        w.line("hide footbox");
        preamble = true;
    }
    for actor in trace.actors() {
        if !created.contains(actor.name()) {
            w.line(&participant_decl(actor));
            preamble = true;
        }
    }
    if preamble {
        w.out.push('\n');
    }

    let mut open: Vec<Open<'_>> = Vec::new();
    let mut pending = markers.into_iter().peekable();

    for index in 0..=actions.len() {
        while let Some(marker) = pending.next_if(|m| m.at() <= index) {
            match marker {
                Marker::Note { over, text, .. } => w.note(over, text),
                Marker::Branch {
                    fragment, label, ..
                } => {
                    let begin = match open.last() {
                        Some(Open::Fragment { begin, .. }) => *begin,
                        Some(top) => {
                            return Err(Error::InvalidTrace {
                                index,
                                message: format!(
                                    "branch `{label}` inside {} instead of a fragment",
                                    top.describe()
                                ),
                            });
                        }
                        None => {
                            return Err(Error::InvalidTrace {
                                index,
                                message: format!("branch `{label}` outside of any fragment"),
                            });
                        }
                    };
                    if begin != *fragment {
                        return Err(Error::InvalidTrace {
                            index,
                            message: format!(
                                "branch `{label}` does not belong to the innermost fragment"
                            ),
                        });
                    }
                    let used_as_header = first_branch.get(fragment) == Some(&label.as_str())
                        && matches!(
                            &actions[begin],
                            Action::FragmentBegin { condition: None, .. }
                        )
                        && first_branch_pending(&mut first_branch, *fragment);
                    if !used_as_header {
                        w.outdented_line(&format!("else {label}"));
                    }
                }
            }
        }

        let Some(action) = actions.get(index) else {
            break;
        };
        match action {
            Action::Call {
                caller,
                callee,
                method,
                params,
            } => {
                w.line(&format!("{caller} -> {callee} : {method}({params})"));
                if options.activation {
                    w.line(&format!("activate {callee}"));
                }
                open.push(Open::Call {
                    caller: caller.name(),
                    callee: callee.name(),
                });
            }
            Action::Return { .. } | Action::ImplicitReturn => {
                let (caller, callee) = match open.pop() {
                    Some(Open::Call { caller, callee }) => (caller, callee),
                    Some(top) => {
                        return Err(Error::InvalidTrace {
                            index,
                            message: format!("return while {} is open", top.describe()),
                        });
                    }
                    None => {
                        return Err(Error::InvalidTrace {
                            index,
                            message: "return without an open call".to_string(),
                        });
                    }
                };
                match action {
                    Action::Return { params } if !params.is_empty() => {
                        w.line(&format!("{callee} --> {caller} : {params}"));
                    }
                    _ => w.line(&format!("{callee} --> {caller}")),
                }
                if options.activation {
                    w.line(&format!("deactivate {callee}"));
                }
            }
            Action::FragmentBegin { op_name, condition } => {
                let target = condition.as_deref();
                let indents = op_name != OP_CREATE && op_name != OP_DESTROY;
                if op_name == OP_CREATE {
                    let actor = target
                        .and_then(|name| trace.actors().iter().find(|a| a.name() == name))
                        .ok_or_else(|| Error::InvalidTrace {
                            index,
                            message: "`create` names no declared actor".to_string(),
                        })?;
                    w.line(&format!("create {}", participant_decl(actor)));
                } else if indents {
                    let header = target.or_else(|| first_branch.get(&index).copied());
                    match header.filter(|h| !h.is_empty()) {
                        Some(h) => w.line(&format!("{op_name} {h}")),
                        None => w.line(op_name),
                    }
                    w.depth += 1;
                }
                open.push(Open::Fragment {
                    begin: index,
                    op_name,
                    target,
                    indents,
                });
            }
            Action::FragmentEnd { op_name } => {
                let (open_op, target, indents) = match open.pop() {
                    Some(Open::Fragment {
                        op_name,
                        target,
                        indents,
                        ..
                    }) => (op_name, target, indents),
                    Some(top) => {
                        return Err(Error::InvalidTrace {
                            index,
                            message: format!("`{op_name}` end while {} is open", top.describe()),
                        });
                    }
                    None => {
                        return Err(Error::InvalidTrace {
                            index,
                            message: format!("`{op_name}` end without a matching begin"),
                        });
                    }
                };
                if open_op != op_name.as_str() {
                    return Err(Error::InvalidTrace {
                        index,
                        message: format!("`{op_name}` end closes open fragment `{open_op}`"),
                    });
                }
                if indents {
                    w.depth -= 1;
                    w.line("end");
                } else if open_op == OP_DESTROY {
                    if let Some(name) = target {
                        w.line(&format!("destroy {name}"));
                    }
                }
            }
        }
    }

    if let Some(marker) = pending.next() {
        return Err(Error::InvalidTrace {
            index: marker.at(),
            message: format!(
                "marker anchored past the last action ({} actions)",
                actions.len()
            ),
        });
    }
    if let Some(top) = open.last() {
        return Err(Error::InvalidTrace {
            index: actions.len(),
            message: format!("{} is never closed", top.describe()),
        });
    }

    w.out.push_str("@enduml\n");
    tracing::debug!(
        actions = actions.len(),
        bytes = w.out.len(),
        "rendered plantuml"
    );
    Ok(w.out)
}

/// Consumes the "first branch" slot of `fragment` so later branches with the same label still
/// render as `else`.
fn first_branch_pending(first_branch: &mut FxHashMap<usize, &str>, fragment: usize) -> bool {
    first_branch.remove(&fragment).is_some()
}
