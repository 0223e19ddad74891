use crate::*;

#[test]
fn opt_with_single_call_and_no_return() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let bar = c.object("bar", None)?;
        let _foo = foo.enter()?;
        let _opt = c.opt()?;
        bar.invoke("func", Params::new())?;
        Ok(())
    })
    .unwrap();

    let foo = &trace.actors()[0];
    let bar = &trace.actors()[1];
    assert_eq!(
        trace,
        vec![
            Action::fragment_begin("opt", None),
            Action::call(foo, bar, "func", Params::new()),
            Action::ImplicitReturn,
            Action::fragment_end("opt"),
        ]
    );
}

#[test]
fn nested_alt_choices_close_inner_before_outer() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let bar = c.object("bar", None)?;
        let baz = c.object("baz", None)?;
        let _foo = foo.enter()?;

        let _alt = c.alt()?;
        {
            let _a = c.choice("a")?;
            baz.invoke("func", Params::new())?;
            let _inner = c.alt()?;
            {
                let _a = c.choice("a")?;
                baz.invoke("func", Params::new())?;
            }
            {
                let _b = c.choice("b")?;
                bar.invoke("func", Params::new())?;
            }
        }
        {
            let _b = c.choice("b")?;
            bar.invoke("func", Params::new())?;
        }
        Ok(())
    })
    .unwrap();

    let (foo, bar, baz) = (&trace.actors()[0], &trace.actors()[1], &trace.actors()[2]);
    assert_eq!(
        trace,
        vec![
            Action::fragment_begin("alt", None),
            Action::call(foo, baz, "func", Params::new()),
            Action::ImplicitReturn,
            Action::fragment_begin("alt", None),
            Action::call(foo, baz, "func", Params::new()),
            Action::ImplicitReturn,
            Action::call(foo, bar, "func", Params::new()),
            Action::ImplicitReturn,
            Action::fragment_end("alt"),
            Action::call(foo, bar, "func", Params::new()),
            Action::ImplicitReturn,
            Action::fragment_end("alt"),
        ]
    );

    let branches: Vec<(usize, usize, &str)> = trace
        .markers()
        .iter()
        .filter_map(|m| match m {
            Marker::Branch {
                at,
                fragment,
                label,
            } => Some((*at, *fragment, label.as_str())),
            Marker::Note { .. } => None,
        })
        .collect();
    assert_eq!(
        branches,
        vec![(1, 0, "a"), (4, 3, "a"), (6, 3, "b"), (9, 0, "b")]
    );
}

#[test]
fn nested_calls_originate_from_the_enclosing_callee() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", Some("Account"))?;
        let bar = c.object("bar", None)?;
        let baz = c.object("baz", None)?;
        let _foo = foo.enter()?;
        let call = bar.call("func", Params::new())?;
        baz.invoke("inner", Params::new())?;
        c.ret(params!("a"))?;
        call.close()
    })
    .unwrap();

    let (foo, bar, baz) = (&trace.actors()[0], &trace.actors()[1], &trace.actors()[2]);
    assert_eq!(
        trace.actions(),
        &[
            Action::call(foo, bar, "func", Params::new()),
            Action::call(bar, baz, "inner", Params::new()),
            Action::ImplicitReturn,
            Action::ret(params!("a")),
        ]
    );
    match &trace.actions()[1] {
        Action::Call { caller, callee, .. } => {
            assert_eq!(caller.name(), "bar");
            assert_eq!(callee.name(), "baz");
        }
        other => panic!("unexpected action: {other}"),
    }
}

#[test]
fn entering_an_object_inside_a_call_overrides_the_callee() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let bar = c.object("bar", None)?;
        let baz = c.object("baz", None)?;
        let _foo = foo.enter()?;
        let _call = bar.call("func", Params::new())?;
        let _baz = baz.enter()?;
        foo.invoke("callback", Params::new())?;
        Ok(())
    })
    .unwrap();

    match &trace.actions()[1] {
        Action::Call { caller, callee, .. } => {
            assert_eq!(caller.name(), "baz");
            assert_eq!(callee.name(), "foo");
        }
        other => panic!("unexpected action: {other}"),
    }
}

#[test]
fn call_guard_ret_records_return_and_closes() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let bar = c.object("bar", None)?;
        let _foo = foo.enter()?;
        let _loop = c.loop_()?;
        bar.call("func", Params::new())?.ret(params!("value"))
    })
    .unwrap();

    assert_eq!(trace.len(), 4);
    assert_eq!(trace.actions()[2], Action::ret(params!("value")));
    assert_eq!(trace.actions()[3], Action::fragment_end("loop"));
}

#[test]
fn second_return_fails_without_touching_the_trace() {
    let diagram = Diagram::new();
    let foo = diagram.object("foo", None).unwrap();
    let bar = diagram.object("bar", None).unwrap();
    let _foo = foo.enter().unwrap();
    let call = bar.call("func", Params::new()).unwrap();
    diagram.ret(params!("a")).unwrap();

    let err = diagram.ret(params!("b")).unwrap_err();
    assert!(matches!(err, Error::DuplicateReturn { .. }), "{err}");
    call.close().unwrap();
    drop(_foo);

    let trace = diagram.finish().unwrap();
    assert_eq!(trace.len(), 2);
}

#[test]
fn call_without_current_object_fails() {
    let err = Diagram::build(|c| {
        let bar = c.object("bar", None)?;
        bar.invoke("func", Params::new())
    })
    .unwrap_err();
    assert_eq!(
        err,
        Error::NoCurrentObject {
            operation: "func".to_string()
        }
    );
}

#[test]
fn early_exit_still_closes_scopes() {
    let diagram = Diagram::new();
    let result = (|| -> Result<()> {
        let foo = diagram.object("foo", None)?;
        let bar = diagram.object("bar", None)?;
        let _foo = foo.enter()?;
        let _opt = diagram.opt()?;
        let _call = bar.call("func", Params::new())?;
        diagram.ret(Params::new())?;
        diagram.ret(Params::new())?;
        Ok(())
    })();
    assert!(matches!(result, Err(Error::DuplicateReturn { .. })));
    assert_eq!(diagram.depth(), 0);

    let trace = diagram.finish().unwrap();
    assert_eq!(trace.len(), 4);
    assert_eq!(trace.actions()[3], Action::fragment_end("opt"));
}

#[test]
fn out_of_order_drop_is_reported_by_finish() {
    let diagram = Diagram::new();
    {
        let outer = diagram.opt().unwrap();
        let inner = diagram.loop_().unwrap();
        drop(outer);
        drop(inner);
    }
    assert!(matches!(
        diagram.opt(),
        Err(Error::UnbalancedScope { .. })
    ));
    assert!(matches!(
        diagram.finish(),
        Err(Error::UnbalancedScope { .. })
    ));
}

#[test]
fn create_and_destroy_bracket_lifecycle() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let _foo = foo.enter()?;
        let (xxx, create) = c.create("xxx", Some("Worker"))?;
        create.close()?;
        let _destroy = c.destroy(&xxx)?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        trace,
        vec![
            Action::fragment_begin("create", Some("xxx")),
            Action::fragment_end("create"),
            Action::fragment_begin("destroy", Some("xxx")),
            Action::fragment_end("destroy"),
        ]
    );
    assert_eq!(trace.actors()[1].label(), "xxx:Worker");
}

#[test]
fn notes_attach_to_objects_and_current_context() {
    let trace = Diagram::build(|c| {
        let foo = c.object("foo", None)?;
        let bar = c.object("bar", None)?;
        foo.note("over foo")?;
        let _foo = foo.enter()?;
        let _call = bar.call("func", Params::new())?;
        c.note("over bar")?;
        c.note_over(&[&foo, &bar], "across")?;
        Ok(())
    })
    .unwrap();

    let notes: Vec<(usize, Vec<&str>, &str)> = trace
        .markers()
        .iter()
        .filter_map(|m| match m {
            Marker::Note { at, over, text } => Some((
                *at,
                over.iter().map(Actor::name).collect(),
                text.as_str(),
            )),
            Marker::Branch { .. } => None,
        })
        .collect();
    assert_eq!(
        notes,
        vec![
            (0, vec!["foo"], "over foo"),
            (1, vec!["bar"], "over bar"),
            (1, vec!["foo", "bar"], "across"),
        ]
    );
}

#[test]
fn finishing_while_an_object_is_entered_fails() {
    let diagram = Diagram::new();
    let foo = diagram.object("foo", None).unwrap();
    let guard = foo.enter().unwrap();
    std::mem::forget(guard);
    assert!(matches!(
        diagram.finish(),
        Err(Error::UnbalancedScope { .. })
    ));
}

#[test]
fn sessions_are_independent() {
    let a = Diagram::new();
    let b = Diagram::new();
    let foo = a.object("foo", None).unwrap();
    let other = b.object("foo", None).unwrap();
    assert_ne!(foo.actor(), other.actor());

    let _foo = foo.enter().unwrap();
    let err = b.object_for(other.actor()).invoke("x", Params::new());
    assert!(matches!(err, Err(Error::NoCurrentObject { .. })));
    let err = a.object_for(other.actor()).invoke("x", Params::new());
    assert!(matches!(err, Err(Error::UnknownActor { .. })));
}

#[test]
fn ret_on_an_outer_call_records_nothing() {
    let diagram = Diagram::new();
    let foo = diagram.object("foo", None).unwrap();
    let bar = diagram.object("bar", None).unwrap();
    let baz = diagram.object("baz", None).unwrap();
    let _foo = foo.enter().unwrap();
    let outer = bar.call("outer", Params::new()).unwrap();
    let inner = baz.call("inner", Params::new()).unwrap();
    let before = diagram.action_count();

    let err = outer.ret(params!("x")).unwrap_err();
    assert!(matches!(err, Error::UnbalancedScope { .. }), "{err}");
    assert_eq!(diagram.action_count(), before);

    inner.close().unwrap();
    drop(_foo);
    assert!(matches!(
        diagram.finish(),
        Err(Error::UnbalancedScope { .. })
    ));
}

#[test]
fn enter_reports_an_error_deferred_by_a_dropped_guard() {
    let diagram = Diagram::new();
    let foo = diagram.object("foo", None).unwrap();
    {
        let outer = diagram.opt().unwrap();
        let inner = diagram.loop_().unwrap();
        drop(outer);
        drop(inner);
    }
    assert!(matches!(foo.enter(), Err(Error::UnbalancedScope { .. })));
}
