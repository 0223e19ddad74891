//! The account walkthrough shipped with the CLI (`lifeline-cli demo`).

use lifeline_core::{Diagram, Result, params};

/// Exercises every construct: notes, nested calls, explicit and implicit returns, `opt`, `loop`,
/// nested `alt`/`choice`, and an object's creation and destruction.
pub fn account_walkthrough(c: &Diagram) -> Result<()> {
    let foo = c.object("foo", Some("Account"))?;
    let bar = c.object("bar", Some("Account"))?;
    let baz = c.object("baz", None)?;

    foo.note("note over object")?;
    bar.note("note over object2")?;

    let _foo = foo.enter()?;
    {
        let _opt = c.opt()?;
        bar.invoke("func", params!())?;
        let call = bar.call("func", params!())?;
        c.note("context specific note\nexample")?;
        baz.invoke("func", params!())?;
        c.ret(params!("a"))?;
        call.close()?;
    }

    let (xxx, create) = c.create("xxx", None)?;
    c.note("context specific note\nexample2")?;
    xxx.invoke("start", params!())?;
    create.close()?;

    {
        let _destroy = c.destroy(&xxx)?;
        let _end = bar.call("end", params!())?;
        foo.invoke("end", params!())?;
    }

    {
        let _loop = c.loop_()?;
        bar.call("func", params!())?.ret(params!("value"))?;
    }

    let _alt = c.alt()?;
    {
        let _a = c.choice("a")?;
        baz.invoke("func", params!())?;
        let _inner = c.alt()?;
        {
            let _a = c.choice("a")?;
            baz.invoke("func", params!())?;
        }
        {
            let _b = c.choice("b")?;
            bar.invoke("func", params!())?;
        }
    }
    {
        let _b = c.choice("b")?;
        bar.invoke("func", params!())?;
    }
    Ok(())
}
