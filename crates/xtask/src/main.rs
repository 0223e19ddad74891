mod cmd;

#[derive(Debug, thiserror::Error)]
enum XtaskError {
    #[error("usage: xtask <command> ...")]
    Usage,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot update failed:\n{0}")]
    SnapshotUpdateFailed(String),
    #[error("snapshot check failed:\n{0}")]
    SnapshotCheckFailed(String),
}

fn print_help(topic: Option<&str>) {
    if let Some(topic) = topic.filter(|t| !t.trim().is_empty()) {
        println!("usage: xtask {topic} [--filter <substring>]");
        println!();
        println!("See: `crates/xtask/src/main.rs` for the full argument grammar.");
        return;
    }

    println!("usage: xtask <command> ...");
    println!();
    println!("Commands:");
    println!("  update-snapshots   regenerate fixtures/**/*.puml goldens");
    println!("  check-snapshots    fail if any golden is stale");
    println!();
    println!("Topics:");
    println!("  xtask help <command>");
}

fn main() -> Result<(), XtaskError> {
    let mut args = std::env::args().skip(1);
    let Some(cmd_name) = args.next() else {
        return Err(XtaskError::Usage);
    };

    if matches!(cmd_name.as_str(), "--help" | "-h") {
        print_help(None);
        return Ok(());
    }
    if cmd_name == "help" {
        print_help(args.next().as_deref());
        return Ok(());
    }

    match cmd_name.as_str() {
        "update-snapshots" => cmd::update_snapshots(args.collect()),
        "check-snapshots" => cmd::check_snapshots(args.collect()),
        other => Err(XtaskError::UnknownCommand(other.to_string())),
    }
}
