use crate::XtaskError;
use lifeline::demo::account_walkthrough;
use lifeline::render::{RenderConfig, generate_plantuml_with_config, render_trace_json};
use std::fs;
use std::path::{Path, PathBuf};

struct Golden {
    source: String,
    path: PathBuf,
    rendered: String,
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn parse_filter(args: &[String]) -> Result<Option<String>, XtaskError> {
    let mut filter = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--filter" => {
                i += 1;
                filter = Some(args.get(i).ok_or(XtaskError::Usage)?.to_string());
            }
            _ => return Err(XtaskError::Usage),
        }
        i += 1;
    }
    Ok(filter)
}

fn trace_fixtures(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.to_string_lossy().ends_with(".trace.json") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Renders every golden the test suites compare against, collecting failures instead of
/// stopping at the first one.
fn render_goldens(filter: Option<&str>) -> Result<Vec<Golden>, XtaskError> {
    let root = workspace_root().join("fixtures");
    let config = RenderConfig::default();
    let mut goldens = Vec::new();
    let mut failures = Vec::new();

    for trace_path in trace_fixtures(&root.join("traces")) {
        let file_name = trace_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if filter.is_some_and(|f| !file_name.contains(f)) {
            continue;
        }
        let text = fs::read_to_string(&trace_path).map_err(|source| XtaskError::ReadFile {
            path: trace_path.display().to_string(),
            source,
        })?;
        match render_trace_json(&text, &config) {
            Ok(rendered) => goldens.push(Golden {
                source: trace_path.display().to_string(),
                path: trace_path.with_file_name(file_name.replace(".trace.json", ".puml")),
                rendered,
            }),
            Err(err) => failures.push(format!("render failed for {}: {err}", trace_path.display())),
        }
    }

    if filter.is_none_or(|f| "demo".contains(f)) {
        match generate_plantuml_with_config(account_walkthrough, &config) {
            Ok(rendered) => goldens.push(Golden {
                source: "account walkthrough".to_string(),
                path: root.join("demo.puml"),
                rendered,
            }),
            Err(err) => failures.push(format!("account walkthrough failed: {err}")),
        }
    }

    if !failures.is_empty() {
        return Err(XtaskError::SnapshotUpdateFailed(failures.join("\n")));
    }
    if goldens.is_empty() {
        return Err(XtaskError::SnapshotUpdateFailed(format!(
            "no fixtures matched under {}",
            root.display()
        )));
    }
    Ok(goldens)
}

pub(crate) fn update_snapshots(args: Vec<String>) -> Result<(), XtaskError> {
    let filter = parse_filter(&args)?;
    let goldens = render_goldens(filter.as_deref())?;

    for golden in &goldens {
        fs::write(&golden.path, &golden.rendered).map_err(|source| XtaskError::WriteFile {
            path: golden.path.display().to_string(),
            source,
        })?;
        println!("wrote {} ({})", golden.path.display(), golden.source);
    }
    Ok(())
}

pub(crate) fn check_snapshots(args: Vec<String>) -> Result<(), XtaskError> {
    let filter = parse_filter(&args)?;
    let goldens = render_goldens(filter.as_deref())?;

    let mut stale = Vec::new();
    for golden in &goldens {
        match fs::read_to_string(&golden.path) {
            Ok(existing) if existing == golden.rendered => {}
            Ok(_) => stale.push(format!("stale: {} ({})", golden.path.display(), golden.source)),
            Err(_) => stale.push(format!("missing: {}", golden.path.display())),
        }
    }

    if !stale.is_empty() {
        stale.push("run `cargo run -p xtask -- update-snapshots`".to_string());
        return Err(XtaskError::SnapshotCheckFailed(stale.join("\n")));
    }
    println!("{} goldens up to date", goldens.len());
    Ok(())
}
