use lifeline::demo::account_walkthrough;
use lifeline::Trace;
use lifeline::render::{
    HeadlessError, PlantUmlOptions, RenderConfig, generate_plantuml, render_plantuml,
};
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Build(lifeline::Error),
    Render(lifeline_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Build(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<lifeline::Error> for CliError {
    fn from(value: lifeline::Error) -> Self {
        Self::Build(value)
    }
}

impl From<lifeline_render::Error> for CliError {
    fn from(value: lifeline_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        match value {
            HeadlessError::Build(err) => Self::Build(err),
            HeadlessError::Render(err) => Self::Render(err),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Render,
    Demo,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    title: Option<String>,
    out: Option<String>,
    trace: bool,
    pretty: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "lifeline-cli\n\
\n\
USAGE:\n\
  lifeline-cli [render] [--config <path>] [--title <text>] [--out <path>] [--verbose] [<trace.json>|-]\n\
  lifeline-cli demo [--trace] [--pretty] [--config <path>] [--title <text>] [--out <path>] [--verbose]\n\
\n\
NOTES:\n\
  - If <trace.json> is omitted or '-', the trace is read from stdin.\n\
  - --config points to a JSON file merged over the default render config.\n\
  - demo --trace prints the walkthrough trace as JSON instead of PlantUML.\n\
  - Output goes to stdout unless --out is given.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "demo" => args.command = Command::Demo,
            "--trace" => args.trace = true,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--title" => {
                let Some(title) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.title = Some(title.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.command == Command::Demo && args.input.is_some() {
        return Err(CliError::Usage(usage()));
    }
    if args.command == Command::Render && (args.trace || args.pretty) {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<RenderConfig, CliError> {
    let mut config = RenderConfig::default();
    if let Some(path) = args.config.as_deref() {
        let text = std::fs::read_to_string(path)?;
        let overrides: serde_json::Value = serde_json::from_str(&text)?;
        config.deep_merge(&overrides);
    }
    if let Some(title) = args.title.as_deref() {
        config.set_value("title", serde_json::json!(title));
    }
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let options = PlantUmlOptions::from_config(&config);

    match args.command {
        Command::Render => {
            let text = read_input(args.input.as_deref())?;
            let trace = Trace::from_json(&text)?;
            tracing::debug!(
                actors = trace.actors().len(),
                actions = trace.len(),
                "loaded trace"
            );
            let puml = render_plantuml(&trace, &options)?;
            write_text(&puml, args.out.as_deref())
        }
        Command::Demo if args.trace => {
            let trace = lifeline::Diagram::build(account_walkthrough)?;
            let mut json = trace.to_json(args.pretty)?;
            json.push('\n');
            write_text(&json, args.out.as_deref())
        }
        Command::Demo => {
            let puml = generate_plantuml(account_walkthrough, &options)?;
            write_text(&puml, args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
