use anyhow::{Context, Result};
use clap::Parser;
use neurodsl::Description;

/// compiles a network description (.toml) into scope-resolved, indexed equations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input filename
    input: String,

    /// Output filename, defaults to stdout
    #[arg(short, long)]
    out: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Args::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input))?;
    let description: Description = text
        .parse()
        .with_context(|| format!("failed to load {}", cli.input))?;
    let network = description.to_network()?;
    let compiled = network
        .compile_with(&description.vocabulary)
        .with_context(|| format!("failed to compile {}", cli.input))?;

    match cli.out.as_deref() {
        Some(out) => std::fs::write(out, compiled.to_string())
            .with_context(|| format!("failed to write {out}"))?,
        None => print!("{compiled}"),
    }
    Ok(())
}
