//! Workspace tasks for sqlhelpers.
//!
//! Run with `cargo xtask <command>`. Besides the usual checks, `table-types`
//! renders the `CREATE TYPE` script the single-column binders depend on, so
//! a database can be prepared with the same schema and nullability naming
//! the binder generates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlhelpers::Policy;
use sqlhelpers::schema::create_all_generic_table_types;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "Checks and schema scripts for sqlhelpers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Formatting, clippy, unit and end-to-end tests, then doctests
    Ci,
    /// Check formatting
    Fmt,
    /// Lint every crate and target with warnings denied
    Clippy,
    /// Run the test suites; the fake-server tests live in sqlhelpers-testing
    Test {
        /// Limit to one crate, e.g. `sqlhelpers-types`
        #[arg(long, short)]
        package: Option<String>,
    },
    /// Build API docs for the library crates
    Doc,
    /// Run the table binding benchmarks
    Bench,
    /// Render the generic table type script
    TableTypes {
        /// Policy options string, e.g. `TableTypeSchema=app`
        #[arg(long, default_value = "")]
        options: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Fail if `--out` differs from the rendered script
        #[arg(long, requires = "out")]
        check: bool,
    },
}

/// CI steps in the order they run.
const CI_STEPS: &[(&str, fn(&Shell) -> Result<()>)] = &[
    ("fmt", fmt),
    ("clippy", clippy),
    ("test", |sh| test(sh, None)),
    ("doctest", doctest),
];

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.command {
        Command::Ci => {
            for (name, step) in CI_STEPS {
                println!("== {name}");
                step(&sh).with_context(|| format!("ci step `{name}` failed"))?;
            }
            println!("ci passed");
        }
        Command::Fmt => fmt(&sh)?,
        Command::Clippy => clippy(&sh)?,
        Command::Test { package } => test(&sh, package.as_deref())?,
        Command::Doc => cmd!(sh, "cargo doc --no-deps -p sqlhelpers-types -p sqlhelpers").run()?,
        Command::Bench => cmd!(sh, "cargo bench -p sqlhelpers --bench binding").run()?,
        Command::TableTypes {
            options,
            out,
            check,
        } => table_types(&sh, &options, out.as_deref(), check)?,
    }

    Ok(())
}

/// Directory holding the workspace `Cargo.toml`.
fn workspace_root() -> Result<PathBuf> {
    let output = std::process::Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("cargo locate-project")?;
    let manifest = String::from_utf8(output.stdout).context("manifest path is not UTF-8")?;
    Path::new(manifest.trim())
        .parent()
        .map(Path::to_path_buf)
        .context("manifest path has no parent")
}

fn fmt(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>) -> Result<()> {
    match package {
        Some(package) => cmd!(sh, "cargo test -p {package} --all-targets").run()?,
        None => cmd!(sh, "cargo test --workspace --all-targets").run()?,
    }
    Ok(())
}

fn doctest(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo test --workspace --doc").run()?;
    Ok(())
}

fn table_types(sh: &Shell, options: &str, out: Option<&Path>, check: bool) -> Result<()> {
    let policy = Policy::from_options_string(options).context("invalid policy options")?;
    let script = create_all_generic_table_types(&policy)?;

    let Some(path) = out else {
        print!("{script}");
        return Ok(());
    };
    if check {
        let current = sh
            .read_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
        if current != script {
            bail!(
                "{} is stale; rerun `cargo xtask table-types --out {}`",
                path.display(),
                path.display()
            );
        }
        println!("{} is current", path.display());
    } else {
        sh.write_file(path, script)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
