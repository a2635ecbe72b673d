//! Entrypoint for CLI
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use jackc::{
    constants::{JACK_EXT, VM_EXT},
    lex,
    prelude::*,
};
use log::{debug, error, info, LevelFilter};

static EXAMPLES: &str = r#"
examples:
    jackc compile Main.jack
    jackc compile projects/Pong --deferred-ops
    jackc tokens Square.jack --stdout
"#;

/// Compiler for the Jack language, targeting the stack VM.
#[derive(Debug, Parser)]
#[command(name = "jackc", version, after_help = EXAMPLES)]
struct Cli {
    /// Log progress at debug level, unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Compile a .jack file, or every .jack file in a directory, to .vm
    Compile {
        path: PathBuf,
        /// Hold back all operators of an expression and apply them last to first.
        #[arg(long)]
        deferred_ops: bool,
        /// Print the VM code instead of writing .vm files.
        #[arg(long)]
        stdout: bool,
    },
    /// Write the token listing of each source file as XML
    Tokens {
        path: PathBuf,
        /// Print the listing instead of writing T.xml files.
        #[arg(long)]
        stdout: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new().with_level(level).env().init()?;

    match cli.cmd {
        Cmd::Compile {
            path,
            deferred_ops,
            stdout,
        } => {
            let conf = CompilerConf {
                operator_order: if deferred_ops {
                    OperatorOrder::Deferred
                } else {
                    OperatorOrder::LeftToRight
                },
            };
            for_each_source(&path, |file| compile_file(file, conf.clone(), stdout))
        }
        Cmd::Tokens { path, stdout } => for_each_source(&path, |file| dump_tokens(file, stdout)),
    }
}

/// Run the action on every source file, continuing past failures.
fn for_each_source(path: &Path, mut action: impl FnMut(&Path) -> anyhow::Result<()>) -> anyhow::Result<()> {
    let files = source_files(path)?;
    let mut failed = 0;

    for file in &files {
        if let Err(err) = action(file) {
            error!("{}: {:#}", file.display(), err);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} source files failed", files.len());
    }

    Ok(())
}

/// A single `.jack` file, or the `.jack` files directly inside a directory.
fn source_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        if !is_jack_file(path) {
            bail!("{} is not a .{JACK_EXT} file", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let mut files = vec![];
        for entry in fs::read_dir(path).with_context(|| format!("reading {}", path.display()))? {
            let file = entry?.path();
            if file.is_file() && is_jack_file(&file) {
                files.push(file);
            }
        }
        files.sort();

        if files.is_empty() {
            bail!("no .{JACK_EXT} files in {}", path.display());
        }
        return Ok(files);
    }

    bail!("invalid path {}", path.display())
}

fn is_jack_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == JACK_EXT).unwrap_or(false)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(strip_comments(&text))
}

fn compile_file(path: &Path, conf: CompilerConf, stdout: bool) -> anyhow::Result<()> {
    debug!("compiling {}", path.display());
    let source_code = read_source(path)?;

    if stdout {
        let mut writer = VmWriter::new(io::stdout().lock());
        compile_into(&source_code, conf, &mut writer)?;
        return Ok(writer.flush()?);
    }

    // Buffered so a failed class leaves no partial output behind.
    let start = Instant::now();
    let instructions = compile_str(&source_code, conf)?;
    let elapsed = start.elapsed();

    let out_path = path.with_extension(VM_EXT);
    let file = fs::File::create(&out_path).with_context(|| format!("creating {}", out_path.display()))?;
    let mut writer = VmWriter::new(BufWriter::new(file));
    for instr in instructions {
        writer.write(instr)?;
    }
    writer.flush()?;

    info!(
        "{} -> {} ({} instructions, {:.3}ms)",
        path.display(),
        out_path.display(),
        writer.count(),
        elapsed.as_secs_f64() * 1000.0
    );

    Ok(())
}

fn dump_tokens(path: &Path, stdout: bool) -> anyhow::Result<()> {
    let source_code = read_source(path)?;
    let tokens = lex::tokenize(&source_code)?;

    if stdout {
        let mut out = io::stdout().lock();
        lex::write_tokens_xml(&mut out, &tokens)?;
        return Ok(out.flush()?);
    }

    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
    let out_path = path.with_file_name(format!("{stem}T.xml"));
    let mut out = BufWriter::new(fs::File::create(&out_path)?);
    lex::write_tokens_xml(&mut out, &tokens)?;
    out.flush()?;

    info!("{} -> {} ({} tokens)", path.display(), out_path.display(), tokens.len());

    Ok(())
}
