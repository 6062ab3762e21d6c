use clap::Parser;
use std::path::PathBuf;

const EXIT_OK: i32 = 0;
const EXIT_COMPILE_ERROR: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 2;
const EXIT_SYSTEM_ERROR: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum DiagnosticFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitStage {
    Dot,
    Schematic,
    Ast,
    Png,
}

#[derive(Parser, Debug)]
#[command(
    name = "hdlschem",
    version,
    about = "Derives and renders the gate-level schematic of a Verilog module"
)]
struct Cli {
    /// Name of the module to trace, rooted at its primary inputs
    module: String,

    /// Source file (repeatable; overrides --manifest when given)
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Manifest file listing one source path per line
    #[arg(long, default_value = "files.txt")]
    manifest: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Dot)]
    emit: EmitStage,

    /// Output file path (default: stdout for text stages, schematic.png for png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Graphviz `dot` command used for --emit png
    #[arg(long, default_value = "dot")]
    dot_cmd: String,

    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Human)]
    diagnostic_format: DiagnosticFormat,

    /// Print traversal phases and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("hdlschem: module = {}", cli.module);
        eprintln!("hdlschem: emit   = {:?}", cli.emit);
    }

    let paths = if !cli.include.is_empty() {
        cli.include.clone()
    } else {
        match hdlschem::manifest::load(&cli.manifest) {
            Ok(paths) => paths,
            Err(e) => fail(&e, cli.diagnostic_format),
        }
    };

    if cli.verbose {
        for path in &paths {
            eprintln!("hdlschem: source = {}", path.display());
        }
    }

    let corpus = match hdlschem::manifest::load_corpus(&paths) {
        Ok(c) => c,
        Err(e) => fail(&e, cli.diagnostic_format),
    };

    if matches!(cli.emit, EmitStage::Ast) {
        let slice = match hdlschem::slice::module_slice(&corpus, &cli.module) {
            Ok(s) => s,
            Err(e) => fail(&e, cli.diagnostic_format),
        };
        emit_output(&cli.output, &slice.join("\n"));
        std::process::exit(EXIT_OK);
    }

    let schematic = match hdlschem::traversal::build_schematic(&corpus, &cli.module) {
        Ok(s) => s,
        Err(e) => fail(&e, cli.diagnostic_format),
    };

    if cli.verbose {
        eprintln!(
            "hdlschem: traced {} nodes from {} primary input(s)",
            schematic.nodes().len(),
            schematic.inputs.len()
        );
    }

    match cli.emit {
        EmitStage::Ast => unreachable!(),
        EmitStage::Schematic => {
            emit_output(&cli.output, &schematic.to_string());
            std::process::exit(EXIT_OK);
        }
        EmitStage::Dot => {
            let dot = hdlschem::dot::emit_dot(&schematic);
            emit_output(&cli.output, &dot);
            std::process::exit(EXIT_OK);
        }
        EmitStage::Png => {
            let dot = hdlschem::dot::emit_dot(&schematic);
            let out_path = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("schematic.png"));

            let tmp_dir = std::env::temp_dir();
            let tmp_dot = tmp_dir.join(format!("hdlschem_{}.dot", std::process::id()));
            if let Err(e) = std::fs::write(&tmp_dot, &dot) {
                eprintln!(
                    "error: failed to write temp file {}: {}",
                    tmp_dot.display(),
                    e
                );
                std::process::exit(EXIT_SYSTEM_ERROR);
            }

            let mut cmd = std::process::Command::new(&cli.dot_cmd);
            cmd.arg("-Tpng").arg("-o").arg(&out_path).arg(&tmp_dot);

            if cli.verbose {
                eprintln!("hdlschem: running {:?}", cmd);
            }

            let status = match cmd.status() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: failed to run '{}': {}", cli.dot_cmd, e);
                    let _ = std::fs::remove_file(&tmp_dot);
                    std::process::exit(EXIT_SYSTEM_ERROR);
                }
            };

            let _ = std::fs::remove_file(&tmp_dot);

            if !status.success() {
                eprintln!("error: dot rendering failed");
                std::process::exit(EXIT_SYSTEM_ERROR);
            }

            if cli.verbose {
                eprintln!("hdlschem: wrote {}", out_path.display());
            }
            std::process::exit(EXIT_OK);
        }
    }
}

fn fail(err: &hdlschem::diag::HdlError, format: DiagnosticFormat) -> ! {
    let diagnostic = err.diagnostic();
    match format {
        DiagnosticFormat::Json => {
            eprintln!("{}", serde_json::to_string(&diagnostic.to_json()).unwrap());
        }
        DiagnosticFormat::Human => {
            eprintln!("{diagnostic}");
        }
    }
    let code = match err {
        hdlschem::diag::HdlError::Configuration { .. } => EXIT_USAGE_ERROR,
        hdlschem::diag::HdlError::Structural { .. } | hdlschem::diag::HdlError::Parse { .. } => {
            EXIT_COMPILE_ERROR
        }
    };
    std::process::exit(code);
}

/// Write content to the specified output path, or stdout if None / "-".
fn emit_output(output: &Option<PathBuf>, content: &str) {
    match output {
        Some(path) if path != std::path::Path::new("-") => {
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("error: failed to write {}: {}", path.display(), e);
                std::process::exit(EXIT_SYSTEM_ERROR);
            }
        }
        _ => {
            println!("{content}");
        }
    }
}
