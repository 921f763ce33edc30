//! Work-group Kernel Compiler Driver
//! 
//! Runs the loop barrier and kernel header passes over a module stored as
//! JSON.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use wgc_ir::{Module, PassError};
use wgc_passes::{run_generate_header, run_loop_barriers, run_pipeline, PassOptions};

#[derive(Parser)]
#[command(name = "wgc")]
#[command(about = "Work-group Kernel Compiler passes")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log pass progress (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert barriers around loops that contain barriers
    LoopBarriers(PassArgs),

    /// Write the kernel description header and hoist automatic locals
    GenerateHeader(PassArgs),

    /// Loop barriers followed by the header generation
    Run(PassArgs),
}

#[derive(Args, Debug, Clone)]
struct PassArgs {
    /// Input module (JSON)
    input: PathBuf,

    /// Output module, defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Kernel description header, appended to
    #[arg(long)]
    header: Option<PathBuf>,

    /// Only process the kernel with this name
    #[arg(short, long)]
    kernel: Option<String>,

    /// Target pointer size in bytes
    #[arg(long, default_value_t = 8)]
    pointer_size: u64,

    /// Overwrite the header instead of appending to it
    #[arg(long)]
    truncate_header: bool,

    /// Print the transformed module listing to stderr
    #[arg(long)]
    print_ir: bool,
}

impl PassArgs {
    fn options(&self) -> PassOptions {
        PassOptions {
            kernel: self.kernel.clone(),
            header: self.header.clone(),
            pointer_size: self.pointer_size,
            truncate_header: self.truncate_header,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    LoopBarriers,
    GenerateHeader,
    Pipeline,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (pass, args) = match &cli.command {
        Commands::LoopBarriers(args) => (Pass::LoopBarriers, args),
        Commands::GenerateHeader(args) => (Pass::GenerateHeader, args),
        Commands::Run(args) => (Pass::Pipeline, args),
    };

    if let Err(e) = process_file(pass, args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn process_file(pass: Pass, args: &PassArgs) -> Result<bool, PassError> {
    let mut module = load_module(&args.input)?;
    info!("loaded module '{}' from {}", module.name, args.input.display());

    let changed = run_pass(pass, &mut module, &args.options())?;

    if args.print_ir {
        eprintln!("{}", module);
    }
    match &args.output {
        Some(path) => {
            save_module(&module, path)?;
            info!("module written to {} (changed: {})", path.display(), changed);
        }
        None => println!("{}", serde_json::to_string_pretty(&module)?),
    }
    Ok(changed)
}

fn run_pass(pass: Pass, module: &mut Module, options: &PassOptions) -> Result<bool, PassError> {
    match pass {
        Pass::LoopBarriers => run_loop_barriers(module, options),
        Pass::GenerateHeader => run_generate_header(module, options),
        Pass::Pipeline => run_pipeline(module, options),
    }
}

fn load_module(path: &Path) -> Result<Module, PassError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn save_module(module: &Module, path: &Path) -> Result<(), PassError> {
    let text = serde_json::to_string_pretty(module)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wgc_ir::{
        AddressSpace, Function, GlobalVariable, Instruction, IrType, MetadataNode, MetadataOperand,
        KERNELS_METADATA,
    };

    fn write_module(dir: &TempDir) -> PathBuf {
        let mut module = Module::new("m");
        module.add_global(GlobalVariable::new("k.scratch", IrType::array(IrType::I32, 8), AddressSpace::Local));
        let mut k = Function::new("k", IrType::Void);
        let entry = k.create_block("entry");
        k.block_mut(entry).add_instruction(Instruction::Return(None));
        let k = module.add_function(k);
        module
            .get_or_insert_named_metadata(KERNELS_METADATA)
            .add_operand(MetadataNode::new(vec![MetadataOperand::Function(k)]));

        let path = dir.path().join("m.json");
        save_module(&module, &path).unwrap();
        path
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "wgc", "-vv", "run", "m.json", "--header", "k.h", "--kernel", "k", "--pointer-size", "4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        let options = args.options();
        assert_eq!(options.kernel.as_deref(), Some("k"));
        assert_eq!(options.header, Some(PathBuf::from("k.h")));
        assert_eq!(options.pointer_size, 4);
        assert!(!options.truncate_header);
    }

    #[test]
    fn test_generate_header_rewrites_module_file() {
        let dir = TempDir::new().unwrap();
        let input = write_module(&dir);
        let output = dir.path().join("out.json");
        let header = dir.path().join("k.h");
        let args = PassArgs {
            input,
            output: Some(output.clone()),
            header: Some(header.clone()),
            kernel: None,
            pointer_size: 8,
            truncate_header: false,
            print_ir: false,
        };

        assert!(process_file(Pass::GenerateHeader, &args).unwrap());

        let module = load_module(&output).unwrap();
        let k = module.get_function("k").unwrap();
        assert_eq!(module.function(k).unwrap().parameters[0].name, "_local0");
        let text = fs::read_to_string(header).unwrap();
        assert!(text.ends_with("#define _k_LOCAL_SIZE {32}\n"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = PassArgs {
            input: dir.path().join("absent.json"),
            output: None,
            header: None,
            kernel: None,
            pointer_size: 8,
            truncate_header: false,
            print_ir: false,
        };
        assert!(matches!(process_file(Pass::LoopBarriers, &args), Err(PassError::Io(_))));
    }
}
