//! CLI front-end driving the conversion core over files on disk. The HTTP
//! upload surface, chunked package assembly, and conversion-record
//! persistence a full add-on pipeline would sit this behind are out of
//! scope here; this binary only exercises the core.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use litho2bedrock::translate::{load_java_to_bedrock_table, load_legacy_map, TranslationEntry};

#[derive(Parser)]
#[command(name = "litho2bedrock", about = "Convert a Java-edition schematic into a Bedrock command stream")]
struct Args {
    /// Input schematic file (.schem, .litematic, or a classic-format blob).
    input: PathBuf,

    /// Output path for the generated command stream. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the java-to-bedrock translation table (JSON).
    #[arg(long, default_value = "tables/java-to-bedrock.json")]
    translation_table: PathBuf,

    /// Path to the legacy "id:data" -> Java descriptor map (JSON).
    #[arg(long, default_value = "tables/legacy-map.json")]
    legacy_map: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Args) -> litho2bedrock::Result<()> {
    let bytes = std::fs::read(&args.input)?;

    let java_to_bedrock: HashMap<String, TranslationEntry> =
        match load_java_to_bedrock_table(&args.translation_table) {
            Ok(table) => table,
            Err(e) => {
                log::warn!(
                    "no translation table at {}: {e} (unmapped blocks pass through as-is)",
                    args.translation_table.display()
                );
                HashMap::new()
            }
        };
    let legacy_map = match load_legacy_map(&args.legacy_map) {
        Ok(map) => map,
        Err(e) => {
            log::warn!(
                "no legacy map at {}: {e} (classic-dialect blocks will not resolve)",
                args.legacy_map.display()
            );
            HashMap::new()
        }
    };

    let commands = litho2bedrock::convert(&bytes, &java_to_bedrock, &legacy_map)?;

    match args.output {
        Some(path) => std::fs::write(path, commands)?,
        None => print!("{commands}"),
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("conversion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
