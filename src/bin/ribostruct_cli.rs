use anyhow::{anyhow, bail, Context, Result};
use log::LevelFilter;
use ribostruct::{
    about,
    config::OverlayParameters,
    engine::{Engine, Operation, OverlayEngine, OverlayRequest},
    export::ExportKind,
    rna_sequence::RnaSequence,
    scan::{scan_binding_sites, scan_motifs},
};
use ribostruct_protocol::{BindingSite, MotifEntity};
use serde::Serialize;
use std::{env, fs};

#[derive(Serialize)]
struct ScanSummary {
    name: Option<String>,
    length: usize,
    motifs: Vec<MotifEntity>,
    binding_sites: Vec<BindingSite>,
}

impl ScanSummary {
    fn of(sequence: &RnaSequence) -> Self {
        Self {
            name: sequence.name().map(str::to_string),
            length: sequence.len(),
            motifs: scan_motifs(sequence),
            binding_sites: scan_binding_sites(sequence, None),
        }
    }
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  ribostruct_cli --version\n  \
  ribostruct_cli [-v|-vv] [--config PATH] capabilities\n  \
  ribostruct_cli [-v|-vv] [--config PATH] parse STRUCTURE [SEQUENCE]\n  \
  ribostruct_cli [-v|-vv] [--config PATH] overlay '<request-json>'\n  \
  ribostruct_cli [-v|-vv] [--config PATH] scan SEQUENCE\n  \
  ribostruct_cli [-v|-vv] [--config PATH] scan-fasta PATH\n  \
  ribostruct_cli [-v|-vv] [--config PATH] export KIND '<request-json>' [OUTPUT]\n  \
  ribostruct_cli [-v|-vv] [--config PATH] op '<operation-json>'\n  \
  ribostruct_cli [-v|-vv] [--config PATH] batch '<operation-list-json>'\n\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn load_json_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Could not read JSON file '{path}'"))
        }
        None => Ok(value.to_string()),
    }
}

fn parse_json_arg<T: serde::de::DeserializeOwned>(value: &str, what: &str) -> Result<T> {
    let json = load_json_arg(value)?;
    serde_json::from_str(&json).with_context(|| format!("Invalid {what} JSON"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

struct GlobalArgs {
    verbosity: u8,
    config: Option<String>,
    rest: Vec<String>,
}

fn parse_global_args(args: &[String]) -> Result<GlobalArgs> {
    let mut ret = GlobalArgs {
        verbosity: 0,
        config: None,
        rest: vec![],
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" => ret.verbosity += 1,
            "-vv" => ret.verbosity += 2,
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow!("Missing path for --config"))?;
                ret.config = Some(path.clone());
            }
            _ => {
                ret.rest.push(arg.clone());
                ret.rest.extend(iter.cloned());
                break;
            }
        }
    }
    Ok(ret)
}

fn init_logging(verbosity: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        bail!("Missing command");
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let global = parse_global_args(&args)?;
    init_logging(global.verbosity);
    let parameters = OverlayParameters::load(global.config.as_deref())?;
    let mut engine = OverlayEngine::with_parameters(parameters);

    let Some((command, rest)) = global.rest.split_first() else {
        usage();
        bail!("Missing command");
    };

    match command.as_str() {
        "capabilities" => print_json(&engine.capabilities()),
        "parse" => {
            let Some(structure) = rest.first() else {
                usage();
                bail!("parse requires: STRUCTURE [SEQUENCE]");
            };
            let result = engine.apply(Operation::ParseStructure {
                structure: structure.clone(),
                sequence: rest.get(1).cloned(),
            })?;
            print_json(&result)
        }
        "overlay" => {
            let Some(request) = rest.first() else {
                usage();
                bail!("Missing request JSON");
            };
            let request: OverlayRequest = parse_json_arg(request, "request")?;
            let report = engine.overlay(&request)?;
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            print_json(&report)
        }
        "scan" => {
            let Some(text) = rest.first() else {
                usage();
                bail!("Missing sequence");
            };
            let sequence = engine.parse_sequence(text)?;
            print_json(&ScanSummary::of(&sequence))
        }
        "scan-fasta" => {
            let Some(path) = rest.first() else {
                usage();
                bail!("Missing FASTA path");
            };
            let records = RnaSequence::from_fasta_file(path, engine.parameters().normalize_thymine)
                .with_context(|| format!("Could not read FASTA file '{path}'"))?;
            for record in &records {
                engine.check_length(record.len()).with_context(|| {
                    format!("Record '{}'", record.name().unwrap_or("unnamed"))
                })?;
            }
            let summaries: Vec<ScanSummary> = records.iter().map(ScanSummary::of).collect();
            print_json(&summaries)
        }
        "export" => {
            let (Some(kind), Some(request)) = (rest.first(), rest.get(1)) else {
                usage();
                bail!("export requires: KIND REQUEST [OUTPUT]");
            };
            let kind = ExportKind::parse(kind).ok_or_else(|| {
                let known: Vec<&str> = ExportKind::ALL.iter().map(|k| k.as_str()).collect();
                anyhow!(
                    "Unknown export kind '{kind}', expected one of {}",
                    known.join(", ")
                )
            })?;
            let request: OverlayRequest = parse_json_arg(request, "request")?;
            let artifact = engine.export(kind, &request)?;
            match rest.get(2) {
                Some(output) => {
                    fs::write(output, &artifact.content)
                        .with_context(|| format!("Could not write output '{output}'"))?;
                    println!(
                        "Wrote {} ({}) to '{output}'",
                        artifact.filename, artifact.mime_type
                    );
                }
                None => print!("{}", artifact.content),
            }
            Ok(())
        }
        "op" => {
            let Some(op) = rest.first() else {
                usage();
                bail!("Missing operation JSON");
            };
            let op: Operation = parse_json_arg(op, "operation")?;
            print_json(&engine.apply(op)?)
        }
        "batch" => {
            let Some(ops) = rest.first() else {
                usage();
                bail!("Missing operation list JSON");
            };
            let ops: Vec<Operation> = parse_json_arg(ops, "operation list")?;
            let results: Vec<serde_json::Value> = engine
                .apply_batch(ops)
                .into_iter()
                .map(|r| match r {
                    Ok(result) => serde_json::to_value(result),
                    Err(e) => serde_json::to_value(e),
                })
                .collect::<Result<_, _>>()
                .context("Could not serialize batch results")?;
            print_json(&results)
        }
        _ => {
            usage();
            bail!("Unknown command '{command}'")
        }
    }
}
