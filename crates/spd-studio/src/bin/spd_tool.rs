//! `spd-tool`: inspect and edit 512-byte DDR4 SPD image files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use spd_studio::{format_diff, parse_assignment, summary, EditPlan};
use spd_studio_codec::crc::{check_crc, crc_ok, fix_crc};
use spd_studio_record::{text_report, to_json, Source, SpdRecord};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "DDR4 SPD image inspector and editor")]
struct Args {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Print a summary of the decoded image
    Info {
        file: PathBuf,
        /// Print the full decoded view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the full text report
    Report { file: PathBuf },
    /// Write the image as JSON, a text report, or raw bytes
    Export {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Apply field edits and write the result
    Edit {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        part_number: Option<String>,
        /// Up to 8 hex digits, optional 0x prefix
        #[arg(long)]
        serial: Option<String>,
        /// YYYY, WNN/YYYY, YYYY-WNN or "YYYY Week NN"
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        dram_manufacturer: Option<String>,
        #[arg(long)]
        module_type: Option<String>,
        /// Raw byte write, OFFSET=VALUE (decimal or 0x hex); repeatable
        #[arg(long = "set", value_name = "OFFSET=VALUE")]
        set: Vec<String>,
        /// TOML edit file; flags given alongside take precedence
        #[arg(long)]
        edits: Option<PathBuf>,
        /// Leave both CRC fields as they are
        #[arg(long)]
        keep_crc: bool,
    },
    /// List byte differences between two images
    Diff { left: PathBuf, right: PathBuf },
    /// Verify, or with --fix repair, both CRC fields
    Crc {
        file: PathBuf,
        #[arg(long, requires = "output")]
        fix: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
    Bin,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // stderr keeps stdout clean for reports and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<SpdRecord> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    SpdRecord::from_bytes(&bytes, Source::File(path.to_path_buf()))
        .with_context(|| format!("loading {}", path.display()))
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.cmd {
        Cmd::Info { file, json } => {
            let record = load(&file)?;
            let view = record
                .parse()
                .with_context(|| format!("decoding {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", summary(&view));
            }
        }
        Cmd::Report { file } => {
            let record = load(&file)?;
            print!("{}", text_report(&record));
        }
        Cmd::Export {
            file,
            output,
            format,
        } => {
            let record = load(&file)?;
            let bytes = match format {
                Format::Json => serde_json::to_string_pretty(&to_json(&record))?.into_bytes(),
                Format::Text => text_report(&record).into_bytes(),
                Format::Bin => record.image().to_vec(),
            };
            write(&output, &bytes)?;
        }
        Cmd::Edit {
            file,
            output,
            part_number,
            serial,
            date,
            manufacturer,
            dram_manufacturer,
            module_type,
            set,
            edits,
            keep_crc,
        } => {
            let mut plan = match &edits {
                Some(path) => {
                    let text = fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    EditPlan::from_toml(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => EditPlan::default(),
            };
            let mut bytes = BTreeMap::new();
            for assignment in &set {
                let (offset, value) = parse_assignment(assignment)?;
                bytes.insert(offset.to_string(), value);
            }
            plan.merge(EditPlan {
                part_number,
                serial,
                date,
                manufacturer,
                dram_manufacturer,
                module_type,
                bytes,
                ..EditPlan::default()
            });
            if plan.is_empty() && keep_crc {
                bail!("nothing to edit");
            }

            let mut record = load(&file)?;
            let changed = plan.apply(&mut record, !keep_crc)?;
            tracing::info!(changed, "applied edits");
            let modifications = record.modifications();
            if modifications.is_empty() {
                println!("No changes");
            } else {
                println!("Modifications ({} bytes)", modifications.len());
                println!("{}", format_diff(&modifications));
            }
            write(&output, record.image())?;
        }
        Cmd::Diff { left, right } => {
            let record = load(&left)?;
            let other =
                fs::read(&right).with_context(|| format!("reading {}", right.display()))?;
            let diff = record
                .compare_with(&other)
                .with_context(|| format!("comparing with {}", right.display()))?;
            if diff.is_empty() {
                println!("Images are identical");
            } else {
                println!("{}", format_diff(&diff));
                println!("{} byte(s) differ", diff.len());
            }
        }
        Cmd::Crc { file, fix, output } => {
            let mut record = load(&file)?;
            for check in check_crc(record.image()) {
                let range = check.section.covered();
                println!(
                    "CRC {}-{}: stored 0x{:04X}, computed 0x{:04X} {}",
                    range.start,
                    range.end - 1,
                    check.stored,
                    check.computed,
                    if check.ok { "OK" } else { "MISMATCH" }
                );
            }
            match output {
                Some(out) if fix => {
                    record.edit(|image| {
                        fix_crc(image);
                        Ok(())
                    })?;
                    write(&out, record.image())?;
                }
                _ => {
                    if !crc_ok(record.image()) {
                        bail!("CRC mismatch in {}", file.display());
                    }
                }
            }
        }
    }
    Ok(())
}
