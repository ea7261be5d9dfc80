use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use osmcodec_tools::{
    decode_any, encode_xml, format_decode_pretty, gzip, inspect_payload, maybe_gunzip, to_xml,
    ChangesetIdentity, InspectReport, SectionSummary, XmlInput,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "osmcodec-tools",
    version,
    about = "osmcodec encoding, decoding and inspection tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an OSM XML file (.osm snapshot or .osc change) into a payload.
    Encode {
        /// Path to the XML input.
        input: PathBuf,
        /// Where to write the payload.
        #[arg(short, long)]
        output: PathBuf,
        /// Gzip the payload after encoding.
        #[arg(long)]
        gzip: bool,
        /// Changeset id recorded for .osc input.
        #[arg(long, default_value_t = 0)]
        changeset_id: i64,
        /// Author user id recorded for .osc input.
        #[arg(long, default_value_t = 0)]
        uid: i64,
        /// Author display name recorded for .osc input.
        #[arg(long, default_value = "")]
        user: String,
    },
    /// Decode a payload (optionally gzipped) into JSON, a summary, or XML.
    Decode {
        /// Path to the payload bytes.
        payload_file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Inspect payload structure and sizes.
    Inspect {
        /// Path to a payload file or a directory of payloads.
        payload_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected payloads.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected payloads (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
    Xml,
}

fn main() -> Result<()> {
    init_tracing();
    let wire_limits = codec::WireLimits::default();
    let limits = codec::CodecLimits::default();

    let cli = Cli::parse();
    match cli.command {
        Command::Encode {
            input,
            output,
            gzip: compress,
            changeset_id,
            uid,
            user,
        } => {
            let xml = fs::read_to_string(&input)
                .with_context(|| format!("read xml {}", input.display()))?;
            let identity = ChangesetIdentity {
                id: changeset_id,
                user_id: uid,
                user,
            };
            let mut bytes = encode_xml(&xml, XmlInput::from_path(&input), &identity, &limits)?;
            if compress {
                bytes = gzip(&bytes)?;
            }
            fs::write(&output, &bytes)
                .with_context(|| format!("write payload {}", output.display()))?;
            tracing::info!(
                input = %input.display(),
                xml_bytes = xml.len(),
                payload_bytes = bytes.len(),
                "encoded"
            );
        }
        Command::Decode {
            payload_file,
            format,
        } => {
            let bytes = read_payload(&payload_file, wire_limits.max_payload_bytes)?;
            let decoded = decode_any(&bytes, &wire_limits, &limits)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&decoded).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&decoded));
                }
                DecodeFormat::Xml => {
                    println!("{}", to_xml(&decoded)?);
                }
            }
        }
        Command::Inspect {
            payload_path,
            glob,
            sort,
            limit,
        } => {
            if payload_path.is_dir() {
                let entries = collect_payload_entries(&payload_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let bytes = read_payload(&entry.path, wire_limits.max_payload_bytes)?;
                    let report = inspect_payload(&bytes, &wire_limits, &limits)?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    print_inspect_report(&report);
                }
            } else {
                let bytes = read_payload(&payload_path, wire_limits.max_payload_bytes)?;
                let report = inspect_payload(&bytes, &wire_limits, &limits)?;
                print_inspect_report(&report);
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_payload(path: &Path, max_bytes: usize) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("read payload {}", path.display()))?;
    let payload = maybe_gunzip(&bytes, max_bytes)
        .with_context(|| format!("decompress {}", path.display()))?;
    Ok(payload.into_owned())
}

struct PayloadEntry {
    path: PathBuf,
    size: u64,
}

fn collect_payload_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PayloadEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(PayloadEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<PayloadEntry>,
    sort: Option<InspectSort>,
) -> Vec<PayloadEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => entries.sort_by(|a, b| a.path.cmp(&b.path)),
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    let header = report.header;
    println!(
        "version: {} kind: {:?} payload_hash: 0x{:016x}",
        header.version, header.kind, header.payload_hash
    );
    println!(
        "payload_len: {} bytes total: {} bytes",
        header.payload_len, report.total_bytes
    );
    println!("sections:");
    print_sections(&report.sections, 1);
}

fn print_sections(sections: &[SectionSummary], depth: usize) {
    let indent = "  ".repeat(depth);
    for section in sections {
        let label = match section.tag {
            wire::SectionTag::StringTable => "strings",
            _ => "elements",
        };
        let count = section
            .count
            .map(|count| format!("{count} {label}"))
            .unwrap_or_else(|| "count n/a".to_string());
        println!("{indent}{:?}: {count} ({} bytes)", section.tag, section.byte_len);
        print_sections(&section.children, depth + 1);
    }
}
