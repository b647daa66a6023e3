//! cocload CLI - Transform scraped vehicle listings into certification tables
//!
//! # Main Commands
//!
//! ```bash
//! cocload transform dump.csv --source portal    # Dump → canonical table
//! cocload merge --registry a.json --portal b.json
//! cocload context merged.json                   # Merged table → B{n} context
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! cocload parse dump.csv            # Just parse a dump to JSON pairs
//! cocload rules --source registry   # Show a builtin rule set
//! cocload validate-rules rules.json # Check a rule-set file
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use cocload::{
    load_rules_file, merge, parse_dump_file, placeholder_context, rules_for, template_drift,
    transform, validate_source_rules, AttributeTable, IssueKind, MergedTable, Source, SourceRules,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cocload")]
#[command(about = "Transform scraped vehicle listings into certification tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// National vehicle-registry site
    Registry,
    /// Certificate-of-conformity portal
    Portal,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Registry => Source::Registry,
            SourceArg::Portal => Source::Portal,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a raw scrape dump and output JSON pairs
    Parse {
        /// Input dump file (delimited pairs, or .json pair array)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transform one source's dump into a canonical table
    Transform {
        /// Input dump file (delimited pairs, or .json pair array)
        input: PathBuf,

        /// Which source produced the dump
        #[arg(short, long, value_enum)]
        source: SourceArg,

        /// Rule-set file overriding the builtin rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Fail on any cleaning/derivation issue
        #[arg(long)]
        strict: bool,

        /// Output file for the canonical table (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge two canonical tables into the authoritative table
    Merge {
        /// Canonical table JSON from the registry pipeline
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Canonical table JSON from the portal pipeline
        #[arg(long)]
        portal: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Emit the B{n} placeholder context for the document template
    Context {
        /// Merged table JSON
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show a builtin rule set
    Rules {
        /// Which source's rules to print
        #[arg(short, long, value_enum)]
        source: SourceArg,
    },

    /// Validate a rule-set file against the embedded schema
    ValidateRules {
        /// Rule-set JSON file
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Transform {
            input,
            source,
            rules,
            strict,
            output,
        } => cmd_transform(&input, source.into(), rules.as_deref(), strict, output.as_deref()),

        Commands::Merge {
            registry,
            portal,
            output,
        } => cmd_merge(registry.as_deref(), portal.as_deref(), output.as_deref()),

        Commands::Context { input, output } => cmd_context(&input, output.as_deref()),

        Commands::Rules { source } => cmd_rules(source.into()),

        Commands::ValidateRules { input } => cmd_validate_rules(&input),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Read a dump in either supported form.
fn read_pairs(input: &Path) -> Result<Vec<cocload::RawPair>, Box<dyn std::error::Error>> {
    if input.extension().and_then(|e| e.to_str()) == Some("json") {
        let content = fs::read_to_string(input)?;
        Ok(cocload::pairs_from_json(&content)?)
    } else {
        let dump = parse_dump_file(input)?;
        eprintln!("   Encoding: {}", dump.encoding);
        eprintln!("   Delimiter: '{}'", format_delimiter(dump.delimiter));
        Ok(dump.pairs)
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing dump: {}", input.display());

    let pairs = read_pairs(input)?;
    eprintln!("✅ Parsed {} pairs", pairs.len());

    let json = serde_json::to_string_pretty(&pairs)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_transform(
    input: &Path,
    source: Source,
    rules_path: Option<&Path>,
    strict: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let loaded: SourceRules;
    let rules = match rules_path {
        Some(path) => {
            eprintln!("   Rules: {}", path.display());
            loaded = load_rules_file(path)?;
            &loaded
        }
        None => rules_for(source),
    };

    let pairs = read_pairs(input)?;
    eprintln!("   {} raw pairs", pairs.len());

    let outcome = transform(&pairs, rules);
    eprintln!("\n⚙️  Transformed: {} rows", outcome.table.len());

    if !outcome.issues.is_empty() {
        eprintln!("⚠️  {} issue(s):", outcome.issues.len());
        for issue in &outcome.issues {
            let tag = match issue.kind {
                IssueKind::Cleaning => "clean",
                IssueKind::Derivation => "derive",
                IssueKind::Drift => "drift",
            };
            eprintln!("   [{}] {}: {}", tag, issue.key, issue.detail);
        }
    }

    if strict {
        let table = outcome.strict()?;
        let json = serde_json::to_string_pretty(&table)?;
        write_output(&json, output)?;
    } else {
        let json = serde_json::to_string_pretty(&outcome.table)?;
        write_output(&json, output)?;
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_merge(
    registry: Option<&Path>,
    portal: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if registry.is_none() && portal.is_none() {
        return Err("provide at least one of --registry/--portal".into());
    }

    let registry_table = registry.map(read_table).transpose()?;
    let portal_table = portal.map(read_table).transpose()?;

    eprintln!(
        "🔀 Merging: registry={}, portal={}",
        registry_table.as_ref().map_or(0, AttributeTable::len),
        portal_table.as_ref().map_or(0, AttributeTable::len),
    );

    // The portal reproduces the manufacturer certificate, so it takes
    // side B and wins on conflicts.
    let merged = merge(registry_table.as_ref(), portal_table.as_ref())
        .ok_or("nothing to merge")?;
    eprintln!("✅ {} merged rows", merged.len());

    let json = serde_json::to_string_pretty(&merged)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_context(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📦 Building placeholder context: {}", input.display());

    let content = fs::read_to_string(input)?;
    let merged: MergedTable = serde_json::from_str(&content)?;

    for warning in template_drift(&merged) {
        eprintln!("⚠️  {}", warning);
    }

    let context = placeholder_context(&merged);
    eprintln!("✅ {} placeholders", context.len());

    let json = serde_json::to_string_pretty(&Value::Object(context))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_rules(source: Source) -> Result<(), Box<dyn std::error::Error>> {
    let rules = rules_for(source);
    println!("{}", rules.to_json()?);
    Ok(())
}

fn cmd_validate_rules(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let value: Value = serde_json::from_str(&content)?;

    match validate_source_rules(&value) {
        Ok(()) => {
            eprintln!("✅ Rule set is valid");
            Ok(())
        }
        Err(errors) => {
            for err in errors.iter().take(5) {
                eprintln!("   - {}", err);
            }
            Err(format!("{} schema violation(s)", errors.len()).into())
        }
    }
}

fn read_table(path: &Path) -> Result<AttributeTable, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
