use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use bloom_api::config::BloomConfig;
use bloom_api::export::exporter_for;
use bloom_api::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloomcli")]
#[command(about = "BloomAPI CLI - Look up healthcare providers and Medicare specialties", long_about = None)]
struct Cli {
    /// BloomAPI secret key
    #[arg(long, env = "BLOOM_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    /// Override the registry base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Read configuration from this TOML file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a provider by NPI
    Npi(NpiArgs),
    /// Search providers by field equality filters
    Search(SearchArgs),
    /// Find Medicare specialties for a taxonomy code
    Specialty(SpecialtyArgs),
    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct NpiArgs {
    /// 10-digit National Provider Identifier
    npi: String,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct SearchArgs {
    /// Filter as field=value (repeatable, applied in order)
    #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE", required = true)]
    filters: Vec<String>,
    /// Maximum number of records (server maximum is 100)
    #[arg(long)]
    limit: Option<u32>,
    /// Number of records to skip
    #[arg(long, default_value_t = 0)]
    offset: u32,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write results to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SpecialtyArgs {
    /// NUCC taxonomy code (e.g. 2086S0122X)
    code: String,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration (secret redacted)
    Show,
    /// Print the default configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
    Csv,
}

impl OutputFormat {
    fn export_format(self) -> Option<ExportFormat> {
        match self {
            OutputFormat::Text => None,
            OutputFormat::Json => Some(ExportFormat::Json),
            OutputFormat::Jsonl => Some(ExportFormat::JsonLines),
            OutputFormat::Csv => Some(ExportFormat::Csv),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Npi(args) => cmd_npi(&cli, args),
        Commands::Search(args) => cmd_search(&cli, args),
        Commands::Specialty(args) => cmd_specialty(&cli, args),
        Commands::Config(command) => cmd_config(&cli, command),
    };

    if let Err(e) = result {
        match e.downcast_ref::<BloomError>() {
            Some(bloom_error) => eprintln!("Error: {}", bloom_error.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<BloomConfig> {
    let mut config = match &cli.config {
        Some(path) => BloomConfig::load_layered(Some(path.as_path()))
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => BloomConfig::load(),
    };
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

fn build_client(cli: &Cli) -> anyhow::Result<BloomClient> {
    Ok(BloomClient::with_config(load_config(cli)?)?)
}

fn cmd_npi(cli: &Cli, args: &NpiArgs) -> anyhow::Result<()> {
    let client = build_client(cli)?;
    let record = client.find_by_npi(&args.npi)?;
    write_records(&[record], args.format, None)
}

fn cmd_search(cli: &Cli, args: &SearchArgs) -> anyhow::Result<()> {
    let client = build_client(cli)?;
    let criteria = parse_filters(&args.filters)?;
    let limit = args.limit.unwrap_or(client.config().default_limit);

    let records = client.find_by(&criteria, limit, args.offset)?;
    write_records(&records, args.format, args.output.as_ref())?;

    if args.format == OutputFormat::Text || args.output.is_some() {
        eprintln!("Total matches: {}", records.len());
    }
    Ok(())
}

fn cmd_specialty(cli: &Cli, args: &SpecialtyArgs) -> anyhow::Result<()> {
    let client = build_client(cli)?;
    let specialties = client.find_by_specialty_code(&args.code)?;

    let stdout = std::io::stdout();
    write_specialties(&specialties, args.format, &mut stdout.lock())
}

fn write_specialties(specialties: &[MedicareSpecialty], format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, specialties)?;
            writeln!(out)?;
        }
        OutputFormat::Jsonl => {
            for specialty in specialties {
                serde_json::to_writer(&mut *out, specialty)?;
                writeln!(out)?;
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["code", "description"])?;
            for specialty in specialties {
                writer.write_record([
                    specialty.code().unwrap_or(""),
                    specialty.description().unwrap_or(""),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Text => {
            for specialty in specialties {
                writeln!(
                    out,
                    "{} | {}",
                    specialty.code().unwrap_or(""),
                    specialty.description().unwrap_or("")
                )?;
            }
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{:#?}", load_config(cli)?);
        }
        ConfigCommand::Path => match BloomConfig::default_config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("could not determine a configuration directory for this platform"),
        },
        ConfigCommand::Init { force } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => BloomConfig::default_config_path()
                    .context("could not determine a configuration directory for this platform")?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            BloomConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn parse_filters(filters: &[String]) -> anyhow::Result<Criteria> {
    let mut criteria = Criteria::new();
    for filter in filters {
        let Some((field, value)) = filter.split_once('=') else {
            bail!("filter '{}' is not in FIELD=VALUE form", filter);
        };
        if field.trim().is_empty() {
            bail!("filter '{}' has an empty field name", filter);
        }
        criteria.push(field.trim(), value);
    }
    Ok(criteria)
}

fn write_records(records: &[ProviderRecord], format: OutputFormat, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match (format.export_format(), output) {
        (Some(export_format), Some(path)) => {
            exporter_for(export_format).export(records, path)?;
        }
        (Some(export_format), None) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            exporter_for(export_format).write_records(records, &mut out)?;
        }
        (None, Some(path)) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            print_text(records, &mut file)?;
        }
        (None, None) => {
            let stdout = std::io::stdout();
            print_text(records, &mut stdout.lock())?;
        }
    }
    Ok(())
}

fn print_text(records: &[ProviderRecord], out: &mut dyn Write) -> std::io::Result<()> {
    for record in records {
        let provider = record.provider();
        let location = provider.practice_address()
            .or_else(|| provider.business_address())
            .map(|a| a.single_line())
            .unwrap_or_default();
        writeln!(
            out,
            "{} | {} | {} | {}",
            record.npi().unwrap_or_default(),
            record.display_name(),
            record.entity_type().option_display(),
            location
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn specialty(code: &str, description: &str) -> MedicareSpecialty {
        serde_json::from_value(json!({"code": code, "description": description})).unwrap()
    }

    #[test]
    fn test_specialties_as_csv() {
        let specialties = vec![
            specialty("91", "Physician/Surgical Oncology"),
            specialty("30", "Diagnostic Radiology, Nuclear Medicine"),
        ];
        let mut out = Vec::new();
        write_specialties(&specialties, OutputFormat::Csv, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "code,description\n91,Physician/Surgical Oncology\n30,\"Diagnostic Radiology, Nuclear Medicine\"\n"
        );
    }

    #[test]
    fn test_specialties_as_text() {
        let mut out = Vec::new();
        write_specialties(&[specialty("91", "Physician/Surgical Oncology")], OutputFormat::Text, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "91 | Physician/Surgical Oncology\n");
    }

    #[test]
    fn test_parse_filters_keeps_order() {
        let criteria = parse_filters(&["last_name=SMITH".to_string(), "practice_address.state=NY".to_string()]).unwrap();
        let fields: Vec<_> = criteria.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["last_name", "practice_address.state"]);
        assert!(parse_filters(&["no-equals".to_string()]).is_err());
    }
}
