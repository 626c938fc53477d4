//! EMRA: Early Metabolic Risk Assessment
//!
//! Command-line demo: scores one set of biomarkers against the model in
//! `EMRA_MODEL_DIR` and prints the result card.
//!
//! ```text
//! emra [--json] <glucose> <hba1c> <triglycerides> <bmi>
//! ```

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use emra::adapters::sanitize::{self, SanitizingMakeWriter};
use emra::adapters::JsonArtifactStore;
use emra::config::{Config, LogMode};
use emra::{AssessmentReport, AssessmentService, BiomarkerInput};

const USAGE: &str = "usage: emra [--json] <glucose> <hba1c> <triglycerides> <bmi>";

struct Args {
    json: bool,
    input: BiomarkerInput,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut json = false;
    let mut values = Vec::with_capacity(4);

    for arg in args {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => bail!(USAGE),
            _ => values.push(
                arg.parse::<f64>()
                    .with_context(|| format!("Not a number: {arg}\n{USAGE}"))?,
            ),
        }
    }

    let [glucose, hba1c, triglycerides, bmi] = values[..] else {
        bail!("Expected 4 values, got {}\n{USAGE}", values.len());
    };

    Ok(Args {
        json,
        input: BiomarkerInput::new(glucose, hba1c, triglycerides, bmi),
    })
}

fn main() -> Result<()> {
    let config = Config::from_env();

    // Logs never go to stdout: it carries the report.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    sanitize::set_max_bytes(config.sanitize_max_bytes);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    if let Err(errors) = args.input.validate() {
        bail!("Invalid input:\n  {}", errors.join("\n  "));
    }

    let store = JsonArtifactStore::open(&config.model_dir, config.require_manifest)
        .with_context(|| format!("Failed to load artifacts from {:?}", config.model_dir))?;
    let service = AssessmentService::from_source(&store)?;

    let assessment = service.assess(&args.input)?;
    let report = AssessmentReport::from_assessment(&assessment);

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}
