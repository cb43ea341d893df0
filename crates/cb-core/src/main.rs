//! Conjugate Bayes Core - posterior summaries from the command line
//!
//! The main entry point for cb-core, handling:
//! - Poisson rate posteriors (flat, Jeffreys and Gamma priors)
//! - Normal mean posteriors (discrete, flat and Normal priors)
//! - Differences of Normal means (known variances or Behrens-Fisher)

use std::path::PathBuf;

use cb_core::config::{load_settings, ConfigError, ConfigOptions, Settings};
use cb_core::exit_codes::ExitCode;
use cb_core::inference::{
    normal_diff, normal_mu, poisson, CredibleInterval, DiscretePosterior, DiscretePrior,
    EstimatedSample, GammaPosterior, MeanPrior, NormalPosterior, PoissonSample, QuantileRow,
    RatePrior, SampleSummary, StudentPosterior, TestDecision,
};
use cb_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use cb_core::output::{format_number, to_json, OutputFormat, TextReport};
use cb_core::InferenceError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Conjugate Bayes Core - posterior inference for Normal means and Poisson rates
#[derive(Parser)]
#[command(name = "cb-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Settings file (TOML); falls back to CB_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (overrides the settings file)
    #[arg(long, short = 'f', global = true)]
    format: Option<OutputFormat>,

    /// Log level (overrides CB_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format: human or jsonl (overrides CB_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Posterior of a Poisson rate from event counts
    PoissonRate(PoissonRateArgs),

    /// Posterior of a Normal mean
    NormalMean(NormalMeanArgs),

    /// Posterior of the difference between two Normal means
    NormalDiff(NormalDiffArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RatePriorKind {
    Flat,
    Jeffreys,
    Gamma,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MeanPriorKind {
    Flat,
    Normal,
}

#[derive(Args, Debug)]
struct PoissonRateArgs {
    /// Total number of events observed
    #[arg(long, required_unless_present = "counts")]
    events: Option<u64>,

    /// Number of equal observation intervals
    #[arg(long, required_unless_present = "counts")]
    intervals: Option<u64>,

    /// Per-interval counts, comma separated (instead of --events/--intervals)
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["events", "intervals"])]
    counts: Vec<u64>,

    /// Prior on the rate
    #[arg(long, value_enum, default_value_t = RatePriorKind::Flat)]
    prior: RatePriorKind,

    /// Gamma prior shape r
    #[arg(long)]
    shape: Option<f64>,

    /// Gamma prior rate v
    #[arg(long)]
    rate: Option<f64>,

    /// Gamma prior from a prior mean (with --prior-std)
    #[arg(long)]
    prior_mean: Option<f64>,

    /// Gamma prior from a prior standard deviation (with --prior-mean)
    #[arg(long)]
    prior_std: Option<f64>,

    /// Tail probability for the credible interval and tests
    #[arg(long)]
    alpha: Option<f64>,

    /// Null rate λ0 for the one- and two-sided tests
    #[arg(long)]
    null_rate: Option<f64>,

    /// Number of posterior draws to summarize
    #[arg(long)]
    draws: Option<usize>,

    /// Seed for posterior draws
    #[arg(long, requires = "draws")]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct NormalMeanArgs {
    /// Observations, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    observations: Vec<f64>,

    /// Sample size (with --mean, instead of --observations)
    #[arg(long, requires = "sample_mean", conflicts_with = "observations")]
    count: Option<u64>,

    /// Sample mean (with --count)
    #[arg(long = "mean", id = "sample_mean", requires = "count", allow_hyphen_values = true)]
    sample_mean: Option<f64>,

    /// Known population standard deviation; estimated from the data if omitted
    #[arg(long)]
    sigma: Option<f64>,

    /// Prior on the mean
    #[arg(long, value_enum, default_value_t = MeanPriorKind::Flat)]
    prior: MeanPriorKind,

    /// Normal prior mean
    #[arg(long, allow_hyphen_values = true)]
    prior_mean: Option<f64>,

    /// Normal prior standard deviation
    #[arg(long)]
    prior_std: Option<f64>,

    /// Candidate means of a discrete prior, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "discrete_masses")]
    discrete_values: Vec<f64>,

    /// Prior masses of the candidates, comma separated
    #[arg(long, value_delimiter = ',', requires = "discrete_values")]
    discrete_masses: Vec<f64>,

    /// Tail probability for the credible interval
    #[arg(long)]
    alpha: Option<f64>,
}

#[derive(Args, Debug)]
struct NormalDiffArgs {
    /// Observations from the first population, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    observations1: Vec<f64>,

    /// Observations from the second population, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    observations2: Vec<f64>,

    /// Known standard deviation of the first population
    #[arg(long, requires = "sigma2")]
    sigma1: Option<f64>,

    /// Known standard deviation of the second population
    #[arg(long, requires = "sigma1")]
    sigma2: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    prior_mean1: Option<f64>,

    #[arg(long)]
    prior_std1: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    prior_mean2: Option<f64>,

    #[arg(long)]
    prior_std2: Option<f64>,

    /// Tail probability for the credible interval
    #[arg(long)]
    alpha: Option<f64>,
}

/// Failures surfaced by a subcommand.
#[derive(Debug, Error)]
enum CommandError {
    #[error("{0}")]
    Inference(#[from] InferenceError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("invalid arguments: {0}")]
    Args(String),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CommandError::Inference(e) => ExitCode::from(e),
            CommandError::Config(e) => ExitCode::from(e),
            CommandError::Args(_) => ExitCode::ArgsError,
            CommandError::Json(_) => ExitCode::InternalError,
            CommandError::Io(_) => ExitCode::IoError,
        }
    }

    fn code_label(&self) -> &'static str {
        match self {
            CommandError::Inference(e) => e.field(),
            CommandError::Config(_) => "config",
            CommandError::Args(_) => "args",
            CommandError::Json(_) => "serialization",
            CommandError::Io(_) => "io",
        }
    }
}

type CommandResult<T> = std::result::Result<T, CommandError>;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            // Help and version go to stdout; usage errors to stderr.
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let format_hint = cli.global.format.unwrap_or_default();
    let exit_code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(format_hint, &err),
    };

    debug!(exit_code = %exit_code, "cb-core finished");
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> CommandResult<()> {
    let options = ConfigOptions {
        config_path: cli.global.config.clone(),
    };
    let resolved = load_settings(&options)?;
    if let Some(path) = &resolved.path {
        info!(path = %path.display(), "using settings file");
    }
    let settings = resolved.settings;
    let format = cli.global.format.unwrap_or(settings.output);

    let rendered = match &cli.command {
        Commands::PoissonRate(args) => run_poisson_rate(&settings, format, args)?,
        Commands::NormalMean(args) => run_normal_mean(&settings, format, args)?,
        Commands::NormalDiff(args) => run_normal_diff(&settings, format, args)?,
    };

    use std::io::Write;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn output_error(format: OutputFormat, error: &CommandError) -> ExitCode {
    let exit_code = error.exit_code();
    match format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "error": {
                    "code": exit_code.code_name(),
                    "field": error.code_label(),
                    "message": error.to_string(),
                }
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{text}"),
                Err(_) => eprintln!("error: {error}"),
            }
        }
        OutputFormat::Text => eprintln!("error: {error}"),
    }
    exit_code
}

fn render<T: Serialize>(format: OutputFormat, report: &T, text: impl FnOnce() -> String) -> CommandResult<String> {
    match format {
        OutputFormat::Json => {
            let mut out = to_json(report)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => Ok(text()),
    }
}

fn quantile_rows(
    probabilities: &[f64],
    quantile: impl Fn(f64) -> cb_core::Result<f64>,
) -> CommandResult<Vec<QuantileRow>> {
    probabilities
        .iter()
        .map(|&probability| -> CommandResult<QuantileRow> {
            Ok(QuantileRow {
                probability,
                quantile: quantile(probability)?,
            })
        })
        .collect()
}

// ============================================================================
// poisson-rate
// ============================================================================

#[derive(Debug, Serialize)]
struct PoissonRateReport {
    sample: PoissonSample,
    prior: RatePrior,
    equivalent_prior_sample_size: u64,
    posterior: GammaPosterior,
    mean: f64,
    std_dev: f64,
    alpha: f64,
    credible_interval: CredibleInterval,
    interquartile_range: f64,
    quantiles: Vec<QuantileRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tests: Option<PoissonTests>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draws: Option<DrawSummary>,
}

#[derive(Debug, Serialize)]
struct PoissonTests {
    null_rate: f64,
    one_sided: TestDecision,
    two_sided: TestDecision,
}

#[derive(Debug, Serialize)]
struct DrawSummary {
    count: usize,
    seed: Option<u64>,
    mean: f64,
    std_dev: f64,
}

fn rate_prior(args: &PoissonRateArgs) -> CommandResult<RatePrior> {
    let gamma_flags = args.shape.is_some()
        || args.rate.is_some()
        || args.prior_mean.is_some()
        || args.prior_std.is_some();
    match args.prior {
        RatePriorKind::Flat | RatePriorKind::Jeffreys if gamma_flags => Err(CommandError::Args(
            "--shape/--rate/--prior-mean/--prior-std need --prior gamma".to_string(),
        )),
        RatePriorKind::Flat => Ok(RatePrior::Flat),
        RatePriorKind::Jeffreys => Ok(RatePrior::Jeffreys),
        RatePriorKind::Gamma => match (args.shape, args.rate, args.prior_mean, args.prior_std) {
            (Some(shape), Some(rate), None, None) => Ok(RatePrior::Gamma { shape, rate }),
            (None, None, Some(mean), Some(std)) => Ok(RatePrior::from_mean_std(mean, std)?),
            _ => Err(CommandError::Args(
                "--prior gamma needs either --shape and --rate or --prior-mean and --prior-std"
                    .to_string(),
            )),
        },
    }
}

fn run_poisson_rate(
    settings: &Settings,
    format: OutputFormat,
    args: &PoissonRateArgs,
) -> CommandResult<String> {
    let sample = match (args.events, args.intervals) {
        (Some(events), Some(intervals)) => PoissonSample::new(events, intervals)?,
        _ => PoissonSample::from_counts(&args.counts)?,
    };
    let prior = rate_prior(args)?;
    let alpha = args.alpha.unwrap_or(settings.alpha);

    let posterior = poisson::posterior(&sample, &prior)?;
    let (_, prior_rate) = prior.parameters();

    let tests = match args.null_rate {
        Some(null_rate) => Some(PoissonTests {
            null_rate,
            one_sided: poisson::one_sided_test(&sample, &prior, alpha, null_rate)?,
            two_sided: poisson::two_sided_test(&sample, &prior, alpha, null_rate)?,
        }),
        None => None,
    };

    let draws = match args.draws {
        Some(0) => return Err(CommandError::Args("--draws must be > 0".to_string())),
        Some(count) => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let values = (0..count)
                .map(|_| poisson::sample_posterior(&sample, &prior, &mut rng))
                .collect::<cb_core::Result<Vec<f64>>>()?;
            let mean = values.iter().sum::<f64>() / count as f64;
            let var = if count > 1 {
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (count - 1) as f64
            } else {
                0.0
            };
            Some(DrawSummary {
                count,
                seed: args.seed,
                mean,
                std_dev: var.sqrt(),
            })
        }
        None => None,
    };

    let report = PoissonRateReport {
        sample,
        prior,
        equivalent_prior_sample_size: poisson::equivalent_prior_sample_size(prior_rate)?,
        mean: posterior.mean(),
        std_dev: posterior.std_dev(),
        alpha,
        credible_interval: posterior.credible_interval(alpha)?,
        interquartile_range: posterior.interquartile_range(),
        quantiles: poisson::quantile_table(&posterior, &settings.probabilities)?,
        posterior,
        tests,
        draws,
    };

    render(format, &report, || {
        let mut text = TextReport::new("Poisson rate posterior");
        text.field(
            "posterior",
            format!(
                "Gamma(shape = {}, rate = {})",
                format_number(report.posterior.shape()),
                format_number(report.posterior.rate())
            ),
        )
        .number("mean", report.mean)
        .number("std dev", report.std_dev)
        .interval("credible interval", alpha, &report.credible_interval)
        .number("interquartile range", report.interquartile_range);
        if let Some(tests) = &report.tests {
            text.test(
                &format!("H0: λ <= {}", format_number(tests.null_rate)),
                &tests.one_sided,
            )
            .test(
                &format!("H0: λ = {}", format_number(tests.null_rate)),
                &tests.two_sided,
            );
        }
        if let Some(draws) = &report.draws {
            text.field("draws", draws.count)
                .number("draw mean", draws.mean)
                .number("draw std dev", draws.std_dev);
        }
        text.quantiles(&report.quantiles);
        text.render()
    })
}

// ============================================================================
// normal-mean
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
enum NormalMeanReport {
    Discrete {
        sample: SampleSummary,
        sigma: f64,
        posterior: DiscretePosterior,
        mean: f64,
        mode: f64,
    },
    KnownVariance {
        sample: SampleSummary,
        sigma: f64,
        prior: MeanPrior,
        posterior: NormalPosterior,
        alpha: f64,
        credible_interval: CredibleInterval,
        quantiles: Vec<QuantileRow>,
    },
    UnknownVariance {
        sample: EstimatedSample,
        prior: MeanPrior,
        posterior: StudentPosterior,
        alpha: f64,
        credible_interval: CredibleInterval,
        quantiles: Vec<QuantileRow>,
    },
}

fn mean_prior(
    kind: MeanPriorKind,
    mean: Option<f64>,
    std: Option<f64>,
) -> CommandResult<MeanPrior> {
    match (kind, mean, std) {
        (MeanPriorKind::Flat, None, None) => Ok(MeanPrior::Flat),
        (MeanPriorKind::Flat, _, _) => Err(CommandError::Args(
            "--prior-mean/--prior-std need --prior normal".to_string(),
        )),
        (MeanPriorKind::Normal, Some(mean), Some(std)) => Ok(MeanPrior::Normal { mean, std }),
        (MeanPriorKind::Normal, _, _) => Err(CommandError::Args(
            "--prior normal needs --prior-mean and --prior-std".to_string(),
        )),
    }
}

fn sample_summary(args: &NormalMeanArgs) -> CommandResult<SampleSummary> {
    match (args.count, args.sample_mean) {
        (Some(count), Some(mean)) => Ok(SampleSummary::new(count, mean)?),
        _ if !args.observations.is_empty() => Ok(SampleSummary::from_observations(&args.observations)?),
        _ => Err(CommandError::Args(
            "give --observations or --count with --mean".to_string(),
        )),
    }
}

fn run_normal_mean(
    settings: &Settings,
    format: OutputFormat,
    args: &NormalMeanArgs,
) -> CommandResult<String> {
    let alpha = args.alpha.unwrap_or(settings.alpha);

    let report = if !args.discrete_values.is_empty() {
        let sigma = args
            .sigma
            .ok_or_else(|| CommandError::Args("a discrete prior needs --sigma".to_string()))?;
        let prior = DiscretePrior::new(args.discrete_values.clone(), args.discrete_masses.clone())?;
        let sample = sample_summary(args)?;
        let posterior = match args.observations.as_slice() {
            [y] => normal_mu::discrete_posterior_single(*y, sigma, &prior)?,
            _ => normal_mu::discrete_posterior(&sample, sigma, &prior)?,
        };
        NormalMeanReport::Discrete {
            sample,
            sigma,
            mean: posterior.mean(),
            mode: posterior.mode(),
            posterior,
        }
    } else {
        let prior = mean_prior(args.prior, args.prior_mean, args.prior_std)?;
        match args.sigma {
            Some(sigma) => {
                let sample = sample_summary(args)?;
                let posterior = match args.observations.as_slice() {
                    [y] => normal_mu::posterior_single(*y, sigma, &prior)?,
                    _ => normal_mu::posterior(&sample, sigma, &prior)?,
                };
                NormalMeanReport::KnownVariance {
                    sample,
                    sigma,
                    prior,
                    alpha,
                    credible_interval: posterior.credible_interval(alpha)?,
                    quantiles: quantile_rows(&settings.probabilities, |p| posterior.quantile(p))?,
                    posterior,
                }
            }
            None => {
                if args.observations.is_empty() {
                    return Err(CommandError::Args(
                        "without --sigma the observations themselves are needed".to_string(),
                    ));
                }
                let sample = EstimatedSample::from_observations(&args.observations)?;
                let posterior = normal_mu::posterior_unknown_variance(&sample, &prior)?;
                NormalMeanReport::UnknownVariance {
                    sample,
                    prior,
                    alpha,
                    credible_interval: normal_mu::credible_interval_unknown_variance(
                        &sample, &prior, alpha,
                    )?,
                    quantiles: quantile_rows(&settings.probabilities, |p| posterior.quantile(p))?,
                    posterior,
                }
            }
        }
    };

    render(format, &report, || {
        let mut text = TextReport::new("Normal mean posterior");
        match &report {
            NormalMeanReport::Discrete {
                posterior,
                mean,
                mode,
                ..
            } => {
                text.number("mean", *mean)
                    .number("mode", *mode)
                    .masses(posterior.iter());
            }
            NormalMeanReport::KnownVariance {
                posterior,
                credible_interval,
                quantiles,
                ..
            } => {
                text.number("mean", posterior.mean())
                    .number("std dev", posterior.std())
                    .interval("credible interval", alpha, credible_interval)
                    .quantiles(quantiles);
            }
            NormalMeanReport::UnknownVariance {
                posterior,
                credible_interval,
                quantiles,
                ..
            } => {
                text.number("location", posterior.location())
                    .number("scale", posterior.scale())
                    .number("degrees of freedom", posterior.df())
                    .interval("credible interval", alpha, credible_interval)
                    .quantiles(quantiles);
            }
        }
        text.render()
    })
}

// ============================================================================
// normal-diff
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
enum NormalDiffReport {
    KnownVariance {
        samples: [SampleSummary; 2],
        sigmas: [f64; 2],
        priors: [MeanPrior; 2],
        posterior: NormalPosterior,
        alpha: f64,
        credible_interval: CredibleInterval,
    },
    Satterthwaite {
        samples: [EstimatedSample; 2],
        priors: [MeanPrior; 2],
        effective_df: f64,
        posterior: StudentPosterior,
        alpha: f64,
        credible_interval: CredibleInterval,
    },
}

fn run_normal_diff(
    settings: &Settings,
    format: OutputFormat,
    args: &NormalDiffArgs,
) -> CommandResult<String> {
    let alpha = args.alpha.unwrap_or(settings.alpha);
    let prior1 = optional_normal_prior(args.prior_mean1, args.prior_std1, "1")?;
    let prior2 = optional_normal_prior(args.prior_mean2, args.prior_std2, "2")?;

    let report = match (args.sigma1, args.sigma2) {
        (Some(sigma1), Some(sigma2)) => {
            let s1 = SampleSummary::from_observations(&args.observations1)?;
            let s2 = SampleSummary::from_observations(&args.observations2)?;
            let posterior = normal_diff::known_variance(&s1, &s2, sigma1, sigma2, &prior1, &prior2)?;
            NormalDiffReport::KnownVariance {
                samples: [s1, s2],
                sigmas: [sigma1, sigma2],
                priors: [prior1, prior2],
                alpha,
                credible_interval: posterior.credible_interval(alpha)?,
                posterior,
            }
        }
        _ => {
            let e1 = EstimatedSample::from_observations(&args.observations1)?;
            let e2 = EstimatedSample::from_observations(&args.observations2)?;
            let posterior = match (prior1, prior2) {
                (MeanPrior::Flat, MeanPrior::Flat) => normal_diff::unknown_variance_flat_priors(&e1, &e2)?,
                _ => normal_diff::unknown_variance_normal_priors(&e1, &e2, &prior1, &prior2)?,
            };
            NormalDiffReport::Satterthwaite {
                samples: [e1, e2],
                priors: [prior1, prior2],
                effective_df: normal_diff::effective_df(e1.variance(), e1.count, e2.variance(), e2.count)?,
                alpha,
                credible_interval: posterior.credible_interval(alpha)?,
                posterior,
            }
        }
    };

    render(format, &report, || {
        let mut text = TextReport::new("Difference of means posterior");
        match &report {
            NormalDiffReport::KnownVariance {
                posterior,
                credible_interval,
                ..
            } => {
                text.number("mean", posterior.mean())
                    .number("std dev", posterior.std())
                    .interval("credible interval", alpha, credible_interval);
            }
            NormalDiffReport::Satterthwaite {
                posterior,
                effective_df,
                credible_interval,
                ..
            } => {
                text.number("location", posterior.location())
                    .number("scale", posterior.scale())
                    .number("effective df", *effective_df)
                    .number("degrees of freedom", posterior.df())
                    .interval("credible interval", alpha, credible_interval);
            }
        }
        text.render()
    })
}

fn optional_normal_prior(
    mean: Option<f64>,
    std: Option<f64>,
    which: &str,
) -> CommandResult<MeanPrior> {
    match (mean, std) {
        (None, None) => Ok(MeanPrior::Flat),
        (Some(mean), Some(std)) => Ok(MeanPrior::Normal { mean, std }),
        _ => Err(CommandError::Args(format!(
            "--prior-mean{which} and --prior-std{which} go together"
        ))),
    }
}
