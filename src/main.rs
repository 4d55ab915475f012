//! Player Engagement Prediction CLI
//!
//! Predicts a player's engagement level from game-behaviour attributes and
//! summarises gaming behaviour datasets.

use clap::{Args, Parser, Subcommand};
use engagement::auth::{CredentialStore, SessionContext};
use engagement::{Config, Result};

#[derive(Parser)]
#[command(name = "engagement")]
#[command(about = "Online gaming engagement level predictor", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Username for the login gate
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Password for the login gate
    #[arg(long, env = "ENGAGEMENT_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Predict the engagement level of one player
    Predict {
        #[command(flatten)]
        player: PlayerArgs,
        /// Read the player record from a JSON file instead of flags
        #[arg(long, conflicts_with = "age")]
        record: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict every row of a CSV file
    Batch {
        /// Input CSV with one player per row
        input: String,
        /// Output CSV with prediction columns appended
        output: String,
        /// Summary format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Summarise a gaming behaviour dataset
    Analyze {
        /// Dataset CSV (defaults to data.dataset_path)
        #[arg(long)]
        dataset: Option<String>,
        /// Single column to inspect
        #[arg(long)]
        column: Option<String>,
        /// Histogram bins for numeric columns
        #[arg(long, default_value = "10")]
        bins: usize,
        /// Second categorical column for a two-way count table
        #[arg(long, requires = "column")]
        by: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Print a salted credential entry for config.toml
    HashPassword {
        /// Username for the new entry
        username: String,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model and feature layout information
    Info,
}

#[derive(Args)]
struct PlayerArgs {
    /// Age (15-49)
    #[arg(long, required_unless_present = "record")]
    age: Option<String>,
    /// Male or Female
    #[arg(long, default_value = "Male")]
    gender: String,
    /// Europe, USA or Other
    #[arg(long, default_value = "Europe")]
    location: String,
    /// Action, Adventure, Puzzle, RPG, Simulation, Sports, Strategy or Other
    #[arg(long, default_value = "Action")]
    genre: String,
    /// Average play time in hours
    #[arg(long, default_value = "0")]
    play_time: String,
    /// In-game purchases: Yes or No
    #[arg(long, default_value = "No")]
    purchases: String,
    /// Easy, Medium or Hard
    #[arg(long, default_value = "Easy")]
    difficulty: String,
    /// Sessions per week
    #[arg(long, default_value = "0")]
    sessions: String,
    /// Average session duration in minutes
    #[arg(long, default_value = "0")]
    avg_duration: String,
    /// Player level
    #[arg(long, default_value = "0")]
    level: String,
    /// Achievements unlocked
    #[arg(long, default_value = "0")]
    achievements: String,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = run(cli, &config);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Open the login gate for commands that need it
fn open_session(config: &Config, user: Option<&str>, password: Option<&str>) -> Result<SessionContext> {
    let store = CredentialStore::new(config.auth.users.clone());
    let mut ctx = SessionContext::new(Box::new(store));

    if !config.auth.enabled {
        ctx.login_anonymous();
        return Ok(ctx);
    }
    if config.auth.users.is_empty() {
        log::warn!("Authentication is enabled but no users are configured; see `engagement hash-password`");
    }
    ctx.login(user.unwrap_or_default(), password.unwrap_or_default())?;
    Ok(ctx)
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let user = cli.user.as_deref();
    let password = cli.password.as_deref();

    match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(config),
        },
        Commands::HashPassword { username } => commands::hash_password(&username, password),
        Commands::Predict {
            player,
            record,
            format,
        } => {
            let mut ctx = open_session(config, user, password)?;
            let result = commands::predict(config, ctx.require()?, player, record, format);
            ctx.logout();
            result
        }
        Commands::Batch {
            input,
            output,
            format,
        } => {
            let mut ctx = open_session(config, user, password)?;
            let result = commands::batch(config, ctx.require()?, &input, &output, format);
            ctx.logout();
            result
        }
        Commands::Analyze {
            dataset,
            column,
            bins,
            by,
            format,
        } => {
            let mut ctx = open_session(config, user, password)?;
            let dataset = dataset.unwrap_or_else(|| config.data.dataset_path.clone());
            let result = commands::analyze(ctx.require()?, &dataset, column, bins, by, format);
            ctx.logout();
            result
        }
    }
}

mod commands {
    use super::*;
    use engagement::auth::{new_credential, Session};
    use engagement::data::analysis::{
        crosstab, histogram, render_correlation, render_crosstab, render_histogram,
        render_numeric, render_value_counts, summarize, value_counts,
    };
    use engagement::data::{DatasetReport, GamingDataset};
    use engagement::features::{encode, RawPlayerRecord, FEATURE_NAMES};
    use engagement::model::{artifacts_present, model_file};
    use engagement::predict::batch::run_batch_files;
    use engagement::predict::inference::format_prediction;
    use engagement::predict::Predictor;
    use engagement::{EngagementError, EngagementPrediction, PlayerAttributes};
    use std::path::Path;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Copy the trained model and scaler artifacts into model/");
        println!("  2. Run 'engagement hash-password <user>' and add the entry to {}", config_path);
        println!("  3. Run 'engagement predict --user <user> --age 25 --genre RPG ...'");

        Ok(())
    }

    pub fn hash_password(username: &str, password: Option<&str>) -> Result<()> {
        let password = password.ok_or_else(|| {
            EngagementError::Config(
                "Provide the password with --password or ENGAGEMENT_PASSWORD".to_string(),
            )
        })?;
        let entry = new_credential(username, password);

        println!("[[auth.users]]");
        println!("username = {:?}", entry.username);
        println!("salt = {:?}", entry.salt);
        println!("password_sha256 = {:?}", entry.password_sha256);

        Ok(())
    }

    fn player_record(player: PlayerArgs, record: Option<String>) -> Result<RawPlayerRecord> {
        if let Some(path) = record {
            let content = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        Ok(RawPlayerRecord {
            age: player.age.unwrap_or_default(),
            gender: player.gender,
            location: player.location,
            game_genre: player.genre,
            play_time_hours: player.play_time,
            in_game_purchases: player.purchases,
            game_difficulty: player.difficulty,
            sessions_per_week: player.sessions,
            avg_session_duration_minutes: player.avg_duration,
            player_level: player.level,
            achievements_unlocked: player.achievements,
        })
    }

    /// Load the artifacts, then validate and predict one record
    ///
    /// Artifacts come first so a broken model is reported even for bad input.
    pub(crate) fn predict_record(
        config: &Config,
        raw: &RawPlayerRecord,
    ) -> Result<(PlayerAttributes, EngagementPrediction)> {
        let predictor = Predictor::load(config)?;
        let attrs = PlayerAttributes::try_from(raw)?;
        let prediction = predictor.predict(&attrs)?;
        Ok((attrs, prediction))
    }

    pub fn predict(
        config: &Config,
        session: &Session,
        player: PlayerArgs,
        record: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let raw = player_record(player, record)?;
        log::debug!("Predicting for {} (session {})", session.username, session.id);
        let (attrs, prediction) = predict_record(config, &raw)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&prediction, &attrs));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "player": attrs,
                    "features": encode(&attrs).as_slice(),
                    "class": prediction.class,
                    "engagement_level": prediction.level.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Csv => {
                println!("age,gender,location,game_genre,class,engagement_level");
                println!(
                    "{},{},{},{},{},{}",
                    attrs.age,
                    attrs.gender.as_str(),
                    attrs.location.as_str(),
                    attrs.game_genre.as_str(),
                    prediction.class,
                    prediction.level
                );
            }
        }

        Ok(())
    }

    pub fn batch(
        config: &Config,
        session: &Session,
        input: &str,
        output: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let predictor = Predictor::load(config)?;
        log::info!("{} running batch prediction on {}", session.username, input);

        let summary = match run_batch_files(&predictor, Path::new(input), Path::new(output)) {
            Ok(s) => s,
            Err(EngagementError::SchemaMismatch { missing }) => {
                println!("Cannot predict {}: missing column(s) {}", input, missing.join(", "));
                println!("Expected columns: {}", engagement::features::REQUIRED_COLUMNS.join(", "));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Csv => {
                println!("rows,predicted,failed");
                println!("{},{},{}", summary.rows, summary.predicted, summary.failed);
            }
            OutputFormat::Table => {
                println!("Batch Prediction");
                println!("───────────────────────────────");
                println!("  Output:     {}", output);
                println!("  Rows:       {}", summary.rows);
                println!("  Predicted:  {}", summary.predicted);
                println!("  Failed:     {}", summary.failed);
                for (level, count) in &summary.by_level {
                    println!("  {:<10}  {}", level.to_string(), count);
                }
                for err in summary.errors.iter().take(10) {
                    println!("  row {}: {}", err.row, err.message);
                }
                if summary.errors.len() > 10 {
                    println!("  ... {} more failed rows", summary.errors.len() - 10);
                }
            }
        }

        Ok(())
    }

    pub fn analyze(
        session: &Session,
        dataset_path: &str,
        column: Option<String>,
        bins: usize,
        by: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        log::debug!("{} analysing {}", session.username, dataset_path);
        let dataset = GamingDataset::load(Path::new(dataset_path))?;

        let Some(column) = column else {
            let report = DatasetReport::build(&dataset)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                _ => {
                    println!("Dataset: {} ({} rows)\n", dataset_path, report.rows);
                    for (name, counts) in &report.categorical {
                        println!("{}", render_value_counts(name, counts));
                    }
                    println!("{}", render_numeric(&report.numeric));
                    println!("Correlation");
                    print!("{}", render_correlation(&report.correlation));
                }
            }
            return Ok(());
        };

        let name = dataset.resolve(&column)?.to_string();

        if let Some(by) = by {
            let by_name = dataset.resolve(&by)?.to_string();
            let table = crosstab(&dataset.column(&name)?, &dataset.column(&by_name)?);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
                _ => print!("{}", render_crosstab(&name, &by_name, &table)),
            }
            return Ok(());
        }

        if dataset.numeric_columns().contains(&name) {
            let values: Vec<f64> = dataset.numeric_column(&name)?.into_iter().flatten().collect();
            let summary = summarize(&values);
            let hist = histogram(&values, bins);
            match format {
                OutputFormat::Json => {
                    let json = serde_json::json!({ "column": name, "summary": summary, "histogram": hist });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                _ => {
                    if let Some(s) = summary {
                        println!(
                            "{}: count {}, mean {:.2}, std {:.2}, min {:.2}, max {:.2}\n",
                            name, s.count, s.mean, s.std, s.min, s.max
                        );
                    }
                    if let Some(h) = hist {
                        print!("{}", render_histogram(&name, &h));
                    }
                }
            }
        } else {
            let counts = value_counts(&dataset.column(&name)?);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
                OutputFormat::Csv => {
                    println!("value,count,share");
                    for c in &counts {
                        println!("{},{},{:.4}", c.value, c.count, c.share);
                    }
                }
                OutputFormat::Table => print!("{}", render_value_counts(&name, &counts)),
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Format:   {}", config.artifacts.model_format);
        println!("  Model:    {}", model_file(config));
        println!("  Scaler:   {}", config.artifacts.scaler_path);
        println!("  Classes:  {:?}", config.model.classes);
        println!("  Present:  {}", if artifacts_present(config) { "yes" } else { "no" });

        if artifacts_present(config) {
            let predictor = Predictor::load(config)?;
            println!("  Loaded:   {}", predictor.describe());
        }

        println!("\nFeature layout");
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            println!("  [{:>2}] {}", i, name);
        }

        Ok(())
    }
}
