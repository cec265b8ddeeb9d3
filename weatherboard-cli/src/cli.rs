use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use weatherboard_core::{
    Config, DEFAULT_LEVEL, DEFAULT_LIMIT, Leaderboard, NewScore, ScoreRecord, ScoreStore,
    WeatherRecord, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherboard", version, about = "Weather lookups and a local high-score table")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather for a city.
    Weather {
        /// City name, e.g. "London" or "São Paulo".
        city: String,
    },

    /// Manage the high-score table.
    Scores {
        #[command(subcommand)]
        action: ScoresCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScoresCommand {
    /// Record a new score.
    Add {
        player: String,
        score: i64,

        #[arg(long, default_value = DEFAULT_LEVEL)]
        level: String,

        /// Completion time in seconds.
        #[arg(long, default_value_t = 0.0)]
        time: f64,
    },

    /// Show the best scores, optionally for one level.
    Top {
        #[arg(long)]
        level: Option<String>,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Print how many scores are stored.
    Count,

    /// Delete every stored score.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!(command = ?self.command, "Running command");
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(&mut config),
            Command::Weather { city } => show_weather(&config, &city).await,
            Command::Scores { action } => {
                let path = config.database_path()?;
                let store = ScoreStore::open_at(&path).with_context(|| {
                    format!("Failed to open score database: {}", path.display())
                })?;
                let board = Leaderboard::new(Arc::new(store));

                let result = run_scores(&board, action).await;
                board.store().close()?;
                result
            }
        }
    }
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    if !config.api_config().is_configured() {
        anyhow::bail!("That does not look like a usable API key.");
    }

    config.save()?;
    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show_weather(config: &Config, city: &str) -> anyhow::Result<()> {
    let provider = provider_from_config(config);

    match provider.fetch(city).await {
        Ok(record) => {
            println!("{}", format_weather(&record));
            Ok(())
        }
        Err(e) => {
            let status = e.user_message();
            Err(anyhow::Error::new(e).context(status))
        }
    }
}

async fn run_scores(board: &Leaderboard, action: ScoresCommand) -> anyhow::Result<()> {
    match action {
        ScoresCommand::Add { player, score, level, time } => {
            let entry = NewScore::new(player, score).level(level).completion_time(time);
            match board.add(entry).await {
                Ok(record) => println!("Added #{}: {record}", record.id),
                Err(e) => {
                    let status = e.user_message();
                    return Err(anyhow::Error::new(e).context(status));
                }
            }
        }
        ScoresCommand::Top { level, limit } => {
            let scores = match &level {
                Some(level) => board.top_for_level(level, limit).await,
                None => board.top(limit).await,
            };
            if scores.is_empty() {
                println!("No high scores yet.");
            } else {
                print!("{}", format_table(&scores));
            }
        }
        ScoresCommand::Count => println!("{}", board.count().await),
        ScoresCommand::Clear { yes } => {
            let confirmed = yes
                || Confirm::new("Delete all high scores?")
                    .with_default(false)
                    .prompt()
                    .context("Failed to read confirmation")?;

            if !confirmed {
                println!("Nothing deleted.");
                return Ok(());
            }

            if let Err(e) = board.clear_all().await {
                let status = e.user_message();
                return Err(anyhow::Error::new(e).context(status));
            }
            println!("All high scores cleared.");
        }
    }

    Ok(())
}

fn format_weather(record: &WeatherRecord) -> String {
    format!(
        "City: {}\n\
         Temperature: {:.1}°C (feels like {:.1}°C)\n\
         Description: {}\n\
         Humidity: {}%\n\
         Pressure: {} hPa",
        record.city_name,
        record.temperature_c,
        record.feels_like_c,
        record.description,
        record.humidity_pct,
        record.pressure_hpa,
    )
}

fn format_table(scores: &[ScoreRecord]) -> String {
    scores
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            format!(
                "{:>3}. {}  [{}]\n",
                rank + 1,
                s,
                s.achieved_at.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect()
}
