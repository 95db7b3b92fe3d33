use clap::{Parser, Subcommand};
use placerank::core::{format_distance, Trend};
use placerank::{config, RankQuery, RankingEngine};

#[derive(Parser)]
#[command(name = "placerank-cli")]
#[command(about = "Local search position estimator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (overrides PLACERANK_DB)
    #[arg(short, long)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a place against nearby competitors
    Rank {
        /// Provider place id
        place_id: String,

        /// Text the user typed (drives category detection)
        #[arg(short, long)]
        text: Option<String>,

        /// Bypass the details cache
        #[arg(long)]
        no_cache: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which category a text would be searched under
    Classify {
        /// Free text
        text: String,

        /// Provider category tags
        #[arg(short = 'T', long = "type")]
        types: Vec<String>,
    },

    /// Get cache statistics
    Stats,

    /// Clean up old cache entries
    Cleanup {
        /// Maximum age in hours
        #[arg(short, long, default_value = "24")]
        max_age_hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placerank=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::load_config()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let engine = RankingEngine::from_config(&config).await?;

    match cli.command {
        Commands::Rank { place_id, text, no_cache, json } => {
            let query = RankQuery {
                place_id,
                text,
                use_cache: !no_cache,
            };

            let report = engine.rank(query).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("📍 {}", report.target.display_name());
            println!("   Rating: {:.1}⭐ ({} reviews)", report.target.rating, report.target.review_count);
            println!(
                "   Category: {} [{}]",
                report.classification.category,
                report.classification.search_term()
            );
            println!("\n📊 Estimated position: {}", report.position);
            println!("   Ranked: {} | Ahead of you: {}", report.total_ranked, report.total_ahead);
            println!("   Cached: {} | Latency: {:.2}ms", report.from_cache, report.latency_ms);

            if report.outranking.is_empty() {
                println!("\nNo competitors ahead in the area.");
            } else {
                println!("\n🏆 Most visible in your area:");
                for (i, entry) in report.outranking.iter().enumerate() {
                    println!(
                        "   {}. {} ⭐ {:.1} · {} reviews · 📍 {} (score {:.1})",
                        i + 1,
                        entry.place.name,
                        entry.place.rating,
                        entry.place.review_count,
                        format_distance(entry.distance_m()),
                        entry.score
                    );
                }
            }

            if let Some(analysis) = report.analysis {
                println!("\n🔍 Comparison with competitors ahead:");
                println!(
                    "   Average: {:.1}⭐ – {} reviews",
                    analysis.avg_rating,
                    analysis.avg_review_count.round()
                );
                println!(
                    "   You:     {:.1}⭐ – {} reviews",
                    report.target.rating, report.target.review_count
                );
                match analysis.trend {
                    Trend::BelowAverage => println!("   ⚠️ Your rating is below the local average."),
                    Trend::OnPar => println!("   😐 Your rating is close to the local average."),
                }
            }
        }

        Commands::Classify { text, types } => {
            let classification = engine.classify(&text, types.as_slice());

            println!("🏷️  Category: {}", classification.category);
            println!("   Keyword: {}", classification.keyword);
            println!("   Source: {:?}", classification.source);
        }

        Commands::Stats => {
            let stats = engine.cache_stats().await?;

            println!("📊 Cache Statistics:");
            println!("   Total entries: {}", stats.total_entries);
            println!("   Total hits: {}", stats.total_hits);
            println!("   Avg hits/entry: {:.2}", stats.avg_hit_count);

            if let Some(oldest) = stats.oldest_entry {
                println!("   Oldest entry: {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            }

            if let Some(newest) = stats.newest_entry {
                println!("   Newest entry: {}", newest.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Commands::Cleanup { max_age_hours } => {
            println!("🧹 Cleaning up entries older than {} hours...", max_age_hours);

            let deleted = engine.cleanup_cache(max_age_hours).await?;

            println!("✅ Deleted {} entries", deleted);
        }
    }

    Ok(())
}
