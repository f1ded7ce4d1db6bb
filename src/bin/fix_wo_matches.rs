use anyhow::Result;
use tourney_ops::database_ops::db::Db;
use tourney_ops::database_ops::walkover::fix_walkover_matches;
use tourney_ops::util::env;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    env::bootstrap_cli("fix_wo_matches");

    // Missing configuration is the only hard-exit path; checked before any
    // connection attempt.
    let database_url = match env::db_url() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("ERROR: DATABASE_URL not found in environment or .env file");
            std::process::exit(1);
        }
    };

    let dry_run = env::env_flag("DRY_RUN", false);
    let max_conns: u32 = env::env_parse("DB_MAX_CONNS", 1);

    println!("Connecting to database...");
    if let Err(err) = run(&database_url, max_conns, dry_run).await {
        error!(error = %err, "walkover correction aborted; nothing committed");
        println!("\n❌ Error: {err:#}");
        println!("\nMake sure:");
        println!("1. Database is running");
        println!("2. DATABASE_URL in .env is correct");
        println!("3. The role in the DSN is allowed to UPDATE the matches table");
    }
    Ok(())
}

async fn run(database_url: &str, max_conns: u32, dry_run: bool) -> Result<()> {
    let db = Db::connect(database_url, max_conns).await?;
    println!("✓ Connected successfully\n");

    let summary = fix_walkover_matches(&db, dry_run).await?;

    if summary.total == 0 {
        println!("⚠ No WO matches found (home_absent or away_absent)");
        return Ok(());
    }

    if summary.updated == 0 {
        println!("\n✓ All WO matches are already correct. No updates needed.");
    } else if dry_run {
        println!(
            "\n✓ Dry run: {} of {} WO matches would be updated (nothing written).",
            summary.updated, summary.total
        );
    } else {
        println!("\n✅ Successfully updated {} WO matches!", summary.updated);
        println!("\nSummary:");
        println!("- WO matches now have proper winners");
        println!("- Scores set to 1-0 or 0-1");
        println!("- Status set to 'completed'");
        println!("\nRefresh your fixtures page to see the changes!");
    }
    Ok(())
}
