use anyhow::Result;
use tourney_ops::database_ops::db::Db;
use tourney_ops::database_ops::schema;
use tourney_ops::util::env;
use tracing::error;
use tracing_subscriber::EnvFilter;

const TABLE: &str = "matches";
const COLUMN: &str = "knockoutStage";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    env::bootstrap_cli("add_knockout_column");

    // Missing configuration is the only hard-exit path; checked before any
    // connection attempt.
    let database_url = match env::db_url() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("ERROR: DATABASE_URL not found in environment or .env file");
            std::process::exit(1);
        }
    };

    println!("Connecting to database...");
    if let Err(err) = run(&database_url).await {
        error!(error = %err, "column ensure aborted; nothing committed");
        println!("\n❌ Error: {err:#}");
        println!("\nMake sure:");
        println!("1. Database is running");
        println!("2. DATABASE_URL in .env is correct");
        println!("3. The role in the DSN is allowed to ALTER the matches table");
    }
    Ok(())
}

async fn run(database_url: &str) -> Result<()> {
    let db = Db::connect(database_url, 1).await?;
    println!("✓ Connected successfully");

    if schema::column_exists(&db, TABLE, COLUMN).await? {
        println!("⚠ Column '{COLUMN}' already exists. Nothing to do.");
        return Ok(());
    }

    println!("Adding '{COLUMN}' column to {TABLE} table...");
    schema::add_nullable_text_column(&db, TABLE, COLUMN).await?;
    println!("✓ Column '{COLUMN}' added successfully!");

    // Readback so the operator sees what the database actually created.
    if let Some(info) = schema::column_info(&db, TABLE, COLUMN).await? {
        println!(
            "✓ Verified: Column '{}' with type '{}'",
            info.name, info.data_type
        );
    }

    let match_count = schema::count_rows(&db, TABLE).await?;
    println!("\n✓ Database updated! Total matches: {match_count}");
    println!("✓ All existing matches have {COLUMN} = NULL (pool matches)");
    println!("\nYou can now generate knockout stages in the admin panel!");

    println!("\n✅ Done!");
    Ok(())
}
