use db_connect::config::{load_config, DatabaseConfig};
use db_connect::{Db, DbError, NamedParams};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "db.sqlite3";

const LIST_TABLES_SQL: &str = "
SELECT
    name
FROM
    sqlite_schema
WHERE
    type = 'table' AND
    name NOT LIKE 'sqlite_%'
";

const USAGE: &str = "usage: db-connect [--config FILE] [DATABASE] [SQL]";

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    database: Option<String>,
    sql: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                let path = iter.next().ok_or("--config needs a file argument")?;
                parsed.config = Some(path.clone());
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ if parsed.database.is_none() => parsed.database = Some(arg.clone()),
            _ if parsed.sql.is_none() => parsed.sql = Some(arg.clone()),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }
    Ok(Some(parsed))
}

/// Prints every batch of the query as one JSON line.
fn run(args: Args) -> Result<(), DbError> {
    let mut database = match &args.config {
        Some(path) => load_config(path)?.database,
        None => DatabaseConfig {
            path: DEFAULT_DATABASE.to_string(),
            ..DatabaseConfig::default()
        },
    };
    if let Some(path) = args.database {
        database.path = path;
    }
    let sql = args.sql.as_deref().unwrap_or(LIST_TABLES_SQL);

    info!("Opening database {}", database.path);
    Db::scoped_with(&database, |db| {
        let mut cursor = db.batch_cursor();
        for batch in cursor.fetch_many_as_map(sql, &NamedParams::new())? {
            println!("{}", serde_json::to_string(&batch?)?);
        }
        Ok(())
    })
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(msg) => {
            eprintln!("db-connect: {msg}\n{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        error!("db-connect failed: {}", e);
        eprintln!("db-connect: {e}");
        std::process::exit(1);
    }
}
