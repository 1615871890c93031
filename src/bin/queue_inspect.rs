use anyhow::{Context, Result, bail};
use attendance_sync::{AppConfig, ConnectionPool, SqliteKeyValueStore, TaskStore};
use std::env;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    database_url: Option<String>,
    dead_letters: bool,
    pretty: bool,
}

fn usage() -> &'static str {
    "Usage: queue_inspect [--database-url <url>] [--dead-letters] [--pretty]"
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args)?;
    let database_url = resolve_database_url(&options);

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let payload = rt.block_on(async {
        dump(&database_url, &options)
            .await
            .with_context(|| format!("Failed to read task store at {database_url}"))
    })?;

    println!("{payload}");
    Ok(())
}

async fn dump(database_url: &str, options: &CliOptions) -> Result<String> {
    let pool = ConnectionPool::new(database_url, 1).await?;
    pool.migrate().await?;
    let store = TaskStore::new(Arc::new(SqliteKeyValueStore::new(pool.get_pool().clone())));

    let payload = if options.dead_letters {
        to_json(&store.dead_letters().await?, options.pretty)?
    } else {
        to_json(&store.drain().await?, options.pretty)?
    };
    pool.close().await;
    Ok(payload)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CliOptions::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--database-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--database-url requires a value\n{}", usage())
                })?;
                options.database_url = Some(value);
            }
            "--dead-letters" => {
                options.dead_letters = true;
            }
            "--pretty" => {
                options.pretty = true;
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    Ok(options)
}

fn resolve_database_url(options: &CliOptions) -> String {
    if let Some(url) = &options.database_url {
        return url.clone();
    }
    AppConfig::from_env().database.url
}
