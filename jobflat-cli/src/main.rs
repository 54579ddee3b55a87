use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use jobflat::{display, export, flatten, CollectionSource, JobFlatError};
use jobflat::{MongoSource, Resolver, RootQuery};
use std::collections::HashSet;
use std::fs::File;
use std::process;

/// jobflat CLI — export denormalized job records from the document store
#[derive(Parser)]
#[command(name = "jobflat", version, about)]
struct Cli {
    /// Connection string, taken from the environment (never pass credentials
    /// on the command line)
    #[arg(long, env = "JOBFLAT_URI", hide_env_values = true)]
    uri: String,

    /// Database name
    #[arg(long, default_value = "prod")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve references for a batch of root documents and write CSV and
    /// JSON exports
    Export {
        /// Root collection name
        #[arg(long, default_value = "Job")]
        collection: String,

        /// Number of root documents to export
        #[arg(long, default_value_t = 10)]
        limit: i64,

        /// Reference levels to inline
        #[arg(long, default_value_t = 2)]
        depth: usize,

        /// Only roots created at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        /// Only roots created at or before this RFC 3339 timestamp
        #[arg(long)]
        until: Option<DateTime<Utc>>,

        /// CSV output path
        #[arg(long, default_value = "flattened_jobs.csv")]
        csv_out: String,

        /// JSON output path
        #[arg(long, default_value = "jobs_with_relationships.json")]
        json_out: String,
    },

    /// List collection names in the database
    Collections,

    /// Show a sample document's fields and a simplified summary
    Inspect {
        /// Collection name
        #[arg(long, default_value = "Job")]
        collection: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = MongoSource::connect(&cli.uri, &cli.database)?;

    match cli.command {
        Command::Export {
            collection,
            limit,
            depth,
            since,
            until,
            csv_out,
            json_out,
        } => {
            let names = source.collection_names()?;
            if !names.contains(&collection) {
                return Err(Box::new(JobFlatError::MissingCollection { name: collection }));
            }

            let query = RootQuery {
                limit,
                created_after: since,
                created_before: until,
            };
            let resolver = Resolver::new(&source).with_max_depth(depth);
            let resolved = resolver.resolve_batch(&collection, &query)?;
            let rows: Vec<_> = resolved.iter().map(flatten).collect();
            let column_count = rows
                .iter()
                .flat_map(|row| row.keys())
                .collect::<HashSet<_>>()
                .len();

            export::write_csv(File::create(&csv_out)?, &rows)?;
            export::write_json_tree(File::create(&json_out)?, &resolved)?;

            println!(
                "Exported {} documents ({} columns) to {}",
                resolved.len(),
                column_count,
                csv_out
            );
            println!("Wrote resolved document trees to {json_out}");
        }

        Command::Collections => {
            for name in source.collection_names()? {
                println!("{name}");
            }
        }

        Command::Inspect { collection } => {
            let roots = source.fetch_roots(&collection, &RootQuery::with_limit(1))?;
            let doc = roots.first().ok_or_else(|| {
                JobFlatError::Other(format!("Collection '{collection}' is empty"))
            })?;

            println!("Fields:");
            for (key, value) in doc.iter() {
                println!("- {key}: {}", display::type_name(value));
            }
            println!();

            let summary = display::summarize(doc);
            println!(
                "{}",
                serde_json::to_string_pretty(&export::document_to_json(&summary))?
            );
        }
    }

    Ok(())
}
