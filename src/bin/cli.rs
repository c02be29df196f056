//! ShardStore CLI
//!
//! Command-line interface over the blob store. `put`/`get` take an explicit
//! bucket; the remaining commands operate on a bucket chosen with
//! `--bucket` (default `"default"`).
//!
//! Exit codes: 0 on success, 1 on usage or I/O error, 2 on not-found.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use shardstore::{BlobStore, StoreError};

/// ShardStore CLI
#[derive(Parser, Debug)]
#[command(name = "shardstore")]
#[command(about = "Bucketed, versioned blob store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a store root (creates the default bucket)
    Init {
        root: PathBuf,

        /// Bucket to create
        #[arg(long, default_value = "default")]
        bucket: String,
    },

    /// Store a file's contents under a key
    Put {
        root: PathBuf,
        bucket: String,
        key: String,
        file: PathBuf,

        /// Version id to store under (latest-wins retention applies)
        #[arg(long)]
        version: Option<String>,
    },

    /// Fetch a key into a file
    Get {
        root: PathBuf,
        bucket: String,
        key: String,
        out: PathBuf,

        /// Version id to fetch (defaults to the latest)
        #[arg(long)]
        version: Option<String>,
    },

    /// Check whether a key exists (prints 1/0)
    Exists {
        root: PathBuf,
        key: String,

        #[arg(long, default_value = "default")]
        bucket: String,
    },

    /// List all keys in a bucket
    List {
        root: PathBuf,

        #[arg(long, default_value = "default")]
        bucket: String,
    },

    /// Remove a key (all versions, or one with --version)
    Rm {
        root: PathBuf,
        key: String,

        #[arg(long, default_value = "default")]
        bucket: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Print the size of a key's latest version
    Stat {
        root: PathBuf,
        key: String,

        #[arg(long, default_value = "default")]
        bucket: String,
    },

    /// List the stored version ids of a key
    Versions {
        root: PathBuf,
        key: String,

        #[arg(long, default_value = "default")]
        bucket: String,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    match run(args.command) {
        Ok(code) => code,
        Err(StoreError::NotFound) => {
            eprintln!("Not found");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, StoreError> {
    match command {
        Commands::Init { root, bucket } => {
            let store = BlobStore::new(&root);
            store.init(&bucket)?;
            println!("Initialized at {}", root.display());
        }
        Commands::Put {
            root,
            bucket,
            key,
            file,
            version,
        } => {
            let store = BlobStore::new(root);
            store.init(&bucket)?;
            store.put_from_file(&bucket, key.as_bytes(), &file, version.as_deref())?;
            let size = store.size_of(&bucket, key.as_bytes(), version.as_deref())?;
            println!("Stored key '{key}' size={size}");
        }
        Commands::Get {
            root,
            bucket,
            key,
            out,
            version,
        } => {
            let store = BlobStore::new(root);
            store.get_to_file(&bucket, key.as_bytes(), &out, version.as_deref())?;
            let size = store.size_of(&bucket, key.as_bytes(), version.as_deref())?;
            println!("Wrote to {} size={}", out.display(), size);
        }
        Commands::Exists { root, key, bucket } => {
            let store = BlobStore::new(root);
            let exists = store.exists(&bucket, key.as_bytes())?;
            println!("{}", if exists { "1" } else { "0" });
            if !exists {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::List { root, bucket } => {
            let store = BlobStore::new(root);
            for key in store.list(&bucket)? {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Rm {
            root,
            key,
            bucket,
            version,
        } => {
            let store = BlobStore::new(root);
            if !store.remove(&bucket, key.as_bytes(), version.as_deref())? {
                eprintln!("Not found: {key}");
                return Ok(ExitCode::from(2));
            }
            println!("Removed '{key}'");
        }
        Commands::Stat { root, key, bucket } => {
            let store = BlobStore::new(root);
            let size = store.size_of(&bucket, key.as_bytes(), None)?;
            println!("size={size}");
        }
        Commands::Versions { root, key, bucket } => {
            let store = BlobStore::new(root);
            let versions = store.list_versions(&bucket, key.as_bytes())?;
            if versions.is_empty() {
                return Err(StoreError::NotFound);
            }
            for v in versions {
                if v.is_empty() {
                    println!("(unversioned)");
                } else {
                    println!("{v}");
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
