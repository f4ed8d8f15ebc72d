use anyhow::{anyhow, Error, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use triplestore_client::bindings::ResponseShape;
use triplestore_client::config::{EndpointConfig, Triplestore};
use triplestore_client::endpoint::{Endpoint, QueryOptions};
use triplestore_client::prefix::{parse_prefixes, PrefixMap};
use triplestore_client::transform::{self, QueryOutput, Transform, TransformOptions};

#[derive(Debug, Parser)]
#[command(name = "tsclient")]
#[command(about = "Query RDF triplestores and reformat SPARQL results")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Endpoint configuration file (JSON); command line options override its values
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the triplestore, e.g. http://localhost:7200
    #[clap(long, global = true)]
    base_url: Option<String>,
    /// Repository (dataset, database) to address
    #[clap(long, short, global = true)]
    repository: Option<String>,
    /// Triplestore flavor: one of [graphdb, fuseki, stardog, qlever]
    #[clap(long, short, global = true)]
    triplestore: Option<Triplestore>,
    /// User name for HTTP basic authentication
    #[clap(long, short, global = true)]
    username: Option<String>,
    /// Password for HTTP basic authentication
    #[clap(long, short, global = true)]
    password: Option<String>,
    /// Bearer token sent instead of basic authentication
    #[clap(long, global = true)]
    token: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Write the endpoint configuration given on the command line to a file.
    Init {
        /// Destination of the configuration file.
        file: PathBuf,
    },
    /// Print the effective endpoint configuration.
    Show,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a SPARQL query against the endpoint
    Query {
        /// The query text; read from --file when omitted
        sparql: Option<String>,
        /// File containing the query
        #[clap(long, short)]
        file: Option<PathBuf>,
        /// Output transformation: one of [default, toJSON, toCSV, toTSV]
        #[clap(long)]
        transform: Option<Transform>,
        /// Keep only the part of values after the last '#'
        #[clap(long, action, default_value = "false")]
        drop_prefixes: bool,
        /// Compact IRIs with the registered prefixes
        #[clap(long, action, default_value = "false")]
        replace_prefixes: bool,
        /// Request QLever's columnar result format (QLever only)
        #[clap(long, action, default_value = "false")]
        qlever_bindings: bool,
        /// Write the result to this file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Run a SPARQL update against the endpoint
    Update {
        /// The update text; read from --file when omitted
        sparql: Option<String>,
        /// File containing the update
        #[clap(long, short)]
        file: Option<PathBuf>,
    },
    /// Transform a saved query response without contacting a triplestore
    Format {
        /// JSON file holding the response
        payload: PathBuf,
        /// Output transformation: one of [default, toJSON, toCSV, toTSV]
        #[clap(long, default_value = "toJSON")]
        transform: Transform,
        /// Layout of the response: one of [sparql, qlever]
        #[clap(long, default_value = "sparql")]
        shape: ResponseShape,
        /// Keep only the part of values after the last '#'
        #[clap(long, action, default_value = "false")]
        drop_prefixes: bool,
        /// Compact IRIs with the registered prefixes
        #[clap(long, action, default_value = "false")]
        replace_prefixes: bool,
        /// Take the prefixes from the PREFIX declarations of this SPARQL file
        #[clap(long)]
        prefixes_from: Option<PathBuf>,
        /// Write the result to this file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the PREFIX declarations found in a SPARQL file as JSON
    Prefixes {
        /// SPARQL file to scan
        file: PathBuf,
    },
    /// Manage endpoint configuration files
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Prints the version of the tsclient binary
    Version,
}

impl Cli {
    /// Builds the endpoint configuration from --config, overridden by any connection
    /// options given on the command line.
    fn endpoint_config(&self) -> Result<EndpointConfig> {
        let Some(path) = &self.config else {
            let base_url = self
                .base_url
                .clone()
                .ok_or_else(|| anyhow!("Either --config or --base-url is required"))?;
            let mut builder = EndpointConfig::builder().base_url(base_url);
            if let Some(repository) = &self.repository {
                builder = builder.repository(repository.clone());
            }
            if let Some(triplestore) = self.triplestore {
                builder = builder.triplestore(triplestore);
            }
            if let Some(username) = &self.username {
                builder = builder.username(username.clone());
            }
            if let Some(password) = &self.password {
                builder = builder.password(password.clone());
            }
            return Ok(builder.build()?);
        };

        debug!("Loading endpoint configuration from {}", path.display());
        let mut config = EndpointConfig::from_file(path)?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(repository) = &self.repository {
            config.repository = Some(repository.clone());
        }
        if let Some(triplestore) = self.triplestore {
            config.triplestore = triplestore;
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        Ok(config)
    }

    fn endpoint(&self) -> Result<Endpoint> {
        let config = self.endpoint_config()?;
        if self.verbose || self.debug {
            config.print();
        }
        let mut endpoint = Endpoint::new(config)?;
        if let Some(token) = &self.token {
            endpoint.set_access_token(token);
        }
        Ok(endpoint)
    }
}

fn read_sparql(sparql: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (sparql, file) {
        (Some(text), None) => Ok(text),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (Some(_), Some(_)) => Err(anyhow!("Give either the SPARQL text or --file, not both")),
        (None, None) => Err(anyhow!("No SPARQL given; pass it as an argument or with --file")),
    }
}

fn write_output(output: &QueryOutput, path: Option<&Path>) -> Result<()> {
    let text = output.to_text()?;
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Wrote result to {}", path.display());
        }
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    triplestore_client::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    triplestore_client::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if TRIPLESTORE_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    match &cmd.command {
        Commands::Query {
            sparql,
            file,
            transform,
            drop_prefixes,
            replace_prefixes,
            qlever_bindings,
            output,
        } => {
            let sparql = read_sparql(sparql.clone(), file.clone())?;
            let endpoint = cmd.endpoint()?;
            let options = QueryOptions {
                transform: *transform,
                use_qlever_bindings: qlever_bindings.then_some(true),
                drop_prefixes: *drop_prefixes,
                replace_prefixes: *replace_prefixes,
                delimited: None,
            };
            let result = endpoint.query(&sparql, &options)?;
            write_output(&result, output.as_deref())?;
        }
        Commands::Update { sparql, file } => {
            let sparql = read_sparql(sparql.clone(), file.clone())?;
            let endpoint = cmd.endpoint()?;
            let response = endpoint.update(&sparql)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Format {
            payload,
            transform,
            shape,
            drop_prefixes,
            replace_prefixes,
            prefixes_from,
            output,
        } => {
            let prefixes = match prefixes_from {
                Some(path) => parse_prefixes(&std::fs::read_to_string(path)?)
                    .into_iter()
                    .collect::<PrefixMap>(),
                None if cmd.config.is_some() => cmd.endpoint_config()?.prefixes,
                None => PrefixMap::well_known(),
            };
            let payload: Value = serde_json::from_str(&std::fs::read_to_string(payload)?)?;
            let options = TransformOptions {
                transform: *transform,
                drop_prefixes: *drop_prefixes,
                replace_prefixes: *replace_prefixes,
                delimited: None,
            };
            let result = transform::apply(payload, *shape, &options, &prefixes)?;
            write_output(&result, output.as_deref())?;
        }
        Commands::Prefixes { file } => {
            let prefixes = parse_prefixes(&std::fs::read_to_string(file)?);
            println!("{}", serde_json::to_string_pretty(&prefixes)?);
        }
        Commands::Config(ConfigCommands::Init { file }) => {
            let config = cmd.endpoint_config()?;
            config.save_to_file(file)?;
            println!("Wrote configuration to {}", file.display());
        }
        Commands::Config(ConfigCommands::Show) => {
            cmd.endpoint_config()?.print();
        }
        Commands::Version => {
            println!("tsclient {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
