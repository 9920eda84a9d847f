use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tweetgen::api_client::HttpApi;
use tweetgen::generation::{GenerationClient, ModelCapability, OpenAiChat};
use tweetgen::imaging::{RustBackend, reduce_image};
use tweetgen::server::{self, AppState};
use tweetgen::session::{TweetApi, Workflow};
use tweetgen::share::{ShareService, ShareStore, SqliteShareStore};
use tweetgen::validate::{MenusField, RawGenerationFields};
use tweetgen::{config, output};

/// Session token used for the single CLI session.
const CLI_SESSION: &str = "cli";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "tweetgen")]
#[command(about = "Turn food photos into tweet drafts in three tones")]
#[command(long_about = "\
Turn food photos into tweet drafts in three tones

Upload up to four photos with the menus you ate and how much you liked it;
the server asks a multimodal model for three short posts (솔직톤, 드립톤,
극단톤) and can store a set behind a share link with a preview card.

Configuration is read from tweetgen.toml (optional) and the environment:

  OPENAI_API_KEY   model credential (never read from the file)
  DATABASE_URL     share store location, overrides [storage].database_url
  APP_ENV          environment name reported by /api/health
  RUST_LOG         log filter, defaults to \"info\"

Run 'tweetgen gen-config' to generate a documented tweetgen.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Shrink images under the configured byte budget
    Compress {
        /// Images to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Where to write `<stem>.<ext>` outputs
        #[arg(long, default_value = "compressed")]
        out_dir: PathBuf,
    },
    /// Generate tweet drafts through a running server
    Generate {
        /// Food photo (repeat for up to four)
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
        /// Menu item (repeat for several)
        #[arg(long = "menu", required = true)]
        menus: Vec<String>,
        /// One of: 애매함, 나쁘지 않음, 맛있음, 개쩜
        #[arg(long)]
        satisfaction: String,
        #[arg(long)]
        restaurant: Option<String>,
        #[arg(long, default_value = "http://localhost:5000")]
        server: String,
        /// Also store the result and print its share link
        #[arg(long)]
        share: bool,
    },
    /// Print a shared result
    Show {
        id: String,
        #[arg(long, default_value = "http://localhost:5000")]
        server: String,
    },
    /// Print a stock tweetgen.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let app_config = load(&cli.config)?;
            let model: Arc<dyn ModelCapability> = Arc::new(OpenAiChat::new(&app_config.model));
            let store: Arc<dyn ShareStore> =
                Arc::new(SqliteShareStore::open(&app_config.storage.database_url)?);
            let state = AppState::new(
                app_config,
                GenerationClient::new(model),
                ShareService::new(store),
            );
            server::serve(state).await?;
        }
        Command::Compress { files, out_dir } => {
            let app_config = load(&cli.config)?;
            let options = app_config.images.to_reduce_options();
            let backend = RustBackend::new();
            std::fs::create_dir_all(&out_dir)?;
            for (i, path) in files.iter().enumerate() {
                let source = std::fs::read(path)?;
                let reduced = reduce_image(&backend, &source, &options)?;
                let target =
                    out_dir.join(format!("{}.{}", file_stem(path), reduced.format.extension()));
                std::fs::write(&target, &reduced.bytes)?;
                output::print_compress_result(i + 1, &display_name(path), source.len(), &reduced);
            }
        }
        Command::Generate {
            images,
            menus,
            satisfaction,
            restaurant,
            server,
            share,
        } => {
            let app_config = load(&cli.config)?;
            let files = images
                .iter()
                .map(std::fs::read)
                .collect::<Result<Vec<_>, _>>()?;
            let fields = RawGenerationFields {
                images: Vec::new(),
                restaurant_name: restaurant,
                menus: Some(MenusField::List(menus)),
                satisfaction: Some(satisfaction),
            };
            let mut workflow = Workflow::new(
                HttpApi::new(&server),
                app_config.images.to_reduce_options(),
                Duration::from_secs(app_config.session.ttl_secs),
            );
            let response = match workflow.generate(CLI_SESSION, files, fields).await {
                Ok(response) => response,
                Err(notice) => {
                    output::print_notice(&notice);
                    std::process::exit(1);
                }
            };
            output::print_variations(&response);
            if share {
                let origin = workflow.api().base_url().to_string();
                match workflow.share(CLI_SESSION, &origin).await {
                    Ok(url) => output::print_share_link(&url),
                    Err(notice) => {
                        output::print_notice(&notice);
                        std::process::exit(1);
                    }
                }
            }
        }
        Command::Show { id, server } => {
            let api = HttpApi::new(&server);
            match api.get_share(&id).await {
                Ok(record) => output::print_record(&record),
                Err(e) => {
                    eprintln!("{}", e.display_message());
                    std::process::exit(1);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// A missing config file means stock defaults.
fn load(path: &Path) -> anyhow::Result<config::AppConfig> {
    Ok(config::load_config(Some(path))?)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
