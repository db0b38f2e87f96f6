//! # Lienzo CLI
//!
//! Command-line interface for data-bound canvas templates.
//!
//! ## Usage
//!
//! ```bash
//! # Run the editor API
//! lienzo serve --listen 127.0.0.1:8080
//!
//! # Render one PNG per row into products_<timestamp>.zip
//! lienzo export --data products.json --out dist/
//!
//! # Print the template inferred from a dataset
//! lienzo infer --data products.xlsx
//!
//! # Render a single row
//! lienzo preview --data products.json --row 2 --png row2.png
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use lienzo::{
    config::{EditorConfig, ServerConfig},
    export::{Exporter, RasterSnapshot, Snapshot},
    import::{load_dataset, HeaderMode},
    model::{CanvasSettings, Dataset},
    render::Surface,
    server, template, CanvasStore, LienzoError,
};

/// Lienzo - Data-bound canvas template renderer
#[derive(Parser, Debug)]
#[command(name = "lienzo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP editor API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        #[command(flatten)]
        editor: EditorArgs,
    },

    /// Render every row of a dataset into a zip archive
    Export {
        #[command(flatten)]
        data: DataArgs,

        /// Directory to write the archive into
        #[arg(long, default_value = ".")]
        out: PathBuf,

        #[command(flatten)]
        editor: EditorArgs,
    },

    /// Print the template inferred from a dataset as JSON
    Infer {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Render a single data row to PNG
    Preview {
        #[command(flatten)]
        data: DataArgs,

        /// Row to render (1-based)
        #[arg(long, default_value = "1")]
        row: usize,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        #[command(flatten)]
        editor: EditorArgs,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Dataset file: .json (objects or arrays), .csv, or a workbook (.xlsx, .xls, .ods)
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// Whether the first row holds column names (auto: sheets yes, JSON arrays by heuristic)
    #[arg(long, value_enum, default_value_t = HeaderMode::Auto)]
    headers: HeaderMode,
}

#[derive(Args, Debug)]
struct EditorArgs {
    /// Canvas width in pixels
    #[arg(long, default_value = "800")]
    width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value = "600")]
    height: f64,

    /// Canvas background color
    #[arg(long, default_value = "#ffffff")]
    background: String,

    /// TrueType font for text blocks (built-in bitmap font if omitted)
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Milliseconds to wait between applying a row and capturing it
    #[arg(long, default_value = "50")]
    settle_ms: u64,

    /// Number of preview rows kept by the editor
    #[arg(long, default_value = "5")]
    preview_rows: usize,

    /// Seconds before a remote image fetch gives up
    #[arg(long, default_value = "10")]
    fetch_timeout: u64,

    /// Decoded images kept in memory between renders
    #[arg(long, default_value = "64")]
    image_cache: usize,
}

impl EditorArgs {
    fn into_config(self) -> Result<EditorConfig, LienzoError> {
        let config = EditorConfig {
            canvas: CanvasSettings {
                width: self.width,
                height: self.height,
                background_color: self.background,
                ..Default::default()
            },
            preview_rows: self.preview_rows,
            settle: Duration::from_millis(self.settle_ms),
            font_path: self.font,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            image_cache_entries: self.image_cache,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lienzo=info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LienzoError> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve { listen, editor } => {
            let config = ServerConfig {
                listen_addr: listen,
                editor: editor.into_config()?,
            };
            runtime.block_on(server::serve(config))
        }
        Commands::Export { data, out, editor } => {
            let config = editor.into_config()?;
            runtime.block_on(async {
                let dataset = load_dataset(&data.data, data.headers).await?;
                let rows = dataset.rows.len();
                let store = session(&config, dataset)?.into_shared();
                let exporter = Exporter::new(store, snapshot(&config)?, config.export_config());
                let archive = exporter.export_dataset().await?;
                let path = archive.save_to(&out).await?;
                println!("Exported {} rows to {}", rows, path.display());
                Ok::<_, LienzoError>(())
            })
        }
        Commands::Infer { data } => {
            let dataset = runtime.block_on(load_dataset(&data.data, data.headers))?;
            let blocks = template::infer_template(&dataset.rows);
            let json = serde_json::to_string_pretty(&blocks)
                .map_err(|e| LienzoError::invariant(format!("Failed to serialize template: {}", e)))?;
            println!("{}", json);
            Ok(())
        }
        Commands::Preview {
            data,
            row,
            png,
            editor,
        } => {
            let config = editor.into_config()?;
            runtime.block_on(preview(&config, &data, row, &png))
        }
    }
}

/// Editor session holding the dataset and its inferred template.
fn session(config: &EditorConfig, dataset: Dataset) -> Result<CanvasStore, LienzoError> {
    let mut store = CanvasStore::new(config.canvas.clone());
    store.load_dataset(dataset, config.preview_rows, config.preview_scale)?;
    Ok(store)
}

fn snapshot(config: &EditorConfig) -> Result<Arc<dyn Snapshot>, LienzoError> {
    Ok(Arc::new(RasterSnapshot::new(
        config.image_resolver()?,
        config.rasterizer()?,
    )))
}

/// Render one row of the inferred template at full canvas size.
async fn preview(
    config: &EditorConfig,
    data: &DataArgs,
    row: usize,
    png: &Path,
) -> Result<(), LienzoError> {
    let dataset = load_dataset(&data.data, data.headers).await?;
    let values = row
        .checked_sub(1)
        .and_then(|i| dataset.rows.get(i))
        .cloned()
        .ok_or_else(|| {
            LienzoError::import(format!(
                "Row {} is out of range (dataset has {} rows)",
                row,
                dataset.rows.len()
            ))
        })?;
    let store = session(config, dataset)?;

    let surface = Surface {
        canvas: store.canvas().clone(),
        blocks: template::resolve_row(store.main_blocks(), &values, 1.0),
        layers: store.layers().to_vec(),
    };
    let bytes = snapshot(config)?.capture(&surface).await?;
    tokio::fs::write(png, &bytes).await?;
    println!("Saved row {} to {}", row, png.display());
    Ok(())
}
