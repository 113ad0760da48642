/// Zont - spin a shaded OBJ mesh in the terminal
///
/// Controls while rendering:
///   - Q / ESC / Ctrl-C: Quit
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zont_core::{load_mesh, LoopConfig, RenderSession, DEFAULT_FPS};
use zont_terminal::config::{
    RenderConfig, CONFIG_FILE_NAME, DEFAULT_HEIGHT, DEFAULT_WIDTH, MODELS_DIR,
};
use zont_terminal::TerminalApp;

#[derive(Parser)]
#[command(name = "zont", version, about = "Terminal ASCII rasterizer for OBJ meshes")]
struct Cli {
    /// Enable verbose logging (to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the configured model until Q is pressed
    Render {
        /// Configuration file
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Override the configured width in columns
        #[arg(long)]
        width: Option<usize>,
        /// Override the configured height in rows
        #[arg(long)]
        height: Option<usize>,
        /// Override the configured model file
        #[arg(long)]
        model: Option<String>,
        /// Output frame rate
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Print a still front-facing preview of a model
    Preview {
        /// OBJ file to render
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: usize,
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: usize,
    },
    /// Validate and save render settings
    Configure {
        /// Configuration file
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
        /// Model file name (looked up under models/) or path
        #[arg(long)]
        model: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            config,
            width,
            height,
            model,
            fps,
            frames,
        } => {
            let mut settings = RenderConfig::load(&config)?;
            apply_overrides(&mut settings, width, height, model);
            settings.validate()?;

            let model_path = settings.model_path(MODELS_DIR).with_context(|| {
                format!("run `zont configure --model <file>` or place the model under {MODELS_DIR}/")
            })?;
            let loaded = load_mesh(&model_path)?;
            if !loaded.warnings.is_empty() {
                eprintln!(
                    "{}: {} line(s) parsed with warnings",
                    model_path.display(),
                    loaded.warnings.len()
                );
            }

            let mut loop_config = LoopConfig::new(fps);
            if let Some(frames) = frames {
                loop_config = loop_config.with_frame_limit(frames);
            }

            let app = TerminalApp::new(loaded.mesh, settings.width, settings.height, loop_config)?;
            let stats = app.run()?;
            println!("Rendered {} frames, displayed {}", stats.rendered, stats.shown);
        }
        Commands::Preview {
            file,
            width,
            height,
        } => {
            let loaded = load_mesh(&file)?;
            let session = RenderSession::new(loaded.mesh, width, height)?;
            println!("{}", session.render_still_preview());
        }
        Commands::Configure {
            config,
            width,
            height,
            model,
        } => {
            let mut settings = load_or_default(&config);
            apply_overrides(&mut settings, width, height, model);
            settings.validate()?;
            if let Err(e) = settings.model_path(MODELS_DIR) {
                tracing::warn!(error = %e, "saved config points at an unusable model");
            }
            settings.save(&config)?;
            println!(
                "Saved {}x{} with model {:?} to {}",
                settings.width,
                settings.height,
                settings.model_file,
                config.display()
            );
        }
    }

    Ok(())
}

fn apply_overrides(
    settings: &mut RenderConfig,
    width: Option<usize>,
    height: Option<usize>,
    model: Option<String>,
) {
    if let Some(width) = width {
        settings.width = width;
    }
    if let Some(height) = height {
        settings.height = height;
    }
    if let Some(model) = model {
        settings.model_file = model;
    }
}

/// A broken config file should not block writing a fresh one.
fn load_or_default(path: &Path) -> RenderConfig {
    RenderConfig::load(path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring existing config");
        RenderConfig::default()
    })
}
