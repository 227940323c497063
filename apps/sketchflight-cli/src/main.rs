use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sketchflight_common::Viewport;
use sketchflight_input::Action;
use sketchflight_kernel::{FlightSession, SessionConfig};
use sketchflight_render::{DebugTextRenderer, Renderer};
use sketchflight_stream::HeightField;
use sketchflight_tools::SessionInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sketchflight-cli", about = "Headless sketchflight tooling")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Session config JSON; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a session without a window and report the final frame
    Simulate {
        /// Session time to simulate, in milliseconds
        #[arg(short, long, default_value = "20000")]
        duration_ms: f64,
        /// Tick spacing, in milliseconds
        #[arg(short, long, default_value = "16")]
        step_ms: f64,
        /// Begin the climb at this session time
        #[arg(long)]
        climb_at_ms: Option<f64>,
        /// List every resident terrain surface in the frame summary
        #[arg(long)]
        surfaces: bool,
    },
    /// Sample the terrain height at a world position
    Height {
        #[arg(short, long, allow_hyphen_values = true)]
        x: f64,
        #[arg(short, long, allow_hyphen_values = true)]
        z: f64,
    },
    /// Print the effective session config as JSON
    Config,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SessionConfig> {
    Ok(match path {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("sketchflight-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", sketchflight_stream::crate_info());
            println!("flight: {}", sketchflight_flight::crate_info());
            println!("render: {}", sketchflight_render::crate_info());
            println!("tools: {}", sketchflight_tools::crate_info());
            println!(
                "terrain: chunk={} segments={} window={} chunks",
                config.terrain.chunk_size, config.terrain.segments, config.terrain.initial_chunks
            );
        }
        Commands::Simulate {
            duration_ms,
            step_ms,
            climb_at_ms,
            surfaces,
        } => {
            if !(step_ms > 0.0) {
                anyhow::bail!("step must be positive, got {step_ms}");
            }
            let mut session = FlightSession::new(config)?;
            let mut created = 0;
            let mut retired = 0;
            let mut t: f64 = 0.0;
            while t < duration_ms {
                t = (t + step_ms).min(duration_ms);
                if let Some(at) = climb_at_ms {
                    if t >= at && session.apply(Action::BeginClimb { at_ms: at }) {
                        tracing::info!(at_ms = at, "climb triggered");
                    }
                }
                let stats = session.tick(t)?;
                created += stats.chunks_created;
                retired += stats.chunks_retired;
            }

            let view = session.render_view(Viewport::new(1280, 720)?);
            let renderer = if surfaces {
                DebugTextRenderer::with_surfaces()
            } else {
                DebugTextRenderer::new()
            };
            print!("{}", renderer.render(session.scene(), &view));
            println!("{}", SessionInspector::summary(&session));
            for chunk in SessionInspector::chunk_window(&session) {
                println!("  {chunk}");
            }
            println!("Chunks created: {created}, retired: {retired}");
            session.teardown()?;
        }
        Commands::Height { x, z } => {
            let field = HeightField::new(config.height_field.clone());
            let h = field.height(x, z);
            let band = config.terrain.palette.land_color(h as f32);
            println!("height({x}, {z}) = {h:.3}");
            println!(
                "colour: ({:.3}, {:.3}, {:.3}), bounds [{:.1}, {:.1}]",
                band[0],
                band[1],
                band[2],
                field.min_height(),
                field.max_height()
            );
        }
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}
