use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use crate::graph::make_graph;
use crate::preferences::{Preferences, PREFS_PATH};
use crate::session::{DualFile, Session, TilingFile};
use crate::symmetry::SymmetryContext;

pub mod graph;
pub mod preferences;
pub mod session;
pub mod simulation;
pub mod symmetry;
pub mod util;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Solver settings, created with defaults if missing
    #[arg(long, global = true, default_value = PREFS_PATH)]
    preferences: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the tiling of a dual graph and report its size
    Inspect { dual: PathBuf },
    /// Relax the tiling of a dual graph
    Relax {
        dual: PathBuf,
        #[arg(long, default_value_t = 10)]
        rounds: usize,
        /// Where to write the relaxed tiling
        #[arg(long)]
        export: Option<PathBuf>,
        /// Where to save the dual graph, rescaled to the configured radius
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write every vertex and tile of the tiling
    Export { dual: PathBuf, output: PathBuf },
    /// Add or remove a dual vertex on a symmetry axis
    Axis { dual: PathBuf, slot: usize },
}

fn main() -> eyre::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let prefs = Preferences::load(&args.preferences)?;

    match args.command {
        Command::Inspect { dual } => {
            let file = DualFile::read(dual)?;
            let ctx = SymmetryContext::new(&file.symmetry())?;
            let mut dual = file.to_dual(&ctx)?;
            dual.normalize(prefs.radius);
            let graph = make_graph(&dual, prefs.radius)?;
            let keep_close_fars = graph.calc_keep_close_fars();
            let line_vertex_constraints = graph.calc_line_vertex_constraints();
            println!("symmetry: {}", ctx.name());
            println!("dual vertices: {}", dual.len());
            println!(
                "tiling: {} vertices, {} tiles",
                graph.vertices().len(),
                graph.tiles().len()
            );
            println!("perimeter edges: {}", graph.calc_perimeter().len());
            println!("distance constraints: {}", keep_close_fars.len());
            println!("arc constraints: {}", line_vertex_constraints.len());
        }
        Command::Relax {
            dual,
            rounds,
            export,
            output,
        } => {
            let file = DualFile::read(dual)?;
            let ctx = SymmetryContext::new(&file.symmetry())?;
            let mut session = Session::new(&ctx, &file, &prefs)?;
            for _ in 0..rounds {
                session.run_round();
            }
            if let Some(last) = session.rounds.last() {
                println!("error {:.3e}, padding error {:.3e}", last.error, last.padding_error);
            }
            if let Some(export) = export {
                session.export(&export)?;
                info!("exported {}", export.display());
            }
            if let Some(output) = output {
                session.to_dual_file().write(&output)?;
                info!("saved {}", output.display());
            }
        }
        Command::Export { dual, output } => {
            let file = DualFile::read(dual)?;
            let ctx = SymmetryContext::new(&file.symmetry())?;
            let mut dual = file.to_dual(&ctx)?;
            dual.normalize(prefs.radius);
            let graph = make_graph(&dual, prefs.radius)?;
            TilingFile::from_graph(&graph).write(&output)?;
            info!("exported {}", output.display());
        }
        Command::Axis { dual, slot } => {
            let file = if dual.exists() {
                DualFile::read(&dual)?
            } else {
                DualFile::default()
            };
            file.with_axis_toggled(slot, prefs.radius)?.write(&dual)?;
        }
    }

    if !args.preferences.exists() {
        prefs.save(&args.preferences)?;
    }
    Ok(())
}
