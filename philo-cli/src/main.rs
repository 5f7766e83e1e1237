use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::info;
use philo_core::io::{read_distance_table, write_distance_matrix, EdgeWriter};
use philo_core::phylo::{neighbor_joining, to_newick, NoEdges};
use philo_core::Limits;

mod args;

use args::{parse_args, usage, Command, Mode};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let argv: Vec<String> = std::env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("philo");

    let mode = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(Command::Help) => {
            print!("{}", usage(prog));
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run(mode)) => mode,
        Err(err) => {
            eprintln!("error: {err}");
            eprint!("{}", usage(prog));
            return ExitCode::FAILURE;
        }
    };

    match run(mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(mode: Mode) -> Result<()> {
    let mut table = read_distance_table(io::stdin().lock(), &Limits::default())
        .context("reading distance data")?;
    info!("{mode:?}: {} taxa", table.num_taxa());

    let mut out = BufWriter::new(io::stdout().lock());
    match mode {
        Mode::Edges => {
            let mut edges = EdgeWriter::new(&mut out);
            neighbor_joining(&mut table, &mut edges).context("building tree")?;
            edges.flush().context("writing edges")?;
        }
        Mode::Matrix => {
            neighbor_joining(&mut table, &mut NoEdges).context("building tree")?;
            write_distance_matrix(&table, &mut out).context("writing matrix")?;
        }
        Mode::Newick { outlier } => {
            neighbor_joining(&mut table, &mut NoEdges).context("building tree")?;
            let newick = to_newick(&table.tree(), outlier.as_deref())?;
            writeln!(out, "{newick}").context("writing tree")?;
        }
    }
    out.flush().context("flushing output")?;
    Ok(())
}
