//! Curve fitting binary.
//!
//! Fits an RBF network to a small set of points (the built-in five-point demo
//! unless `--points` is given), evaluates it over a dense query range and
//! prints the predictions. Optionally writes them as JSONL.

use clap::Parser;
use rbfnet::data::{load_points, query_range, TrainingSet};
use rbfnet::utils::mean_abs_error;
use rbfnet::{fit, fit_best_of, Config};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(
    name = "fit-curve",
    about = "Fit an RBF network to 1-D points and evaluate it over a range"
)]
struct Args {
    /// JSON file with training points: {"x": [...], "y": [...]}
    #[arg(long)]
    points: Option<PathBuf>,

    /// Number of RBF units in the hidden layer
    #[arg(long, default_value_t = 3)]
    num_middle: usize,

    /// Number of full-batch training steps
    #[arg(long, default_value_t = 2000)]
    epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f32,

    /// Seed for weight initialization (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Lower bound of the query range (inclusive)
    #[arg(long, default_value_t = -100.0, allow_hyphen_values = true)]
    lb: f32,

    /// Upper bound of the query range (exclusive)
    #[arg(long, default_value_t = 101.0, allow_hyphen_values = true)]
    rb: f32,

    /// Spacing of the query range
    #[arg(long, default_value_t = 1.0)]
    step: f32,

    /// Independent fits to run in parallel, keeping the lowest loss
    #[arg(long, default_value_t = 1)]
    restarts: usize,

    /// Write predictions as JSONL ({"x": .., "y": ..} per line)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log per-epoch loss
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let set = match args.points {
        Some(ref path) => load_points(path)?,
        None => TrainingSet::demo(),
    };
    let x_p = query_range(args.lb, args.rb, args.step)?;

    let config = Config {
        num_middle: args.num_middle,
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        seed: args.seed,
        ..Config::default()
    };

    info!(
        x = ?set.x,
        y = ?set.y,
        num_middle = config.num_middle,
        epochs = config.epochs,
        learning_rate = config.learning_rate,
        restarts = args.restarts,
        "training parameters"
    );

    let fitted = if args.restarts > 1 {
        fit_best_of(&set, &config, args.restarts)?
    } else {
        fit(&set, &config)?
    };

    let y_p = fitted.predict(&x_p);
    let train_mae = mean_abs_error(&fitted.predict(&set.x), &set.y);
    info!(
        initial_loss = fitted.report.initial_loss,
        final_loss = fitted.report.final_loss,
        train_mae,
        "training complete"
    );

    println!("{:>12} {:>12}", "x", "y");
    for (x, y) in x_p.iter().zip(&y_p) {
        println!("{x:>12.4} {y:>12.4}");
    }

    if let Some(ref path) = args.output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        for (x, y) in x_p.iter().zip(&y_p) {
            writeln!(out, "{}", serde_json::json!({ "x": x, "y": y }))?;
        }
        out.flush()?;
        info!(path = %path.display(), count = y_p.len(), "wrote predictions");
    }

    Ok(())
}
