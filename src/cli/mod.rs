// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All pipeline work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the classifier and reports test accuracy
//   2. `evaluate` — reloads a checkpoint and reports test accuracy
//   3. `predict`  — reloads a checkpoint and scores token lists
//
// The --backend flag picks the Burn backend here, once:
//   ndarray → Autodiff<NdArray> for training, NdArray otherwise
//   wgpu    → Autodiff<Wgpu>    for training, Wgpu otherwise
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use clap::Parser;
use commands::{BackendKind, Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    predict_use_case::PredictUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "review-sentiment",
    version = "0.1.0",
    about = "Train an LSTM sentiment classifier on pre-indexed movie reviews, then score reviews."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// The CLI layer only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let backend = args.backend;
    let config  = args.into_config()?;
    match &config.data_dir {
        Some(dir) => tracing::info!("Starting training on reviews in: {}", dir),
        None      => tracing::info!("Starting training on synthetic reviews"),
    }

    let use_case = TrainUseCase::new(config);
    let report = match backend {
        BackendKind::Ndarray => use_case.execute::<Autodiff<NdArray>>(NdArrayDevice::default())?,
        BackendKind::Wgpu    => use_case.execute::<Autodiff<Wgpu>>(WgpuDevice::default())?,
    };

    for m in &report.history {
        println!("{m}");
    }
    println!("Accuracy: {:.2}%", report.test.accuracy * 100.0);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let use_case = EvaluateUseCase::new(args.checkpoint_dir, args.data_dir, args.batch_size);
    let eval = match args.backend {
        BackendKind::Ndarray => use_case.execute::<NdArray>(NdArrayDevice::default())?,
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(WgpuDevice::default())?,
    };

    println!("Loss: {:.4}", eval.loss);
    println!("Accuracy: {:.2}% ({}/{})", eval.accuracy * 100.0, eval.correct, eval.total);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase::new(args.checkpoint_dir);
    let predictions = match args.backend {
        BackendKind::Ndarray => use_case.execute::<NdArray>(NdArrayDevice::default(), &args.reviews)?,
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(WgpuDevice::default(), &args.reviews)?,
    };

    for (review, p) in args.reviews.iter().zip(&predictions) {
        println!("{:.4}  {:<8}  [{}]", p.probability, p.label.to_string(), review);
    }
    Ok(())
}
