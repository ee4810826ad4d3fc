// src/cli/mod.rs — CLI definition (clap derive)

pub mod serve;
pub mod solve;

use clap::{Args, Parser, Subcommand};

use crate::core::config::SolveRequest;

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Breadth-first tree-of-thought search over a language model",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Solve one puzzle and print the result
    Solve(SolveArgs),
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (defaults to [api].port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Flags left unset fall through to the config file, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SolveArgs {
    /// Puzzle input, e.g. "4 9 10 13"
    #[arg(trailing_var_arg = true)]
    pub input: Vec<String>,

    /// Model as provider/model, or a bare OpenAI model name
    #[arg(short, long)]
    pub backend: Option<String>,

    #[arg(short, long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub task: Option<String>,

    /// Single-shot generation, no search
    #[arg(long)]
    pub naive: bool,

    /// standard | cot
    #[arg(long)]
    pub prompt_sample: Option<String>,

    /// sample | propose
    #[arg(long)]
    pub method_generate: Option<String>,

    /// value | vote
    #[arg(long)]
    pub method_evaluate: Option<String>,

    /// greedy | sample
    #[arg(long)]
    pub method_select: Option<String>,

    #[arg(long)]
    pub n_generate_sample: Option<i64>,

    #[arg(long)]
    pub n_evaluate_sample: Option<i64>,

    #[arg(long)]
    pub n_select_sample: Option<i64>,

    /// Overall wall-clock budget in seconds
    #[arg(long)]
    pub time_budget: Option<f64>,

    /// Seed for sample-mode selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the full response, trace included, as JSON
    #[arg(long)]
    pub json: bool,
}

impl SolveArgs {
    pub fn to_request(&self) -> SolveRequest {
        let input = self.input.join(" ");
        SolveRequest {
            backend: self.backend.clone(),
            temperature: self.temperature,
            task: self.task.clone(),
            input: (!input.trim().is_empty()).then_some(input),
            naive_run: self.naive.then_some(true),
            prompt_sample: self.prompt_sample.clone(),
            method_generate: self.method_generate.clone(),
            method_evaluate: self.method_evaluate.clone(),
            method_select: self.method_select.clone(),
            n_generate_sample: self.n_generate_sample,
            n_evaluate_sample: self.n_evaluate_sample,
            n_select_sample: self.n_select_sample,
            time_budget_secs: self.time_budget,
            seed: self.seed,
        }
    }
}
