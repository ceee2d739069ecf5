use clap::Parser;
use colored::*;

use gpu_thermal_bench::core::CliArgs;
use gpu_thermal_bench::run_benchmark;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    if let Err(e) = run_benchmark(args).await {
        eprintln!("{} {}", "Fatal error:".bold().red(), e);
        std::process::exit(1);
    }
}
