use std::process::ExitCode;

use drive_tree_cli::{parse_invocation, run, Invocation};
use drive_tree_common::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = match parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Info(info)) => info.exit(),
        Err(e) => {
            eprintln!("❌ An error occurred: {}", e);
            return ExitCode::from(1);
        }
    };
    init_logging(args.verbose);

    match run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ An error occurred: {}", e);
            ExitCode::from(1)
        }
    }
}
