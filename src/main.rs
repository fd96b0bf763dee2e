mod cli;

use std::process::ExitCode;

use clap::Parser;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    match cli::run(args).await {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<webtag::Error>() {
                Some(e) => eprintln!("Error: {}", e.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
