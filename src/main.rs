use clap::Parser;
use lumpsum::api::{Cli, Command, run_http_server, run_solve};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    lumpsum::logging::init_logger(cli.verbose);

    match cli.command {
        Command::Serve(args) => {
            if let Err(e) = run_http_server(args.host, args.port).await {
                tracing::error!(error = %e, "server stopped");
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Solve(args) => match run_solve(&args) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}
