use clap::Parser;
use log::error;

use solvy::cli::{self, Cli, Commands};
use solvy::config::Config;
use solvy::server;

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Cli::parse();
    let config = Config::new();

    let result = match args.command {
        Some(Commands::Serve) | None => actix_web::rt::System::new()
            .block_on(server::run(config))
            .map_err(anyhow::Error::from),
        Some(Commands::Problems { action }) => {
            let api = cli::client_for(args.server, &config);
            actix_web::rt::System::new().block_on(cli::handle_problems(&api, action))
        }
        Some(Commands::Walk {
            image,
            problem_type,
        }) => {
            let api = cli::client_for(args.server, &config);
            actix_web::rt::System::new().block_on(cli::handle_walk(api, &image, problem_type))
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
