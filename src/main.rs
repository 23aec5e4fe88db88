use clap::Parser;
use keeper::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Register { ref login } => commands::account::register(&cli, login),
        Commands::Login { ref login } => commands::account::login(&cli, login),
        Commands::Save {
            kind,
            ref name,
            ref payload,
        } => commands::save::save(&cli, kind, name, payload),
        Commands::Get {
            kind,
            ref name,
            ref output,
        } => commands::get::execute(&cli, kind, name, output.as_deref()),
        Commands::Update {
            kind,
            ref name,
            ref payload,
        } => commands::save::update(&cli, kind, name, payload),
        Commands::Delete { kind, ref name } => commands::delete::execute(&cli, kind, name),
        Commands::List => commands::list::execute(&cli),
    };

    if let Err(e) = result {
        keeper::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
