use pagecraft_project::RefreshNotifier;
use pagecraft_workspace::{router, WorkspaceService};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 7400;
    let mut root = std::env::current_dir()?;
    let mut webhook: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().map_err(|_| {
                        anyhow::anyhow!("invalid port number: {}", args[i + 1])
                    })?;
                    i += 2;
                } else {
                    anyhow::bail!("--port requires a value");
                }
            }
            "--refresh-webhook" => {
                if i + 1 < args.len() {
                    webhook = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    anyhow::bail!("--refresh-webhook requires a value");
                }
            }
            "--help" | "-h" => {
                println!("Usage: pagecraft-server [OPTIONS] [ROOT_DIR]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>          HTTP port to listen on (default: 7400)");
                println!("  --refresh-webhook <URL>    POST build events to this URL");
                println!("  -h, --help                 Show this help message");
                println!();
                println!("Arguments:");
                println!("  [ROOT_DIR]                 Project root (default: current dir)");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                root = PathBuf::from(arg);
                i += 1;
            }
            _ => {
                anyhow::bail!("unknown argument: {}", args[i]);
            }
        }
    }

    let notifier = match webhook {
        Some(url) => RefreshNotifier::webhook(url),
        None => RefreshNotifier::Noop,
    };

    tracing::info!("project root: {}", root.display());
    let service = WorkspaceService::open(root, notifier)?;

    let addr = format!("127.0.0.1:{port}");
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(service)).await?;

    Ok(())
}
