use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use staffchart::handlers::tree::MoveRequest;
use staffchart::hierarchy::{
    build_forest, build_hierarchy, clamp_levels, render_outline, BuildOptions, HierarchyView,
};
use staffchart::source::{OrgSource, RemoteSource};
use staffchart::{db, routes, AppState, Config};

const DEFAULT_CONFIG: &str = "./etc/staffchart.toml";
const DEFAULT_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);

/// Value following `flag` on the command line
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .skip_while(|arg| arg.as_str() != flag)
        .nth(1)
        .map(|s| s.as_str())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: staffchart [OPTIONS]");
        println!("Options:");
        println!("  -config <path>  Path to configuration file (default: {})", DEFAULT_CONFIG);
        println!("  -tree <url>     Print the org chart of a running instance (e.g. http://host:8080/api)");
        println!("  -levels <n>     Levels to print with -tree (1-5)");
        println!("  -focus <id>     Root the printed tree at this position");
        println!("  -remote-build   With -tree, print the tree as built by the remote instance");
        println!("  -move <json>    With -tree, preview a /tree/move body without writing it");
        println!("  -help, --help   Print this help message");
        return Ok(());
    }

    let config_path = arg_value(&args, "-config").unwrap_or(DEFAULT_CONFIG).to_string();

    // Load configuration first (before logging init)
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        Config::default()
    });

    // Priority: RUST_LOG env var > config file > default "info"
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    if let Some(base_url) = arg_value(&args, "-tree") {
        return print_tree(base_url, &args, &config).await;
    }

    info!("Starting staffchart server...");
    info!("Loading configuration from: {}", config_path);

    let db = db::init_database(&config.database).await.map_err(|e| {
        tracing::error!("Database initialization failed: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    let state = AppState::new(db, config.clone());
    let app = routes::create_router(state);

    let addr: SocketAddr = config.addr.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid address '{}', using default {}", config.addr, DEFAULT_ADDR);
        DEFAULT_ADDR
    });

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `-tree` mode: fetch the tables from a running instance and print the outline
async fn print_tree(base_url: &str, args: &[String], config: &Config) -> anyhow::Result<()> {
    let levels = match arg_value(args, "-levels") {
        Some(raw) => clamp_levels(raw.parse::<i64>()?),
        None => config.hierarchy.default_levels,
    };
    let mut options = BuildOptions::new(levels);
    if let Some(raw) = arg_value(args, "-focus") {
        options = options.focus_position(raw.parse::<i64>()?, None);
    }

    let remote = RemoteSource::new(base_url);

    if args.iter().any(|arg| arg == "-remote-build") {
        let nodes = remote.fetch_tree(&options).await?;
        print_outline(&HierarchyView::from_nodes(nodes));
        return Ok(());
    }

    if let Some(raw) = arg_value(args, "-move") {
        let request: MoveRequest = serde_json::from_str(raw)?;
        let mut tables = remote.load().await?;
        let plan = request.plan(&tables)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        plan.apply(&mut tables);
        print_outline(&HierarchyView::from_nodes(build_forest(tables.view(), &options)));
        return Ok(());
    }

    let sources = remote.load_sources().await;
    let view = build_hierarchy(&sources, &options);
    if view == HierarchyView::Loading {
        anyhow::bail!("could not load {} from {}", sources.missing().join(", "), base_url);
    }
    print_outline(&view);
    Ok(())
}

fn print_outline(view: &HierarchyView) {
    match view {
        HierarchyView::Loading => println!("(loading)"),
        HierarchyView::Empty => println!("(no organization structure)"),
        HierarchyView::Ready(nodes) => print!("{}", render_outline(nodes)),
    }
}
