use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use pattern_dash::app::{AppEvent, AppRuntime, AppState, UiEvent};
use pattern_dash::persist::{PersistedState, Persistence};
use pattern_dash::refresh::Refresher;
use pattern_dash::settings::DashboardSettings;
use pattern_dash::{app, cli, export, feed};
use patternscan::PatternClient;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::command().get_matches();
    let settings = DashboardSettings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)).await?;
    let persistence = match matches.get_one::<PathBuf>("state") {
        Some(p) => Persistence::at(p),
        None => Persistence::new()?,
    };

    match matches.subcommand() {
        Some(("scan", args)) => scan(&settings, &persistence, args).await,
        Some(("watch", args)) => watch(&settings, &persistence, args).await,
        Some(("watchlist", args)) => watchlist(&persistence, args),
        Some(("preset", args)) => preset(&persistence, args),
        _ => Err(anyhow!("no subcommand given")),
    }
}

async fn scan(settings: &DashboardSettings, persistence: &Persistence, args: &ArgMatches) -> Result<()> {
    let saved = persistence.load();
    let base = match args.get_one::<String>("preset") {
        Some(name) => saved.presets.get(name)?.clone(),
        None => saved.filters.clone(),
    };
    let filters = cli::filters_from_args(base, args);

    let client = PatternClient::http(&settings.client_config()).context("build client")?;
    let patterns = client
        .fetch_patterns(&filters)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;

    let mut state = AppState::from_persisted(saved);
    state.filters = filters;
    state.watchlist_only |= args.get_flag("watchlist-only");
    state.patterns = patterns;
    state.last_refresh_unix = Some(app::now_unix());
    state.status_message = format!("Loaded {} patterns.", state.patterns.len());

    if let Some(path) = args.get_one::<PathBuf>("csv") {
        let rows = export::export_csv(path, state.visible_patterns())?;
        eprintln!("wrote {rows} rows to {}", path.display());
    }
    print!("{}", app::render::render(&state));
    Ok(())
}

async fn watch(settings: &DashboardSettings, persistence: &Persistence, args: &ArgMatches) -> Result<()> {
    let mut state = AppState::from_persisted(persistence.load());
    state.auto_refresh_secs = args
        .get_one::<u64>("interval")
        .copied()
        .unwrap_or(settings.dashboard.auto_refresh_secs);

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let client = PatternClient::http(&settings.client_config()).context("build client")?;
    let mut runtime = AppRuntime::new(state, Refresher::new(client, tx.clone()));

    let live = if settings.feed.enabled && !args.get_flag("no-live") {
        feed::install_rustls_provider();
        Some(tokio::spawn(feed::run_live_feed(settings.feed.clone(), tx.clone())))
    } else {
        None
    };

    runtime.handle_event(AppEvent::Ui(UiEvent::RefreshRequested));
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("ctrl-c handler failed: {err}");
            std::future::pending::<()>().await;
        }
    };
    runtime
        .run(&mut rx, ctrl_c, |frame| print!("\x1b[2J\x1b[H{frame}"))
        .await;

    if let Some(handle) = live {
        handle.abort();
    }
    persistence.save_now(&runtime.state.to_persisted())?;
    Ok(())
}

fn watchlist(persistence: &Persistence, args: &ArgMatches) -> Result<()> {
    let mut saved = persistence.load();
    match args.subcommand() {
        Some(("add", a)) => {
            for raw in a.get_many::<String>("symbol").into_iter().flatten() {
                let sym = saved.watchlist.add(raw)?;
                println!("added {sym}");
            }
            save(persistence, &saved)
        }
        Some(("remove", a)) => {
            for raw in a.get_many::<String>("symbol").into_iter().flatten() {
                let sym = saved.watchlist.remove(raw)?;
                println!("removed {sym}");
            }
            save(persistence, &saved)
        }
        _ => {
            for sym in saved.watchlist.symbols() {
                println!("{sym}");
            }
            Ok(())
        }
    }
}

fn preset(persistence: &Persistence, args: &ArgMatches) -> Result<()> {
    let mut saved = persistence.load();
    match args.subcommand() {
        Some(("save", a)) => {
            let name = a.get_one::<String>("name").map(String::as_str).unwrap_or_default();
            let filters = cli::filters_from_args(saved.filters.clone(), a);
            let replaced = saved.presets.save(name, filters)?;
            println!("{} preset {name:?}", if replaced { "updated" } else { "saved" });
            save(persistence, &saved)
        }
        Some(("delete", a)) => {
            let name = a.get_one::<String>("name").map(String::as_str).unwrap_or_default();
            saved.presets.delete(name)?;
            println!("deleted preset {name:?}");
            save(persistence, &saved)
        }
        _ => {
            for name in saved.presets.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn save(persistence: &Persistence, saved: &PersistedState) -> Result<()> {
    persistence
        .save_now(saved)
        .with_context(|| format!("save {:?}", persistence.state_path()))?;
    Ok(())
}
