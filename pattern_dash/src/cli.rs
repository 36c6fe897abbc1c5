use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use patternscan::PatternFilters;
use std::path::PathBuf;

fn filter_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("universe")
            .long("universe")
            .help("Universe to scan, e.g. sp500"),
    )
    .arg(
        Arg::new("confidence-min")
            .long("confidence-min")
            .value_parser(value_parser!(f64))
            .help("Minimum confidence in [0, 1]"),
    )
    .arg(
        Arg::new("limit")
            .long("limit")
            .value_parser(value_parser!(u32))
            .help("Maximum number of rows"),
    )
    .arg(
        Arg::new("pattern")
            .long("pattern")
            .action(ArgAction::Append)
            .help("Pattern type to include (repeatable)"),
    )
    .arg(
        Arg::new("symbol")
            .long("symbol")
            .action(ArgAction::Append)
            .help("Symbol to include (repeatable)"),
    )
    .arg(Arg::new("sector").long("sector").help("Sector name"))
}

pub fn command() -> Command {
    Command::new("pattern_dash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pattern-scan dashboard")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("State file (JSON) instead of the platform default"),
        )
        .subcommand(
            filter_args(Command::new("scan").about("Fetch patterns once and print them"))
                .arg(
                    Arg::new("preset")
                        .long("preset")
                        .help("Start from a saved preset"),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write the rows to a CSV file"),
                )
                .arg(
                    Arg::new("watchlist-only")
                        .long("watchlist-only")
                        .action(ArgAction::SetTrue)
                        .help("Only show watchlist symbols"),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Auto-refresh and follow the live feed until Ctrl-C")
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_parser(value_parser!(u64))
                        .help("Auto-refresh interval in seconds, 0 disables"),
                )
                .arg(
                    Arg::new("no-live")
                        .long("no-live")
                        .action(ArgAction::SetTrue)
                        .help("Do not connect to the live feed"),
                ),
        )
        .subcommand(
            Command::new("watchlist")
                .about("Manage watched symbols")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("symbol").required(true).num_args(1..)),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(Arg::new("symbol").required(true).num_args(1..)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("preset")
                .about("Manage saved filter presets")
                .subcommand_required(true)
                .subcommand(filter_args(
                    Command::new("save")
                        .about("Save the current filters, with any overrides, under NAME")
                        .arg(Arg::new("name").required(true)),
                ))
                .subcommand(Command::new("delete").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list")),
        )
}

/// Applies the filter flags present in `args` on top of `base`.
pub fn filters_from_args(mut base: PatternFilters, args: &ArgMatches) -> PatternFilters {
    if let Some(u) = args.get_one::<String>("universe") {
        base.universe = Some(u.clone());
    }
    if let Some(c) = args.get_one::<f64>("confidence-min") {
        base.confidence_min = Some(*c);
    }
    if let Some(l) = args.get_one::<u32>("limit") {
        base.limit = Some(*l);
    }
    if let Some(p) = args.get_many::<String>("pattern") {
        base.pattern_types = p.cloned().collect();
    }
    if let Some(s) = args.get_many::<String>("symbol") {
        base.symbols = s.map(|s| s.trim().to_ascii_uppercase()).collect();
    }
    if let Some(s) = args.get_one::<String>("sector") {
        base.sector = Some(s.clone());
    }
    base
}
