//! confcopy - edit persisted configurations from the command line

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use confcopy_core::{DelegateRegistry, FileStorage, Workspace, WorkspaceConfig};
use confcopy_model::Location;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;

fn build_cli() -> Command {
    let location = Arg::new("location")
        .required(true)
        .help("Configuration location, relative to the storage root");
    let force = Arg::new("force")
        .long("force")
        .action(ArgAction::SetTrue)
        .help("Save even if the configuration changed on disk");

    Command::new("confcopy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Edit persisted configurations through isolated working copies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Workspace configuration file (TOML)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Storage root, overrides the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("show")
                .about("Print a configuration")
                .arg(location.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print attributes as JSON"),
                ),
        )
        .subcommand(
            Command::new("set")
                .about("Set one attribute and save")
                .arg(location.clone())
                .arg(Arg::new("key").required(true).help("Attribute name"))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .help("JSON value; anything else is taken as a string"),
                )
                .arg(force.clone()),
        )
        .subcommand(
            Command::new("create")
                .about("Create a configuration with type defaults and save it")
                .arg(location.clone())
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value(confcopy_core::PROPERTIES_TYPE_ID)
                        .help("Configuration type id"),
                )
                .arg(Arg::new("id").long("id").help("Configuration id"))
                .arg(Arg::new("name").long("name").help("Display name"))
                .arg(
                    Arg::new("import")
                        .long("import")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Import attributes from a file"),
                ),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a configuration")
                .arg(location.clone())
                .arg(Arg::new("name").required(true).help("New display name"))
                .arg(force.clone()),
        )
        .subcommand(
            Command::new("lock")
                .about("Mark a configuration locked")
                .arg(location.clone())
                .arg(force.clone()),
        )
        .subcommand(
            Command::new("unlock")
                .about("Clear the locked flag")
                .arg(location)
                .arg(force),
        )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_workspace(matches: &ArgMatches) -> anyhow::Result<Workspace> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => WorkspaceConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WorkspaceConfig::default(),
    };
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config = config.with_storage_root(root);
    }
    tracing::debug!("Storage root {}", config.storage_root.display());

    let storage = Arc::new(FileStorage::new(&config.storage_root));
    Ok(Workspace::new(config, storage, DelegateRegistry::with_defaults()))
}

fn location_arg(args: &ArgMatches) -> anyhow::Result<Location> {
    args.get_one::<String>("location")
        .map(|s| Location::from(s.as_str()))
        .context("missing location")
}

fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    let workspace = open_workspace(matches)?;

    match matches.subcommand() {
        Some(("show", args)) => {
            commands::show(&workspace, &location_arg(args)?, args.get_flag("json"))
        }
        Some(("set", args)) => {
            let key = args.get_one::<String>("key").map_or("", String::as_str);
            let value = args.get_one::<String>("value").map_or("", String::as_str);
            commands::set(
                &workspace,
                &location_arg(args)?,
                key,
                commands::parse_value(value),
                args.get_flag("force"),
            )
        }
        Some(("create", args)) => commands::create(
            &workspace,
            &location_arg(args)?,
            &commands::CreateOptions {
                type_id: args
                    .get_one::<String>("type")
                    .cloned()
                    .unwrap_or_else(|| confcopy_core::PROPERTIES_TYPE_ID.to_string()),
                id: args.get_one::<String>("id").cloned(),
                name: args.get_one::<String>("name").cloned(),
                import: args.get_one::<PathBuf>("import").cloned(),
            },
        ),
        Some(("rename", args)) => {
            let name = args.get_one::<String>("name").map_or("", String::as_str);
            commands::edit(&workspace, &location_arg(args)?, args.get_flag("force"), |wc| {
                wc.set_name(name);
            })
        }
        Some((lock @ ("lock" | "unlock"), args)) => {
            let locked = lock == "lock";
            commands::edit(&workspace, &location_arg(args)?, args.get_flag("force"), |wc| {
                wc.set_locked(locked);
            })
        }
        Some((other, _)) => anyhow::bail!("unknown command {other}"),
        None => anyhow::bail!("no command given"),
    }
}

fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let output = run(&matches)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["confcopy", "show", "web.json", "--root", "/tmp/x", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(
            matches.get_one::<PathBuf>("root"),
            Some(&PathBuf::from("/tmp/x"))
        );
    }

    #[test]
    fn create_defaults_to_properties() {
        let matches = build_cli()
            .try_get_matches_from(["confcopy", "create", "web.json"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(
            args.get_one::<String>("type").map(String::as_str),
            Some(confcopy_core::PROPERTIES_TYPE_ID)
        );
    }

    #[test]
    fn run_against_temp_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let run_args = |args: &[&str]| {
            let mut argv = vec!["confcopy", "--root", root];
            argv.extend_from_slice(args);
            run(&build_cli().try_get_matches_from(argv).unwrap())
        };

        run_args(&["create", "web.json", "--name", "Web"]).unwrap();
        run_args(&["set", "web.json", "port", "8080"]).unwrap();
        run_args(&["lock", "web.json"]).unwrap();

        let shown = run_args(&["show", "web.json"]).unwrap();
        assert!(shown.contains("port = 8080"));
        assert!(shown.contains("locked = true"));
        assert!(shown.contains("name = Web"));
    }
}
