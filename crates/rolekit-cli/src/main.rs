//! rolekit CLI
//!
//! Command line front end for agent and tool definitions:
//! - list: available agents and tools
//! - show: resolve one definition by name and print it
//! - validate: check every definition against its JSON schema
//! - paths: show the resolved locations

mod paths;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paths::{paths_from_env, PathsConfig, RolekitPaths, CONFIG_FILE};
use rolekit_core::{emit, ParserKind};
use rolekit_store::{Category, DefinitionStore, SchemaSet, ValidationReport};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rolekit")]
#[command(about = "rolekit - Agent and tool definitions by name", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to system config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Definitions root holding role/ and tool/ (overrides env and config)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Document parser backend
    #[arg(long, global = true, env = "ROLEKIT_PARSER")]
    parser: Option<ParserKind>,

    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available agents and tools
    #[command(visible_alias = "ls")]
    List {
        /// JSON output
        #[arg(short, long)]
        json: bool,
    },

    /// Resolve a definition by name and print it
    Show {
        /// Definition kind
        #[arg(value_enum)]
        kind: KindArg,

        /// Logical name, e.g. `coder` or `find_symbol`
        name: String,

        /// JSON output
        #[arg(short, long)]
        json: bool,
    },

    /// Validate every definition file against its schema
    Validate {
        /// Directory with role_schema.json and tool_schema.json
        #[arg(short, long)]
        schemas: Option<PathBuf>,
    },

    /// Show resolved paths and configuration
    Paths,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Agent,
    Tool,
}

impl From<KindArg> for Category {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Agent => Category::Agent,
            KindArg::Tool => Category::Tool,
        }
    }
}

/// Configuration file contents
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct Config {
    /// Preferred parser backend
    #[serde(default)]
    parser: Option<ParserKind>,

    #[serde(default)]
    paths: PathsConfig,
}

/// Initialize logging on stderr
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{bin}={level},rolekit_core={level},rolekit_store={level}",
                    bin = env!("CARGO_CRATE_NAME"),
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from file
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!("Config file not found: {}, using defaults", path.display());
        return Ok(Config::default());
    }

    info!("Loading config from: {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Config file location: --config > $ROLEKIT_CONFIG_DIR > system config > ./rolekit.yaml
fn config_path(cli: &Cli, env: &PathsConfig, defaults: &RolekitPaths) -> PathBuf {
    if let Some(ref config_file) = cli.config {
        return config_file.clone();
    }
    if let Some(ref config_dir) = env.config_dir {
        return config_dir.join(CONFIG_FILE);
    }

    let sys_config = defaults.default_config_file();
    if sys_config.exists() {
        sys_config
    } else {
        PathBuf::from("rolekit.yaml")
    }
}

/// Resolve paths with precedence: CLI args > env vars > config > system defaults
fn resolve_paths(
    cli: &Cli,
    env: PathsConfig,
    config: &Config,
    defaults: RolekitPaths,
) -> RolekitPaths {
    let cli_overrides = PathsConfig {
        root: cli.root.clone(),
        ..Default::default()
    };

    cli_overrides
        .or(env)
        .or(config.paths.clone())
        .apply_to(defaults)
}

fn open_store(paths: &RolekitPaths, parser: ParserKind) -> Result<DefinitionStore> {
    DefinitionStore::open(&paths.root, parser.parser())
        .with_context(|| format!("Failed to open definitions root {}", paths.root.display()))
}

fn list(store: &DefinitionStore, json: bool) -> Result<()> {
    let agents = store.list_agents()?;
    let tools = store.list_tools()?;

    if json {
        let output = serde_json::json!({ "agents": agents, "tools": tools });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Agents ({}):", agents.len());
    for agent in &agents {
        println!("  {}", agent);
    }
    println!("\nTools ({}):", tools.len());
    for tool in &tools {
        println!("  {}", tool);
    }
    Ok(())
}

fn show(store: &DefinitionStore, category: Category, name: &str, json: bool) -> Result<()> {
    let definition = store
        .resolve_and_load(category, name)
        .with_context(|| format!("Could not load {} '{}'", category, name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    } else {
        let text = emit(&definition.document).with_context(|| {
            format!("Cannot print {} '{}' as YAML, try --json", category, name)
        })?;
        println!("# {} '{}' from {}", category, name, definition.path.display());
        print!("{}", text);
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for category in Category::ALL {
        let outcomes: Vec<_> = report.for_category(category).collect();
        if outcomes.is_empty() {
            continue;
        }

        println!("{} definitions:", category);
        for outcome in outcomes {
            if outcome.passed() {
                println!("  ✅ {}", outcome.path.display());
            } else {
                println!("  ❌ {}", outcome.path.display());
                for error in &outcome.errors {
                    println!("     - {}", error);
                }
            }
        }
    }

    println!(
        "\n{} files checked: {} passed, {} failed",
        report.outcomes.len(),
        report.passed_count(),
        report.error_count()
    );
}

fn validate(store: &DefinitionStore, schemas_dir: &Path) -> Result<i32> {
    let schemas = SchemaSet::load(schemas_dir)
        .with_context(|| format!("Failed to load schemas from {}", schemas_dir.display()))?;

    let report = store.validate_all(&schemas);
    print_report(&report);
    Ok(report.exit_code())
}

fn print_paths(paths: &RolekitPaths, config_file: &Path, parser: ParserKind) {
    println!("{}", paths.display());
    println!("  Config file:       {}", config_file.display());
    println!("  Parser:            {} (resolves to {})", parser, parser.resolve());
    println!("\nEnvironment variables for overrides:");
    println!("  ROLEKIT_ROOT         - Override definitions root");
    println!("  ROLEKIT_SCHEMAS_DIR  - Override schema directory");
    println!("  ROLEKIT_CONFIG_DIR   - Override config directory");
    println!("  ROLEKIT_PARSER       - auto, builtin or library");
}

/// Run a parsed command line, returning the process exit status
fn run(cli: Cli, env: PathsConfig, defaults: RolekitPaths) -> Result<i32> {
    let config_file = config_path(&cli, &env, &defaults);
    let config = load_config(&config_file)?;
    let paths = resolve_paths(&cli, env, &config, defaults);
    let parser = cli.parser.or(config.parser).unwrap_or_default();

    match cli.command {
        Commands::List { json } => {
            list(&open_store(&paths, parser)?, json)?;
        }

        Commands::Show { kind, ref name, json } => {
            show(&open_store(&paths, parser)?, kind.into(), name, json)?;
        }

        Commands::Validate { ref schemas } => {
            info!("Validating definitions under {}", paths.root.display());
            let schemas_dir = schemas.as_deref().unwrap_or(&paths.schemas_dir);
            return validate(&open_store(&paths, parser)?, schemas_dir);
        }

        Commands::Paths => {
            print_paths(&paths, &config_file, parser);
        }
    }

    Ok(0)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let code = run(cli, paths_from_env(), RolekitPaths::new()?)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rolekit").chain(args.iter().copied())).unwrap()
    }

    /// A definitions tree with schemas and an isolated config directory
    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "role/coder/role.yaml", "name: coder\ntools:\n  - lint\n");
        write(temp.path(), "tool/code/lint.yaml", "name: lint\n");
        write(
            temp.path(),
            "schemas/role_schema.json",
            r#"{"type": "object", "required": ["name", "tools"]}"#,
        );
        write(
            temp.path(),
            "schemas/tool_schema.json",
            r#"{"type": "object", "required": ["name"]}"#,
        );
        temp
    }

    fn run_in(temp: &TempDir, args: &[&str]) -> Result<i32> {
        let mut full = vec!["--root", temp.path().to_str().unwrap()];
        full.extend_from_slice(args);
        let env = PathsConfig {
            config_dir: Some(temp.path().join("config")),
            ..Default::default()
        };
        run(parse(&full), env, RolekitPaths::with_root(temp.path()))
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse(&["show", "tool", "find_symbol", "--json"]);
        match cli.command {
            Commands::Show { kind, name, json } => {
                assert_eq!(kind, KindArg::Tool);
                assert_eq!(name, "find_symbol");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = parse(&["--parser", "builtin", "validate", "--schemas", "/tmp/s"]);
        assert_eq!(cli.parser, Some(ParserKind::Builtin));
        assert!(matches!(cli.command, Commands::Validate { schemas: Some(_) }));

        assert!(Cli::try_parse_from(["rolekit", "show", "robot", "x"]).is_err());
        assert!(Cli::try_parse_from(["rolekit", "--parser", "toml", "list"]).is_err());
    }

    #[test]
    fn test_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");

        let config = load_config(&path).unwrap();
        assert!(config.parser.is_none());
        assert_eq!(config.paths, PathsConfig::default());

        std::fs::write(
            &path,
            "parser: builtin\npaths:\n  root: /srv/definitions\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.parser, Some(ParserKind::Builtin));
        assert_eq!(config.paths.root, Some(PathBuf::from("/srv/definitions")));

        std::fs::write(&path, "parser: [not, a, parser]\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_resolve_paths_precedence() {
        let cli = parse(&["--root", "/from/cli", "paths"]);
        let env = PathsConfig {
            root: Some("/from/env".into()),
            ..Default::default()
        };
        let config = Config {
            parser: None,
            paths: PathsConfig {
                root: Some("/from/file".into()),
                schemas_dir: Some("/from/file/schemas".into()),
                ..Default::default()
            },
        };

        let paths = resolve_paths(&cli, env, &config, RolekitPaths::with_root("/default"));
        assert_eq!(paths.root, PathBuf::from("/from/cli"));
        assert_eq!(paths.schemas_dir, PathBuf::from("/from/file/schemas"));
        assert_eq!(paths.config_dir, PathBuf::from("/default/config"));

        let cli = parse(&["paths"]);
        let paths = resolve_paths(
            &cli,
            PathsConfig::default(),
            &Config::default(),
            RolekitPaths::with_root("/default"),
        );
        assert_eq!(paths, RolekitPaths::with_root("/default"));
    }

    #[test]
    fn test_config_path_selection() {
        let defaults = RolekitPaths::with_root("/nowhere");
        let env = PathsConfig {
            config_dir: Some("/etc/rolekit".into()),
            ..Default::default()
        };

        let cli = parse(&["--config", "/tmp/custom.yaml", "paths"]);
        assert_eq!(
            config_path(&cli, &env, &defaults),
            PathBuf::from("/tmp/custom.yaml")
        );

        let cli = parse(&["paths"]);
        assert_eq!(
            config_path(&cli, &env, &defaults),
            PathBuf::from("/etc/rolekit/config.yaml")
        );
        assert_eq!(
            config_path(&cli, &PathsConfig::default(), &defaults),
            PathBuf::from("rolekit.yaml")
        );
    }

    #[test]
    fn test_run_commands_succeed() {
        let temp = fixture();
        assert_eq!(run_in(&temp, &["list"]).unwrap(), 0);
        assert_eq!(run_in(&temp, &["list", "--json"]).unwrap(), 0);
        assert_eq!(run_in(&temp, &["show", "agent", "coder"]).unwrap(), 0);
        assert_eq!(run_in(&temp, &["show", "tool", "lint", "--json"]).unwrap(), 0);
        assert_eq!(run_in(&temp, &["paths"]).unwrap(), 0);
        assert_eq!(run_in(&temp, &["validate"]).unwrap(), 0);
    }

    #[test]
    fn test_run_reports_failures() {
        let temp = fixture();
        write(temp.path(), "role/lonely/role.yaml", "name: lonely\n");
        assert_eq!(run_in(&temp, &["validate"]).unwrap(), 1);

        let err = run_in(&temp, &["show", "tool", "../secrets"]).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid tool name"));

        let err = run_in(&temp, &["validate", "--schemas", "/nonexistent"]).unwrap_err();
        assert!(err.to_string().contains("Failed to load schemas"));
    }

    #[test]
    fn test_run_uses_config_file() {
        let temp = fixture();
        write(
            temp.path(),
            "config/config.yaml",
            "parser: builtin\npaths:\n  schemas_dir: /nonexistent\n",
        );

        // Schema directory from the config file
        assert!(run_in(&temp, &["validate"]).is_err());
        assert_eq!(
            run_in(
                &temp,
                &["validate", "--schemas", temp.path().join("schemas").to_str().unwrap()]
            )
            .unwrap(),
            0
        );
    }
}
