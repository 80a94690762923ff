use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use appinstall::config::Config;
use appinstall::core::parse_terminal;
use appinstall::interactive::{Session, SessionOutcome};
use appinstall::{InstallRequest, Installer, list, logger};
use clap::{Args, Parser, Subcommand};

const EXIT_IO: u8 = 6;
const EXIT_USAGE: u8 = 64;
const EXIT_CONFIG: u8 = 78;

#[derive(Parser, Debug)]
#[command(name = "appinstall", version)]
#[command(about = "Install standalone executables such as AppImages as desktop applications")]
struct Cli {
    /// Config file (defaults to $APPINSTALL_CONFIG or ~/.config/appinstall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one subdirectory per installed application
    #[arg(long, global = true)]
    packages_root: Option<PathBuf>,

    /// Directory scanned by the desktop environment for .desktop files
    #[arg(long, global = true)]
    desktop_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install an application from command-line flags
    Install(InstallArgs),
    /// Fill in the install form through a numbered menu
    Interactive,
    /// Show applications under the packages root
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct InstallArgs {
    /// Short unique identifier, used as directory and .desktop file name
    #[arg(long = "id")]
    app_id: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Executable to install
    #[arg(long = "exec")]
    executable: PathBuf,

    /// Extra file copied next to the executable (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    additional_files: Vec<PathBuf>,

    /// Directory whose contents are merged next to the executable
    #[arg(long, value_name = "DIR")]
    files_dir: Option<PathBuf>,

    #[arg(long)]
    icon: Option<PathBuf>,

    #[arg(long)]
    comment: Option<String>,

    #[arg(long)]
    generic_name: Option<String>,

    /// Desktop entry category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// Search keyword (repeatable)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Run in a terminal: true, false, 1 or 0
    #[arg(long, value_parser = parse_terminal)]
    terminal: Option<bool>,

    /// Validate and print the planned layout without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut config = match Config::load_with(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    config.override_directories(cli.packages_root, cli.desktop_dir);

    if let Err(err) = logger::init_logger(&config) {
        eprintln!("⚠️  {}", err);
    }

    match cli.command {
        Command::Install(args) => run_install(args, &config),
        Command::Interactive => run_interactive(&config),
        Command::List { json } => run_list(&config, json),
    }
}

fn run_install(args: InstallArgs, config: &Config) -> ExitCode {
    let mut builder = InstallRequest::builder()
        .app_id(args.app_id)
        .app_name(args.name)
        .executable(args.executable)
        .terminal(args.terminal);
    for file in args.additional_files {
        builder = builder.additional_file(file);
    }
    if let Some(dir) = args.files_dir {
        builder = builder.additional_files_dir(dir);
    }
    if let Some(icon) = args.icon {
        builder = builder.icon(icon);
    }
    if let Some(comment) = args.comment {
        builder = builder.comment(comment);
    }
    if let Some(generic_name) = args.generic_name {
        builder = builder.generic_name(generic_name);
    }
    for category in args.categories {
        builder = builder.category(category);
    }
    for keyword in args.keywords {
        builder = builder.keyword(keyword);
    }

    let request = match builder.build() {
        Ok(request) => request,
        Err(err) => {
            eprintln!("❌ {}", err);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let installer = Installer::new(config.installer_config()).with_dry_run(args.dry_run);
    match installer.install(&request) {
        Ok(installed) => {
            let prefix = if args.dry_run { "[DRY RUN] Would install" } else { "✅ Installed" };
            println!("{} {} into {}", prefix, installed.app_id, installed.app_dir.display());
            println!("   Executable:    {}", installed.executable.display());
            if let Some(icon) = &installed.icon {
                println!("   Icon:          {}", icon.display());
            }
            println!("   Desktop entry: {}", installed.desktop_entry.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("❌ {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run_interactive(config: &Config) -> ExitCode {
    let session = Session::new(io::stdin().lock(), io::stdout(), config.installer_config());
    match session.run() {
        Ok(SessionOutcome::Installed(_)) | Ok(SessionOutcome::Cancelled) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {}", err);
            ExitCode::from(EXIT_IO)
        }
    }
}

fn run_list(config: &Config, json: bool) -> ExitCode {
    let result = list::collect(&config.installer_config()).and_then(|apps| list::print_list(&apps, json));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}
