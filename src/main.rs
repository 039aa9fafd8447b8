use anki_media_volume::cli::{Args, Command};
use anki_media_volume::commands::{AppContext, CommandOptions};
use anki_media_volume::config::{ConfigLoad, Configuration};
use anki_media_volume::dedup::{DedupStore, DEFAULT_WAIT_LIMIT};
use anki_media_volume::media::{AudioInspector, SystemFileManager};
use anki_media_volume::progress::Progress;
use anki_media_volume::prompt::Prompt;
use anki_media_volume::session::SessionStore;
use anki_media_volume::ui::{Ui, UiConfig};
use anki_media_volume::{logging, menu, AppError};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("\nError: {}", e.detailed_message());
        std::process::exit(e.exit_code().into());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config = match Configuration::load_or_create(&args.config)? {
        ConfigLoad::Loaded(config) => config.with_env_overrides(),
        ConfigLoad::Created(path) => {
            println!(
                "Created a new configuration file at {}.\n\
                 Please review it, especially \"ankiMediaFolderPath\", then run the program again.",
                path.display()
            );
            return Ok(());
        }
    };
    debug!("Effective configuration: {:?}", config);

    let ui_config = UiConfig::new(args.verbose > 0);
    let progress = Progress::new_with_ui(ui_config.verbose, ui_config.colors_enabled);
    let mut ui = Ui::new(ui_config);
    ui.print_header(env!("CARGO_PKG_VERSION"));

    let dedup = DedupStore::open(&config.database_path, DEFAULT_WAIT_LIMIT)?;
    let sessions = SessionStore::new(config.undo_sessions_folder_path.clone());

    let mut ctx = AppContext {
        sessions,
        dedup,
        inspector: Box::new(AudioInspector),
        viewer: Box::new(SystemFileManager),
        ui,
        prompt: Prompt::stdio(),
        progress,
        options: CommandOptions {
            assume_yes: args.yes,
            undo_latest: matches!(args.command, Some(Command::Undo { latest: true })),
        },
        config,
    };

    let result = match &args.command {
        Some(command) => {
            let key = command.key();
            let (name, action) = menu::find(key)
                .ok_or_else(|| AppError::Other(format!("No action registered for {:?}", key)))?;
            info!("Running {}", name);
            action(&mut ctx)
        }
        None => {
            menu::run(&menu::root(), &mut ctx);
            Ok(())
        }
    };

    ctx.dedup.close();
    result
}
