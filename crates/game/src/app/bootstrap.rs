use keepsake_engine::persistence::SETTINGS_KEY;
use keepsake_engine::{
    resolve_app_paths, AppPaths, BlobStore, Engine, EngineConfig, FileBlobStore, LoopConfig,
    Player, Session, StartupError, Vec2, DEFAULT_PLAYER_SPEED,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::catalog::load_catalog;
use super::hud::InventoryHud;
use super::reactions;
use super::rooms::{build_rooms, HALL};

const PLAYER_START: Vec2 = Vec2::new(120.0, 240.0);
const PLAYER_SIZE: Vec2 = Vec2::new(28.0, 40.0);

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) engine: Engine,
    pub(crate) session: Session<FileBlobStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunMode {
    Windowed,
    /// Runs this many synthetic frames without opening a window.
    Headless { frames: u32 },
}

pub(crate) fn parse_run_mode<I>(args: I) -> Result<RunMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut mode = RunMode::Windowed;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => {
                let raw = args
                    .next()
                    .ok_or_else(|| "--headless needs a frame count".to_string())?;
                let frames = raw
                    .parse::<u32>()
                    .map_err(|error| format!("invalid frame count '{raw}': {error}"))?;
                mode = RunMode::Headless { frames };
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(mode)
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    info!("=== Keepsake Startup ===");
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        save_dir = %paths.save_dir.display(),
        "startup"
    );
    Ok(wire(&paths))
}

fn wire(paths: &AppPaths) -> AppWiring {
    let catalog = load_catalog(&paths.assets_dir);
    let mut session = Session::new(FileBlobStore::new(&paths.save_dir));
    let settings = session.load_settings();
    if session.store().get(SETTINGS_KEY).is_none() {
        // Leave an editable settings file behind on first run.
        if let Err(error) = session.save_settings(&settings) {
            warn!(error = %error, "settings_write_failed");
        }
    }

    let mut engine = Engine::new(EngineConfig {
        initial_scene: Some(HALL.to_string()),
        ..EngineConfig::default()
    });
    for room in build_rooms(&catalog) {
        engine.add_scene(room);
    }
    engine.add_game_object(
        Player::new(PLAYER_START, PLAYER_SIZE, DEFAULT_PLAYER_SPEED).with_sprite("sprites/player"),
    );
    engine.add_game_object(InventoryHud::new(engine.inventory().capacity()));
    reactions::install(&mut engine, &catalog);
    session.apply_settings(&mut engine, &settings);

    let config = LoopConfig {
        sprite_dir: Some(paths.assets_dir.clone()),
        show_stats: settings.show_stats,
        ..LoopConfig::default()
    };

    AppWiring {
        config,
        engine,
        session,
    }
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use keepsake_engine::persistence::Settings;
    use tempfile::TempDir;

    use super::*;
    use crate::app::rooms::STUDY;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    fn temp_paths(temp: &TempDir) -> AppPaths {
        AppPaths {
            root: temp.path().to_path_buf(),
            assets_dir: temp.path().join("assets"),
            save_dir: temp.path().join("saves"),
        }
    }

    #[test]
    fn run_mode_defaults_to_windowed() {
        assert_eq!(parse_run_mode(args(&[])), Ok(RunMode::Windowed));
        assert_eq!(
            parse_run_mode(args(&["--headless", "120"])),
            Ok(RunMode::Headless { frames: 120 })
        );
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(parse_run_mode(args(&["--headless"])).is_err());
        assert!(parse_run_mode(args(&["--headless", "many"])).is_err());
        assert!(parse_run_mode(args(&["--fullscreen"])).is_err());
    }

    #[test]
    fn wiring_registers_rooms_and_writes_default_settings() {
        let temp = TempDir::new().expect("temp dir");
        let paths = temp_paths(&temp);

        let app = wire(&paths);

        assert!(app.engine.has_scene(HALL));
        assert!(app.engine.has_scene(STUDY));
        assert_eq!(app.engine.game_object_count(), 2);
        assert!(paths.save_dir.join("settings.json").is_file());
        assert_eq!(app.session.load_settings(), Settings::default());
        assert_eq!(app.config.sprite_dir.as_deref(), Some(paths.assets_dir.as_path()));
    }

    #[test]
    fn saved_settings_are_applied() {
        let temp = TempDir::new().expect("temp dir");
        let paths = temp_paths(&temp);
        Session::new(FileBlobStore::new(&paths.save_dir))
            .save_settings(&Settings {
                dialogue_duration_ms: 900,
                show_stats: true,
            })
            .expect("save settings");

        let app = wire(&paths);

        assert_eq!(app.engine.dialogue_duration_ms(), 900);
        assert!(app.config.show_stats);
    }
}
