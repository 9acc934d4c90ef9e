//! Dungeon packager
//!
//! Loads dungeon packages and their boss/chest catalogs, lists their
//! placements, and previews installs against an in-memory world.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dungeon_core::{
    BasePackage, BossCatalog, Catalog, CatalogEntry, ChestCatalog, DryRunEngine, DungeonContext,
    DungeonPackage, PackageConfig, PackageManager, StructurePackage, World,
};
use dungeon_packager::config::AppConfig;

#[derive(Parser)]
#[command(version, about = "Inspect and preview dungeon packages")]
struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List packages with their relative and absolute placements
    List,
    /// Install a package into an empty world and show what it spawns
    Preview {
        /// Package filename, e.g. crypt.ron
        package: String,
        /// Do not paste the structure
        #[arg(long)]
        no_paste: bool,
    },
}

fn dry_run_base(config: &PackageConfig) -> Box<dyn BasePackage> {
    Box::new(StructurePackage::new(config, Box::new(DryRunEngine)))
}

fn load_catalog<T: CatalogEntry>(dir: &Path) -> Catalog<T> {
    Catalog::load_dir(dir).unwrap_or_else(|e| {
        log::warn!("Failed to load catalog {}: {}. Using an empty one.", dir.display(), e);
        Catalog::new()
    })
}

fn list(manager: &PackageManager) {
    if manager.is_empty() {
        println!("No dungeon packages loaded");
        return;
    }

    for package in manager.packages() {
        let transform = package.transform();
        println!("{} ({}) [{}]", package.name(), package.id(), package.state());
        match transform {
            Some(t) => println!("  anchor {} rotated {} degrees", t.anchor, t.rotation.degrees()),
            None => println!("  no anchor point"),
        }

        for table in [package.boss_locations(), package.chest_locations()] {
            for (key, offset) in table.iter() {
                let absolute = transform
                    .map(|t| t.to_absolute(offset).to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {} {} at {} -> {}", table.kind(), key, offset, absolute);
            }
            for rejected in table.rejected() {
                println!("  skipped {} entry '{}': {}", table.kind(), rejected.raw, rejected.error);
            }
        }

        let mut keys: Vec<&str> = manager.registry().keys_for(package.id()).collect();
        keys.sort_unstable();
        if !keys.is_empty() {
            println!("  owns {}", keys.join(", "));
        }
    }

    println!("{} content keys registered", manager.registry().len());
}

fn preview(
    manager: &PackageManager,
    filename: &str,
    paste: bool,
    bosses: &BossCatalog,
    chests: &ChestCatalog,
) -> ExitCode {
    let Some(loaded) = manager.get(filename) else {
        log::error!("Dungeon package {} is not loaded", filename);
        return ExitCode::FAILURE;
    };

    // Preview a fresh copy so the loaded package and its file stay untouched
    let config = loaded.config().clone().with_enabled(false);
    let base = dry_run_base(&config);
    let mut package = DungeonPackage::new(config, base);

    let mut world = World::new();
    let mut ctx = DungeonContext::new(&mut world, bosses, chests);
    if !package.install("preview", paste, &mut ctx) {
        println!("{} could not be installed", filename);
        return ExitCode::FAILURE;
    }

    for &key in package.attached_bosses() {
        if let Some(boss) = world.boss(key) {
            println!("boss {} level {} at {}", boss.definition_key(), boss.level(), boss.spawn_location());
        }
    }
    for &key in package.attached_chests() {
        if let Some(chest) = world.chest(key) {
            println!("treasure chest {} at {}", chest.definition_key(), chest.location());
        }
    }
    match package.level_bounds() {
        Some(bounds) => println!("levels {}", bounds),
        None => println!("no bosses attached"),
    }

    package.uninstall("preview", &mut world);
    log::debug!(
        "World after uninstall: {} bosses, {} chests",
        world.boss_count(),
        world.chest_count()
    );
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_error) = match AppConfig::load_from(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.debug.log_level))
        .init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    let mut manager = PackageManager::with_policy(config.registry.collision_policy);
    if let Err(e) = manager.load_dir(&config.paths.packages, dry_run_base) {
        log::error!("Failed to load packages from {}: {}", config.paths.packages.display(), e);
        return ExitCode::FAILURE;
    }
    manager.base_initialize();

    let bosses: BossCatalog = load_catalog(&config.paths.bosses);
    let chests: ChestCatalog = load_catalog(&config.paths.chests);

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => {
            list(&manager);
            ExitCode::SUCCESS
        }
        Commands::Preview { package, no_paste } => preview(&manager, &package, !no_paste, &bosses, &chests),
    }
}
