//! Integration tests for the bundled sample data
//!
//! Loads `data/` the same way the binary does and previews an install.

use dungeon_core::{
    BasePackage, BossCatalog, ChestCatalog, DryRunEngine, DungeonContext, PackageConfig,
    PackageManager, StructurePackage, Vec3, World,
};
use dungeon_packager::config::AppConfig;

fn dry_run(config: &PackageConfig) -> Box<dyn BasePackage> {
    Box::new(StructurePackage::new(config, Box::new(DryRunEngine)))
}

#[test]
fn test_sample_packages_install() {
    let paths = AppConfig::default().paths;

    let mut manager = PackageManager::new();
    assert_eq!(manager.load_dir(&paths.packages, dry_run).unwrap(), 1);
    assert_eq!(manager.base_initialize(), 3);

    let bosses = BossCatalog::load_dir(&paths.bosses).unwrap();
    let chests = ChestCatalog::load_dir(&paths.chests).unwrap();
    assert_eq!(bosses.len(), 2);
    assert_eq!(chests.len(), 1);

    let mut world = World::new();
    let mut ctx = DungeonContext::new(&mut world, &bosses, &chests);
    assert!(manager.install("sunken_crypt.ron", "test", true, &mut ctx).unwrap());

    let package = manager.get("sunken_crypt.ron").unwrap();
    assert_eq!(package.name(), "Sunken Crypt");
    assert_eq!(package.attached_bosses().len(), 2);
    assert_eq!(package.lowest_level(), Some(7));
    assert_eq!(package.highest_level(), Some(12));

    // Offset (0, 1, 18) rotated a quarter turn lands 18 blocks east of the anchor
    let chest = world.chest(package.attached_chests()[0]).unwrap();
    assert!(chest.location().approx_eq(Vec3::new(138.0, 49.0, -310.0), 1e-9));
}
