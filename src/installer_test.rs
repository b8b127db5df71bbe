use super::*;
use crate::fs::mock::MockFs;
use crate::fs::RealFs;
use tempfile::TempDir;

fn installer(fs: &Arc<MockFs>) -> Installer {
    Installer::new(fs.clone(), "toc")
}

fn staging_leftovers(fs: &MockFs, addons_dir: &str) -> Vec<String> {
    fs.read_dir(Path::new(addons_dir))
        .unwrap()
        .iter()
        .map(FsDirEntry::name)
        .filter(|n| n.starts_with(STAGING_PREFIX))
        .collect()
}

// =========================================================================
// マニフェストの有無による配置
// =========================================================================

#[test]
fn test_place_single_addon_when_manifest_at_top_level() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/Ace3.toc", "## Title: Ace3");
    fs.add_file("/payload/AceAddon-3.0/AceAddon-3.0.lua", "-- lua");
    fs.add_file("/payload/.git/HEAD", "ref: refs/heads/master");
    fs.add_dir("/addons");

    let placement = installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "Ace3")
        .unwrap();

    assert_eq!(placement.folders, vec!["Ace3".to_string()]);
    assert!(fs.exists(Path::new("/addons/Ace3/Ace3.toc")));
    assert!(fs.exists(Path::new("/addons/Ace3/AceAddon-3.0/AceAddon-3.0.lua")));
    assert!(!fs.exists(Path::new("/addons/Ace3/.git")));
}

#[test]
fn test_place_each_entry_when_no_manifest() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/ElvUI_OptionsUI/ElvUI_OptionsUI.toc", "toc");
    fs.add_file("/payload/ElvUI/ElvUI.toc", "toc");
    fs.add_file("/payload/.gitlab/ci.yml", "ci");
    fs.add_dir("/addons");

    let placement = installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "elvui")
        .unwrap();

    assert_eq!(
        placement.folders,
        vec!["ElvUI".to_string(), "ElvUI_OptionsUI".to_string()]
    );
    assert!(fs.exists(Path::new("/addons/ElvUI/ElvUI.toc")));
    assert!(fs.exists(Path::new("/addons/ElvUI_OptionsUI/ElvUI_OptionsUI.toc")));
    assert!(!fs.exists(Path::new("/addons/.gitlab")));
    assert!(!fs.exists(Path::new("/addons/elvui")));
}

#[test]
fn test_place_manifest_extension_is_case_insensitive() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/Details.TOC", "toc");

    let placement = installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "Details")
        .unwrap();

    assert_eq!(placement.folders, vec!["Details".to_string()]);
}

#[test]
fn test_place_manifest_in_subdirectory_does_not_count() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/Bagnon/Bagnon.toc", "toc");
    fs.add_file("/payload/README.md", "readme");

    let placement = installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "Bagnon")
        .unwrap();

    assert_eq!(
        placement.folders,
        vec!["Bagnon".to_string(), "README.md".to_string()]
    );
}

// =========================================================================
// 置き換えとステージング
// =========================================================================

#[test]
fn test_place_replaces_existing_folder() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/addons/Ace3/Ace3.toc", "old");
    fs.add_file("/addons/Ace3/Removed.lua", "old");
    fs.add_file("/payload/Ace3.toc", "new");

    installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "Ace3")
        .unwrap();

    assert_eq!(fs.read("/addons/Ace3/Ace3.toc").as_deref(), Some("new"));
    assert!(!fs.exists(Path::new("/addons/Ace3/Removed.lua")));
    assert!(staging_leftovers(&fs, "/addons").is_empty());
}

#[test]
fn test_place_leaves_unrelated_folders_alone() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/addons/Other/Other.toc", "other");
    fs.add_file("/payload/Ace3.toc", "toc");

    installer(&fs)
        .place(Path::new("/payload"), Path::new("/addons"), "Ace3")
        .unwrap();

    assert_eq!(fs.read("/addons/Other/Other.toc").as_deref(), Some("other"));
}

#[test]
fn test_place_failure_names_path_and_cleans_staging() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/addons/Ace3/Ace3.toc", "old");
    fs.fail_removal_of("/addons/Ace3");
    fs.add_file("/payload/Ace3.toc", "new");

    let result = installer(&fs).place(Path::new("/payload"), Path::new("/addons"), "Ace3");

    match result {
        Err(AomError::Install { path, .. }) => assert_eq!(path, PathBuf::from("/addons/Ace3")),
        other => panic!("Expected Install error, got: {:?}", other),
    }
    assert!(staging_leftovers(&fs, "/addons").is_empty());
    assert_eq!(fs.read("/addons/Ace3/Ace3.toc").as_deref(), Some("old"));
}

// =========================================================================
// エラー
// =========================================================================

#[test]
fn test_place_empty_payload_is_error() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/.git/HEAD", "ref");

    let result = installer(&fs).place(Path::new("/payload"), Path::new("/addons"), "Empty");

    assert!(matches!(result, Err(AomError::Install { .. })));
    assert!(!fs.exists(Path::new("/addons")));
}

#[test]
fn test_place_rejects_unsafe_fallback_name() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/payload/Evil.toc", "toc");

    let result = installer(&fs).place(Path::new("/payload"), Path::new("/addons"), "../escape");

    assert!(matches!(result, Err(AomError::Install { .. })));
    assert!(!fs.exists(Path::new("/escape")));
}

// =========================================================================
// 実ファイルシステム
// =========================================================================

#[test]
fn test_place_with_real_fs() {
    let temp_dir = TempDir::new().unwrap();
    let payload = temp_dir.path().join("payload");
    let addons = temp_dir.path().join("AddOns");
    std::fs::create_dir_all(payload.join("Bagnon")).unwrap();
    std::fs::create_dir_all(payload.join("Bagnon_Config")).unwrap();
    std::fs::write(payload.join("Bagnon/Bagnon.toc"), "toc").unwrap();
    std::fs::write(payload.join("Bagnon_Config/Bagnon_Config.toc"), "toc").unwrap();

    let installer = Installer::new(Arc::new(RealFs), "toc");
    let placement = installer.place(&payload, &addons, "Bagnon").unwrap();

    assert_eq!(placement.folders, vec!["Bagnon", "Bagnon_Config"]);
    assert!(addons.join("Bagnon/Bagnon.toc").is_file());
    assert!(addons.join("Bagnon_Config/Bagnon_Config.toc").is_file());

    let leftovers: Vec<_> = std::fs::read_dir(&addons)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
        .collect();
    assert!(leftovers.is_empty());
}
