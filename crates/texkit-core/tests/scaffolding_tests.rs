use texkit_core::config::LayoutConfig;
use texkit_core::{check_platform, Environment, ProjectLayout};

#[test]
fn test_ensure_layout_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp_dir.path(), &LayoutConfig::default());

    let created = layout.ensure().unwrap();
    assert_eq!(created.len(), 4);
    assert!(layout.src.is_dir());
    assert!(layout.build.is_dir());
    assert!(layout.logs.is_dir());
    assert!(layout.templates.is_dir());

    // Leave a marker to prove nothing gets recreated.
    let marker = layout.build.join("keep.pdf");
    std::fs::write(&marker, "x").unwrap();

    let created_again = layout.ensure().unwrap();
    assert!(created_again.is_empty());
    assert!(marker.exists());
}

#[test]
fn test_ensure_layout_creates_only_missing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp_dir.path(), &LayoutConfig::default());
    std::fs::create_dir_all(&layout.src).unwrap();

    let created = layout.ensure().unwrap();
    assert!(!created.contains(&layout.src));
    assert_eq!(created.len(), 3);
}

#[test]
fn test_sample_document_never_overwrites() {
    let temp_dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp_dir.path(), &LayoutConfig::default());

    assert!(layout.write_sample_document().unwrap());
    let content = std::fs::read_to_string(&layout.main_document).unwrap();
    assert!(content.contains("\\begin{document}"));

    std::fs::write(&layout.main_document, "mine").unwrap();
    assert!(!layout.write_sample_document().unwrap());
    assert_eq!(std::fs::read_to_string(&layout.main_document).unwrap(), "mine");
}

#[test]
fn test_platform_gate_uses_environment_not_host() {
    let mut env = Environment::from_process(std::env::current_dir().unwrap());
    env.os = "macos".to_string();
    assert!(check_platform(&env, "windows").is_err());

    env.os = "windows".to_string();
    assert!(check_platform(&env, "windows").is_ok());
}
