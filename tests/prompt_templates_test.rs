use std::fs;

use jivan::{ConfigError, Domain, PromptComposer};
use tempfile::TempDir;

#[test]
fn test_directory_overrides_single_domain() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sikh.txt"),
        "You are a gentle granthi.\n\nUser Question: {{ question }}\n",
    )
    .unwrap();

    let composer = PromptComposer::from_dir(dir.path()).unwrap();
    assert_eq!(
        composer.compose(Domain::Sikh, "What is langar?"),
        "You are a gentle granthi.\n\nUser Question: What is langar?"
    );
    // Domains without a file keep the built-in template.
    assert!(composer.compose(Domain::Christian, "q").contains("Jesus Christ"));
    assert_eq!(composer.source_dir().map(|p| p.as_path()), Some(dir.path()));
}

#[test]
fn test_missing_directory_is_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = PromptComposer::from_dir(&missing).err().unwrap();
    assert!(matches!(err, ConfigError::TemplateDir { .. }));
}

#[test]
fn test_template_without_question_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hindu.txt"), "You are a guide.").unwrap();

    let err = PromptComposer::from_dir(dir.path()).err().unwrap();
    match err {
        ConfigError::TemplateMissingQuestion { name } => assert_eq!(name, "hindu.txt"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_syntax_error_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("muslim.txt"), "Broken {% if %} {{ question }}").unwrap();

    let err = PromptComposer::from_dir(dir.path()).err().unwrap();
    assert!(matches!(err, ConfigError::Template { ref name, .. } if name == "muslim.txt"));
}
