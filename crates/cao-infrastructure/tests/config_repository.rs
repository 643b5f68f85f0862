use std::fs;

use cao_core::config::{CaoConfig, ModelConfig};
use cao_core::error::CaoError;
use cao_core::repository::ConfigRepository;
use cao_infrastructure::TomlConfigRepository;
use tempfile::TempDir;

fn repository(dir: &TempDir) -> TomlConfigRepository {
    TomlConfigRepository::with_path(dir.path().join("cao").join("config.toml"))
}

#[tokio::test]
async fn missing_file_is_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);

    let config = repo.load().await.unwrap();

    assert_eq!(config, CaoConfig::default());
    assert!(repo.path().exists());
    let written = fs::read_to_string(repo.path()).unwrap();
    assert!(written.contains("default_model = \"deepseek\""));
}

#[tokio::test]
async fn user_file_is_merged_over_defaults() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);
    fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
    fs::write(
        repo.path(),
        r#"
default_model = "local"

[models.local]
api_base = "http://127.0.0.1:8080/v1"
model = "llama3"
provider = "ollama"

[models.openai]
api_base = "https://proxy.internal/v1"
model = "gpt-4o-mini"
"#,
    )
    .unwrap();

    let config = repo.load().await.unwrap();

    assert_eq!(config.default_model, "local");
    assert!(config.models.contains_key("deepseek"));
    assert_eq!(config.models["openai"].model, "gpt-4o-mini");
}

#[tokio::test]
async fn update_persists_changes() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);

    repo.update(|config| {
        config.add_model(
            "moonshot",
            ModelConfig::new("https://api.moonshot.cn/v1", "moonshot-v1-8k", "moonshot"),
        );
        config.set_default_model("moonshot")
    })
    .await
    .unwrap();

    let reloaded = repository(&dir).load().await.unwrap();
    assert_eq!(reloaded.default_model, "moonshot");
    assert_eq!(reloaded.models["moonshot"].model, "moonshot-v1-8k");
}

#[tokio::test]
async fn removed_builtin_model_stays_removed_after_reload() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);

    repo.update(|config| config.remove_model("openai").map(|_| ()))
        .await
        .unwrap();

    let reloaded = repository(&dir).load().await.unwrap();
    assert!(!reloaded.models.contains_key("openai"));
    assert!(reloaded.models.contains_key("deepseek"));
    assert_eq!(reloaded.removed_models, vec!["openai".to_string()]);

    repo.update(|config| {
        config.add_model(
            "openai",
            ModelConfig::new("https://api.openai.com/v1", "gpt-4o-mini", "openai"),
        );
        Ok(())
    })
    .await
    .unwrap();

    let reloaded = repository(&dir).load().await.unwrap();
    assert_eq!(reloaded.models["openai"].model, "gpt-4o-mini");
    assert!(reloaded.removed_models.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cao").join("config.toml");
    repository(&dir).load().await.unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            tokio::spawn(async move {
                let repo = TomlConfigRepository::with_path(path);
                for i in 0..5 {
                    let name = format!("worker{worker}-{i}");
                    repo.update(move |config| {
                        config.add_model(name, ModelConfig::new("http://127.0.0.1:8080/v1", "llama3", "ollama"));
                        Ok(())
                    })
                    .await
                    .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }

    let config = TomlConfigRepository::with_path(path).load().await.unwrap();
    let added = config.models.keys().filter(|name| name.starts_with("worker")).count();
    assert_eq!(added, 20);
}

#[tokio::test]
async fn failed_update_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);
    let before = repo.load().await.unwrap();

    let err = repo
        .update(|config| config.remove_model("deepseek").map(|_| ()))
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert_eq!(repo.load().await.unwrap(), before);
}

#[tokio::test]
async fn malformed_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let repo = repository(&dir);
    fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
    fs::write(repo.path(), "default_model = [").unwrap();

    let err = repo.load().await.unwrap_err();
    assert!(matches!(err, CaoError::Serialization { .. }));
}

#[test]
fn import_rejects_default_that_names_no_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("import.toml");
    fs::write(
        &path,
        r#"
default_model = "ghost"

[models.local]
api_base = "http://127.0.0.1:8080/v1"
model = "llama3"
"#,
    )
    .unwrap();

    assert!(TomlConfigRepository::read_external(&path).unwrap_err().is_config());
}
