use nimbus_core::config::{AppConfig, ConfigError, ConfigValue};
use serial_test::serial;

#[test]
fn test_empty_config() {
    let config = AppConfig::empty();
    assert!(matches!(
        config.get::<String>("nonexistent"),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn test_set_and_get() {
    let mut config = AppConfig::empty();
    config.set("oidc.authority", ConfigValue::String("https://idp.example".into()));
    assert_eq!(
        config.get::<String>("oidc.authority").unwrap(),
        "https://idp.example"
    );
}

#[test]
fn test_get_or_default() {
    let config = AppConfig::empty();
    assert_eq!(config.get_or("missing", 42i64), 42);
}

#[test]
fn test_get_optional() {
    let mut config = AppConfig::empty();
    config.set("present", ConfigValue::String("x".into()));
    config.set("null_val", ConfigValue::Null);
    assert_eq!(config.get_optional::<String>("present").unwrap().as_deref(), Some("x"));
    assert!(config.get_optional::<String>("null_val").unwrap().is_none());
    assert!(config.get_optional::<String>("absent").unwrap().is_none());
}

#[test]
fn test_type_mismatch() {
    let mut config = AppConfig::empty();
    config.set("flag", ConfigValue::String("maybe".into()));
    assert!(matches!(
        config.get::<bool>("flag"),
        Err(ConfigError::TypeMismatch { expected: "bool", .. })
    ));
}

#[test]
fn test_flatten_yaml() {
    let yaml = r#"
oidc:
  authority: "https://idp.example"
  client_id: abc
  scopes:
    - email
    - profile
session:
  idle_timeout_secs: 600
"#;
    let config = AppConfig::from_yaml_str(yaml, "test").unwrap();

    assert_eq!(config.get::<String>("oidc.authority").unwrap(), "https://idp.example");
    assert_eq!(config.get::<String>("oidc.client_id").unwrap(), "abc");
    assert_eq!(
        config.get::<Vec<String>>("oidc.scopes").unwrap(),
        vec!["email", "profile"]
    );
    assert_eq!(config.get::<u64>("session.idle_timeout_secs").unwrap(), 600);
}

#[test]
fn test_comma_separated_list() {
    let mut config = AppConfig::empty();
    config.set("oidc.scopes", ConfigValue::String("email, profile,".into()));
    assert_eq!(
        config.get::<Vec<String>>("oidc.scopes").unwrap(),
        vec!["email", "profile"]
    );
}

#[test]
fn test_invalid_yaml_is_load_error() {
    let result = AppConfig::from_yaml_str("oidc: [unterminated", "test");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial]
fn test_load_from_dir_with_profile_and_env() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("application.yaml"),
        "oidc:\n  authority: https://base.example\n  client_id: base\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("application-prod.yaml"),
        "oidc:\n  authority: https://prod.example\n",
    )
    .unwrap();

    std::env::remove_var("NIMBUS_PROFILE");
    std::env::set_var("OIDC__CLIENT_ID", "from-env");

    let config = AppConfig::load_from_dir(dir.path(), "prod").unwrap();

    std::env::remove_var("OIDC__CLIENT_ID");

    assert_eq!(config.profile(), "prod");
    assert_eq!(config.get::<String>("oidc.authority").unwrap(), "https://prod.example");
    assert_eq!(config.get::<String>("oidc.client_id").unwrap(), "from-env");
}

#[test]
#[serial]
fn test_profile_env_var_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("NIMBUS_PROFILE", "staging");
    let config = AppConfig::load_from_dir(dir.path(), "dev").unwrap();
    std::env::remove_var("NIMBUS_PROFILE");
    assert_eq!(config.profile(), "staging");
}
