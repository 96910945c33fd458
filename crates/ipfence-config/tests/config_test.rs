#![allow(clippy::unwrap_used)]
// Config layering and credential resolution.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};

use ipfence_config::{
    Config, ConfigError, CredentialOverrides, Defaults, Profile, load_config_from,
    profile_to_reconciler_config, resolve_credentials_with,
};

// ── Loading ─────────────────────────────────────────────────────────

#[test]
fn test_missing_file_yields_defaults() {
    Jail::expect_with(|jail| {
        let cfg = load_config_from(&jail.directory().join("absent.toml"))
            .map_err(|e| e.to_string())?;
        assert_eq!(cfg, Config::default());
        Ok(())
    });
}

#[test]
fn test_toml_profiles_and_env_override() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                default_profile = "prod"

                [defaults]
                timeout = 45

                [profiles.prod]
                tenant_id = "tenant-prod"
                client_id = "client-prod"
                client_secret_env = "PROD_SECRET"
                poll_interval = 5
            "#,
        )?;
        jail.set_env("IPFENCE_DEFAULTS__TIMEOUT", "60");

        let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

        assert_eq!(cfg.active_profile_name(None), "prod");
        assert_eq!(cfg.defaults.timeout, 60);
        assert_eq!(cfg.defaults.output, "table");
        let prod = cfg.profile("prod").map_err(|e| e.to_string())?;
        assert_eq!(prod.tenant_id.as_deref(), Some("tenant-prod"));
        assert_eq!(prod.poll_interval, Some(5));
        Ok(())
    });
}

// ── Credentials ─────────────────────────────────────────────────────

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_arm_env_fills_gaps() {
    let profile = Profile {
        client_secret: Some("from-profile".into()),
        ..Profile::default()
    };
    let env = env_of(&[
        ("ARM_TENANT_ID", "tenant-env"),
        ("ARM_CLIENT_ID", "client-env"),
        ("ARM_CLIENT_SECRET", "secret-env"),
    ]);

    let creds =
        resolve_credentials_with(&profile, "default", &CredentialOverrides::default(), env)
            .unwrap();

    assert_eq!(creds.tenant_id, "tenant-env");
    assert_eq!(creds.client_id, "client-env");
    assert_eq!(creds.client_secret.expose_secret(), "from-profile");
}

#[test]
fn test_overrides_beat_profile_and_env() {
    let profile = Profile {
        tenant_id: Some("tenant-profile".into()),
        client_id: Some("client-profile".into()),
        client_secret: Some("secret-profile".into()),
        ..Profile::default()
    };
    let overrides = CredentialOverrides {
        tenant_id: Some("tenant-flag".into()),
        client_id: None,
        client_secret: Some(SecretString::from("secret-flag".to_string())),
    };
    let env = env_of(&[("ARM_CLIENT_ID", "client-env")]);

    let creds = resolve_credentials_with(&profile, "default", &overrides, env).unwrap();

    assert_eq!(creds.tenant_id, "tenant-flag");
    assert_eq!(creds.client_id, "client-profile");
    assert_eq!(creds.client_secret.expose_secret(), "secret-flag");
}

#[test]
fn test_secret_env_indirection_wins_over_plaintext() {
    let profile = Profile {
        tenant_id: Some("t".into()),
        client_id: Some("c".into()),
        client_secret: Some("plaintext".into()),
        client_secret_env: Some("MY_SECRET".into()),
        ..Profile::default()
    };
    let env = env_of(&[("MY_SECRET", "indirect")]);

    let creds =
        resolve_credentials_with(&profile, "default", &CredentialOverrides::default(), env)
            .unwrap();

    assert_eq!(creds.client_secret.expose_secret(), "indirect");
}

#[test]
fn test_missing_tenant_names_env_var() {
    let err = resolve_credentials_with(
        &Profile::default(),
        "ci",
        &CredentialOverrides::default(),
        env_of(&[]),
    )
    .unwrap_err();

    match err {
        ConfigError::MissingCredential {
            field,
            ref profile,
            env,
        } => {
            assert_eq!(field, "tenant_id");
            assert_eq!(profile, "ci");
            assert_eq!(env, "ARM_TENANT_ID");
        }
        other => panic!("expected MissingCredential, got {other:?}"),
    }
}

// ── Translation ─────────────────────────────────────────────────────

fn creds() -> ipfence_core::ClientCredentials {
    ipfence_core::ClientCredentials {
        tenant_id: "t".into(),
        client_id: "c".into(),
        client_secret: SecretString::from("s".to_string()),
    }
}

#[test]
fn test_profile_overrides_reach_reconciler_config() {
    let profile = Profile {
        management_endpoint: Some("https://management.usgovcloudapi.net".into()),
        authority: Some("https://login.microsoftonline.us".into()),
        timeout: Some(90),
        poll_interval: Some(7),
        ..Profile::default()
    };

    let cfg = profile_to_reconciler_config(&profile, &Defaults::default(), creds()).unwrap();

    assert_eq!(cfg.management_endpoint.as_str(), "https://management.usgovcloudapi.net/");
    assert_eq!(cfg.authority.as_str(), "https://login.microsoftonline.us/");
    assert_eq!(cfg.timeout, Duration::from_secs(90));
    assert_eq!(cfg.poll_interval, Duration::from_secs(7));
}

#[test]
fn test_invalid_endpoint_is_validation_error() {
    let profile = Profile {
        management_endpoint: Some("not a url".into()),
        ..Profile::default()
    };

    let err = profile_to_reconciler_config(&profile, &Defaults::default(), creds()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "management_endpoint"));
}
