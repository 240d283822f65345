//! BDD step definitions for credential and preference storage

use std::sync::Arc;

use cucumber::{given, then, when};
use serde_json::Value;

use icarus::credentials::{validate_url, CredentialStore};
use icarus::integration::Integration;
use icarus::settings::{
    AppearanceMode, JsonFileSettings, MemorySettings, Preferences, RefreshInterval,
};

use crate::world::IcarusWorld;

fn integration(name: &str) -> Integration {
    name.parse()
        .unwrap_or_else(|e| panic!("bad integration '{}': {}", name, e))
}

fn reopen(world: &mut IcarusWorld) {
    let dir = world.settings_dir.as_ref().expect("no settings directory");
    let settings = JsonFileSettings::open(&dir.path().join("settings.json")).unwrap();
    world.settings = Some(Arc::new(settings));
}

// --- Given steps ---

#[given("an empty settings store")]
fn empty_settings_store(world: &mut IcarusWorld) {
    world.settings = Some(Arc::new(MemorySettings::new()));
}

#[given("a settings file in a fresh directory")]
fn settings_file(world: &mut IcarusWorld) {
    world.settings_dir = Some(tempfile::tempdir().unwrap());
    reopen(world);
}

#[given(expr = "the stored value of {string} is {string}")]
fn stored_raw_value(world: &mut IcarusWorld, key: String, raw: String) {
    let value: Value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
    world.settings().set(&key, value).unwrap();
}

// --- When steps ---

#[when(expr = "I save the {word} credential with URL {string} and key {string}")]
fn save_credential(world: &mut IcarusWorld, name: String, url: String, key: String) {
    CredentialStore::new(world.settings())
        .save(integration(&name), &url, &key)
        .unwrap();
}

#[when("the settings file is reopened")]
fn settings_reopened(world: &mut IcarusWorld) {
    reopen(world);
}

#[when(expr = "I validate the URL {string}")]
fn validate(world: &mut IcarusWorld, url: String) {
    world.url_valid = Some(validate_url(&url));
}

#[when(expr = "I set the refresh interval to {int} seconds")]
fn set_interval(world: &mut IcarusWorld, seconds: u64) {
    let settings = world.settings();
    match RefreshInterval::try_from(seconds) {
        Ok(interval) => {
            let preferences = Preferences {
                refresh_interval: interval,
                ..Preferences::load(settings.as_ref())
            };
            preferences.save(settings.as_ref()).unwrap();
            world.last_error = None;
        }
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "I set the appearance to {string}")]
fn set_appearance(world: &mut IcarusWorld, mode: String) {
    let settings = world.settings();
    match mode.parse::<AppearanceMode>() {
        Ok(mode) => {
            let preferences = Preferences {
                appearance_mode: mode,
                ..Preferences::load(settings.as_ref())
            };
            preferences.save(settings.as_ref()).unwrap();
            world.last_error = None;
        }
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

// --- Then steps ---

#[then(expr = "the {word} credential should have URL {string} and key {string}")]
fn credential_should_be(world: &mut IcarusWorld, name: String, url: String, key: String) {
    let credential = CredentialStore::new(world.settings()).load(integration(&name));
    assert_eq!(credential.endpoint_url, url);
    assert_eq!(credential.api_key, key);
}

#[then(expr = "the {word} credential should not be configured")]
fn credential_not_configured(world: &mut IcarusWorld, name: String) {
    let credential = CredentialStore::new(world.settings()).load(integration(&name));
    assert!(
        !credential.is_configured(),
        "expected {} to be unconfigured, got {:?}",
        name,
        credential
    );
    assert_eq!(credential.endpoint_url, "");
    assert_eq!(credential.api_key, "");
}

#[then("the URL should be accepted")]
fn url_accepted(world: &mut IcarusWorld) {
    assert_eq!(world.url_valid, Some(true));
}

#[then("the URL should be rejected")]
fn url_rejected(world: &mut IcarusWorld) {
    assert_eq!(world.url_valid, Some(false));
}

#[then(expr = "the refresh interval should be {int} seconds")]
fn refresh_interval_should_be(world: &mut IcarusWorld, seconds: u64) {
    let preferences = Preferences::load(world.settings().as_ref());
    assert_eq!(preferences.refresh_interval.seconds(), seconds);
}

#[then(expr = "the appearance should be {string}")]
fn appearance_should_be(world: &mut IcarusWorld, mode: String) {
    let preferences = Preferences::load(world.settings().as_ref());
    assert_eq!(preferences.appearance_mode.as_str(), mode);
}

#[then(expr = "the stored value of {string} should be {string}")]
fn stored_value_should_be(world: &mut IcarusWorld, key: String, raw: String) {
    let expected: Value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
    assert_eq!(world.settings().get(&key), Some(expected));
}

#[then(expr = "the change should be refused with {string}")]
fn change_refused(world: &mut IcarusWorld, fragment: String) {
    let error = world.last_error.as_deref().expect("expected an error");
    assert!(
        error.contains(&fragment),
        "expected error containing '{}', got '{}'",
        fragment,
        error
    );
}
