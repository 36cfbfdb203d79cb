// Configuration: settings file + credential storage.
//
// Settings live in ~/.config/gridpilot/settings.json. API keys never go
// in the settings file — they live in the system keychain (or an
// environment variable, or stay in memory for the session).

pub mod credential;
pub mod settings;

pub use credential::{
    delete_api_key, get_api_key, keychain_available, load_key_file, set_api_key, KeyLookup,
    KeySource,
};
pub use settings::{Settings, ThemePreference};
