use crate::config;

/// Runs before the subscriber exists, so problems go straight to stderr.
pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("mediasync: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // The file is optional; a broken one should not block a sync.
            eprintln!("mediasync: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
