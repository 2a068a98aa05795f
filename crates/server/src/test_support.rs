use std::{
    path::Path,
    sync::{Mutex, MutexGuard, OnceLock},
};

pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Serializes env-dependent tests and pins the asset dir, database URL and
/// signing secret to test-local values. Assistant keys are cleared so the
/// adapter is reliably unconfigured regardless of the host environment.
pub struct TestEnvGuard {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
}

const MANAGED_VARS: &[&str] = &[
    "DATABASE_URL",
    "PLANBOARD_ASSET_DIR",
    "PLANBOARD_JWT_SECRET",
    "PLANBOARD_OPENAI_API_KEY",
    "OPENAI_API_KEY",
];

impl TestEnvGuard {
    pub fn new(temp_root: &Path, db_url: String) -> Self {
        let lock = test_lock().lock().unwrap_or_else(|err| err.into_inner());
        let saved = MANAGED_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();

        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            std::env::set_var("PLANBOARD_ASSET_DIR", temp_root);
            std::env::set_var("DATABASE_URL", db_url);
            std::env::set_var("PLANBOARD_JWT_SECRET", "test-secret");
            std::env::remove_var("PLANBOARD_OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_KEY");
        }

        Self { _lock: lock, saved }
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            for (name, value) in &self.saved {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }
}
