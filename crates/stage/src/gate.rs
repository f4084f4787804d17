//! Session gate in front of the content view.
//!
//! This is not access control. The passphrase ships inside the binary and
//! the session flag can be set by anything that can call [`SessionStore::set`].
//! It only keeps a casual viewer on the login view.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const PASSPHRASE: &str = "Tse_1404";
pub const AUTH_KEY: &str = "authenticated";
pub const AUTH_VALUE: &str = "true";
pub const CHECK_DELAY: Duration = Duration::from_millis(300);
pub const SHAKE_DURATION: Duration = Duration::from_millis(500);

/// Trimmed, case-sensitive exact match.
pub fn verify(input: &str) -> bool {
    input.trim() == PASSPHRASE
}

/// Key/value store living as long as the session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySession {
    values: RwLock<HashMap<String, String>>,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("a passphrase check is already pending")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Flag set; show the content view.
    Granted(View),
    /// Error shown, input cleared and refocused, submit enabled again.
    Denied,
}

#[derive(Debug)]
struct PendingCheck {
    input: String,
    due: Duration,
}

pub struct Gate<S: SessionStore> {
    store: S,
    pending: Option<PendingCheck>,
    error_visible: bool,
    shake_until: Option<Duration>,
}

impl<S: SessionStore> Gate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pending: None,
            error_visible: false,
            shake_until: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get(AUTH_KEY).as_deref() == Some(AUTH_VALUE)
    }

    /// View to actually show when `requested` is asked for.
    pub fn guard(&self, requested: View) -> View {
        match (requested, self.is_authenticated()) {
            (View::Content, false) => View::Login,
            (View::Login, true) => View::Content,
            (view, _) => view,
        }
    }

    /// Starts a check of `input`; the verdict is available from
    /// [`Gate::poll`] after [`CHECK_DELAY`].
    pub fn submit(&mut self, input: &str, now: Duration) -> Result<(), GateError> {
        if self.pending.is_some() {
            return Err(GateError::Busy);
        }
        self.error_visible = false;
        self.pending = Some(PendingCheck {
            input: input.trim().to_string(),
            due: now + CHECK_DELAY,
        });
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn poll(&mut self, now: Duration) -> Option<GateOutcome> {
        if self.pending.as_ref().is_none_or(|p| now < p.due) {
            return None;
        }
        let check = self.pending.take()?;

        if verify(&check.input) {
            self.store.set(AUTH_KEY, AUTH_VALUE);
            log::info!("Session unlocked");
            Some(GateOutcome::Granted(View::Content))
        } else {
            self.error_visible = true;
            self.shake_until = Some(now + SHAKE_DURATION);
            log::debug!("Passphrase rejected");
            Some(GateOutcome::Denied)
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.pending.is_none()
    }

    pub fn error_visible(&self) -> bool {
        self.error_visible
    }

    pub fn is_shaking(&self, now: Duration) -> bool {
        self.shake_until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn verify_trims_but_is_case_sensitive() {
        assert!(verify(" Tse_1404 "));
        assert!(verify("Tse_1404\n"));
        assert!(!verify("tse_1404"));
        assert!(!verify("Tse 1404"));
        assert!(!verify(""));
    }

    #[test]
    fn granted_after_delay_sets_flag() {
        let mut gate = Gate::new(MemorySession::default());
        assert_eq!(gate.guard(View::Content), View::Login);

        gate.submit(" Tse_1404 ", ms(0)).unwrap();
        assert!(!gate.submit_enabled());
        assert_eq!(gate.poll(ms(299)), None);
        assert_eq!(gate.poll(ms(300)), Some(GateOutcome::Granted(View::Content)));
        assert!(gate.is_authenticated());
        assert_eq!(gate.store().get(AUTH_KEY).as_deref(), Some("true"));
        assert_eq!(gate.guard(View::Content), View::Content);
        assert_eq!(gate.guard(View::Login), View::Content);
    }

    #[test]
    fn denied_shows_error_and_reenables() {
        let mut gate = Gate::new(MemorySession::default());
        gate.submit("tse_1404", ms(0)).unwrap();
        assert_eq!(gate.submit("again", ms(10)), Err(GateError::Busy));
        assert_eq!(gate.poll(ms(300)), Some(GateOutcome::Denied));
        assert!(gate.error_visible());
        assert!(gate.submit_enabled());
        assert!(gate.is_shaking(ms(700)));
        assert!(!gate.is_shaking(ms(800)));
        assert!(!gate.is_authenticated());

        gate.submit("Tse_1404", ms(1000)).unwrap();
        assert!(!gate.error_visible());
    }

    #[test]
    fn forged_flag_passes_the_guard() {
        let gate = Gate::new(MemorySession::default());
        gate.store().set(AUTH_KEY, AUTH_VALUE);
        assert_eq!(gate.guard(View::Content), View::Content);
        gate.store().remove(AUTH_KEY);
        assert_eq!(gate.guard(View::Content), View::Login);
    }
}
