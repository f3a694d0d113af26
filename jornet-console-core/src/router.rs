//! Navigation targets and the router collaborator.
//!
//! The console decides *when* a navigation is required; performing it is up
//! to a [`Navigator`] supplied by the presentation layer.

use uuid::Uuid;

/// A view the console can ask to navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The unauthenticated acquisition form.
    Connect,

    /// The protected dashboard.
    ///
    /// `new_account` carries the locally generated identifier when the
    /// session was created for a brand new account, so the dashboard can show
    /// it once.
    Dashboard { new_account: Option<Uuid> },
}

impl Navigation {
    /// Route path of the target view.
    pub fn path(&self) -> &'static str {
        match self {
            Navigation::Connect => "/connect",
            Navigation::Dashboard { .. } => "/dashboard",
        }
    }
}

/// Router collaborator performing navigations.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: Navigation);
}

impl<F> Navigator for F
where
    F: Fn(Navigation) + Send + Sync,
{
    fn navigate(&self, target: Navigation) {
        self(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_paths() {
        assert_eq!(Navigation::Connect.path(), "/connect");
        assert_eq!(
            Navigation::Dashboard { new_account: None }.path(),
            "/dashboard"
        );
    }

    #[test]
    fn test_closure_navigator() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let navigator = move |target: Navigation| sink.lock().push(target);

        navigator.navigate(Navigation::Connect);
        assert_eq!(*seen.lock(), vec![Navigation::Connect]);
    }
}
