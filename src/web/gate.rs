use std::{collections::HashSet, sync::Arc};

use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use tokio::sync::watch;
use tracing::error;
use uuid::Uuid;

use crate::{
    identity::{Identity, normalize_email},
    web::{AppState, auth::SESSION_COOKIE},
};

/// What is known about the caller's session at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No answer from the identity provider yet.
    Loading,
    SignedOut,
    SignedIn(Identity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pending,
    Admit(Identity),
    Deny,
}

/// Which verified identities count as administrators.
#[derive(Clone, Debug, Default)]
pub struct AdminPolicy {
    allow_list: Arc<HashSet<String>>,
}

impl AdminPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allow_list = emails
            .into_iter()
            .map(|email| normalize_email(email.as_ref()))
            .filter(|email| !email.is_empty())
            .collect();
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    /// Verified identities are admitted when listed or when they carry the admin role flag.
    pub fn allows(&self, identity: &Identity) -> bool {
        identity.verified
            && (identity.admin_claim || self.allow_list.contains(&normalize_email(&identity.email)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthGate {
    policy: AdminPolicy,
}

impl AuthGate {
    pub fn new(policy: AdminPolicy) -> Self {
        Self { policy }
    }

    pub fn decide(&self, state: &SessionState) -> GateDecision {
        match state {
            SessionState::Loading => GateDecision::Pending,
            SessionState::SignedIn(identity) if self.policy.allows(identity) => {
                GateDecision::Admit(identity.clone())
            }
            SessionState::SignedIn(_) | SessionState::SignedOut => GateDecision::Deny,
        }
    }

    /// Waits for the first settled notification on a session stream and decides on it.
    /// A stream that closes before settling denies.
    pub async fn observe(&self, sessions: &mut watch::Receiver<SessionState>) -> GateDecision {
        loop {
            let decision = {
                let current = sessions.borrow_and_update();
                self.decide(&current)
            };
            if decision != GateDecision::Pending {
                return decision;
            }
            if sessions.changed().await.is_err() {
                return GateDecision::Deny;
            }
        }
    }
}

/// Reads the session cookie and asks the identity provider who it belongs to.
pub async fn resolve_session(state: &AppState, jar: &CookieJar) -> SessionState {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return SessionState::SignedOut;
    };
    let Ok(token) = Uuid::parse_str(cookie.value()) else {
        return SessionState::SignedOut;
    };

    match state.identity().resolve(token).await {
        Ok(Some(identity)) => SessionState::SignedIn(identity),
        Ok(None) => SessionState::SignedOut,
        Err(err) => {
            error!(?err, "failed to resolve session for access gate");
            SessionState::SignedOut
        }
    }
}

/// Admits administrators; everyone else is sent away.
///
/// The session starts out `Loading` and the gate holds its decision until the lookup
/// publishes a settled state.
pub async fn require_admin(state: &AppState, jar: &CookieJar) -> Result<Identity, Redirect> {
    let (publisher, mut sessions) = watch::channel(SessionState::Loading);
    let lookup = async move {
        // The receiver outlives this future, so the send cannot fail.
        let _ = publisher.send(resolve_session(state, jar).await);
    };

    let (decision, ()) = tokio::join!(state.gate().observe(&mut sessions), lookup);
    match decision {
        GateDecision::Admit(identity) => Ok(identity),
        _ if *sessions.borrow() == SessionState::SignedOut => Err(Redirect::to("/admin/login")),
        _ => Err(Redirect::to("/?error=not_authorized")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn identity(email: &str, verified: bool, admin_claim: bool) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            verified,
            admin_claim,
        }
    }

    fn gate() -> AuthGate {
        AuthGate::new(AdminPolicy::new(["Editor@Example.com"]))
    }

    #[test]
    fn listed_verified_identity_is_admitted() {
        let editor = identity("editor@example.com", true, false);
        assert_eq!(
            gate().decide(&SessionState::SignedIn(editor.clone())),
            GateDecision::Admit(editor)
        );
    }

    #[test]
    fn absent_unlisted_or_unverified_identities_are_denied() {
        let gate = gate();
        assert_eq!(gate.decide(&SessionState::SignedOut), GateDecision::Deny);
        assert_eq!(
            gate.decide(&SessionState::SignedIn(identity("reader@example.com", true, false))),
            GateDecision::Deny
        );
        assert_eq!(
            gate.decide(&SessionState::SignedIn(identity("editor@example.com", false, false))),
            GateDecision::Deny
        );
        assert_eq!(gate.decide(&SessionState::Loading), GateDecision::Pending);
    }

    #[test]
    fn role_claim_admits_without_listing() {
        let staff = identity("staff@example.com", true, true);
        assert_eq!(
            gate().decide(&SessionState::SignedIn(staff.clone())),
            GateDecision::Admit(staff)
        );
    }

    #[tokio::test]
    async fn observe_waits_for_first_settled_notification() {
        let gate = gate();
        let (tx, mut rx) = watch::channel(SessionState::Loading);
        let editor = identity("editor@example.com", true, false);

        let expected = editor.clone();
        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(SessionState::SignedIn(editor)).unwrap();
            tx
        });

        assert_eq!(gate.observe(&mut rx).await, GateDecision::Admit(expected));
        drop(publisher.await.unwrap());
    }

    #[tokio::test]
    async fn observe_denies_when_stream_closes_while_loading() {
        let (tx, mut rx) = watch::channel(SessionState::Loading);
        drop(tx);
        assert_eq!(gate().observe(&mut rx).await, GateDecision::Deny);
    }

    #[tokio::test]
    async fn observe_decides_on_current_value_immediately() {
        let (_tx, mut rx) = watch::channel(SessionState::SignedOut);
        assert_eq!(gate().observe(&mut rx).await, GateDecision::Deny);
    }
}
