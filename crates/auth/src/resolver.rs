//! Identity resolution: passwords and federated claims in, session tokens out;
//! session tokens in, identities out.

use chrono::Duration;

use issuetrack_core::{Clock, StoreError, SystemClock, UserId};

use crate::{
    AuthError, AuthzError, CredentialHasher, Identity, IdentitySummary, JwtClaims, NewIdentity,
    Principal, Role, SessionToken, TokenCodec, UserStore, require,
};

/// Which role an authenticated request acts with.
///
/// Tokens embed the role held at issuance. Once an admin changes a user's
/// role, the two can disagree until the token expires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RoleFreshness {
    /// Re-read the stored role on every request; demotions apply immediately.
    #[default]
    Live,
    /// Trust the role embedded in the token until it expires.
    TokenSnapshot,
}

impl core::str::FromStr for RoleFreshness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(RoleFreshness::Live),
            "token" | "snapshot" | "token_snapshot" => Ok(RoleFreshness::TokenSnapshot),
            other => Err(format!("unknown role freshness '{other}' (expected live or token)")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub token_ttl: Duration,
    pub role_freshness: RoleFreshness,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::minutes(60),
            role_freshness: RoleFreshness::default(),
        }
    }
}

pub struct IdentityResolver<U, H, T, C = SystemClock> {
    users: U,
    hasher: H,
    tokens: T,
    clock: C,
    config: ResolverConfig,
    // Verified against when the email is unknown, so both failure paths cost
    // one hash verification. Computed up front so the first miss costs the same.
    dummy_hash: Option<String>,
}

impl<U, H, T, C> IdentityResolver<U, H, T, C>
where
    U: UserStore,
    H: CredentialHasher,
    T: TokenCodec,
    C: Clock,
{
    pub fn new(users: U, hasher: H, tokens: T, clock: C, config: ResolverConfig) -> Self {
        let dummy_hash = hasher
            .hash("not-a-real-password")
            .inspect_err(|e| tracing::warn!("could not prepare dummy credential: {e}"))
            .ok();
        Self {
            users,
            hasher,
            tokens,
            clock,
            config,
            dummy_hash,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    /// Decode `token` and load the identity it names.
    ///
    /// Every failure (bad signature, expiry, missing subject or role, unknown
    /// subject) collapses to [`AuthError::Unauthenticated`].
    pub fn resolve_from_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.resolve(token).map(|(identity, _)| identity)
    }

    /// Resolve `token` to the principal an operation should act as, honouring
    /// the configured [`RoleFreshness`].
    pub fn principal_from_token(&self, token: &str) -> Result<Principal, AuthError> {
        let (identity, claims) = self.resolve(token)?;
        let role = match self.config.role_freshness {
            RoleFreshness::Live => identity.role,
            RoleFreshness::TokenSnapshot => claims.role.unwrap_or(identity.role),
        };
        if role != identity.role {
            tracing::debug!(
                user_id = %identity.id,
                token_role = %role,
                stored_role = %identity.role,
                "acting with token role snapshot"
            );
        }
        Ok(Principal::new(identity.id, role))
    }

    fn resolve(&self, token: &str) -> Result<(Identity, JwtClaims), AuthError> {
        let claims = self.tokens.decode(token, self.clock.now()).map_err(|e| {
            tracing::debug!("rejecting session token: {e}");
            AuthError::Unauthenticated
        })?;

        let (Some(subject), Some(_)) = (claims.sub, claims.role) else {
            tracing::debug!("rejecting session token without subject or role");
            return Err(AuthError::Unauthenticated);
        };

        match self.users.by_id(subject)? {
            Some(identity) => Ok((identity, claims)),
            None => {
                tracing::debug!(user_id = %subject, "rejecting session token for unknown subject");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Create a password-backed REPORTER identity.
    pub fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".to_string()));
        }
        if self.users.by_email(&email)?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let credential = self.hasher.hash(password)?;
        let identity = self
            .users
            .create(NewIdentity {
                email,
                role: Role::Reporter,
                credential: Some(credential),
            })
            .map_err(duplicate_on_conflict)?;

        tracing::info!(user_id = %identity.id, "registered identity");
        Ok(identity)
    }

    /// Password login.
    ///
    /// Unknown email, federated-only account and wrong password are all
    /// [`AuthError::InvalidCredentials`], and all three pay for one verify.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let identity = match normalize_email(email) {
            Ok(email) => self.users.by_email(&email)?,
            Err(_) => None,
        };

        let stored = identity.as_ref().and_then(|i| i.credential.as_deref());
        let verified = match stored {
            Some(hash) => self.hasher.verify(password, hash),
            None => {
                self.burn_verify(password);
                false
            }
        };

        match identity {
            Some(identity) if verified => self.issue_session(&identity),
            _ => {
                tracing::warn!("login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    fn burn_verify(&self, password: &str) {
        if let Some(hash) = &self.dummy_hash {
            let _ = self.hasher.verify(password, hash);
        }
    }

    /// Look up the identity for an externally verified email, creating a
    /// credential-less REPORTER on first sight.
    pub fn resolve_or_create_federated(&self, email: &str, display_name: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        if let Some(existing) = self.users.by_email(&email)? {
            return Ok(existing);
        }

        let created = self.users.create(NewIdentity {
            email: email.clone(),
            role: Role::Reporter,
            credential: None,
        });

        match created {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, display_name, "created federated identity");
                Ok(identity)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(StoreError::Conflict(_)) => self.users.by_email(&email)?.ok_or(AuthError::Unauthenticated),
            Err(e) => Err(e.into()),
        }
    }

    pub fn federated_login(&self, email: &str, display_name: &str) -> Result<SessionToken, AuthError> {
        let identity = self.resolve_or_create_federated(email, display_name)?;
        self.issue_session(&identity)
    }

    /// Sign a session token for `identity` with the configured lifetime.
    pub fn issue_session(&self, identity: &Identity) -> Result<SessionToken, AuthError> {
        let now = self.clock.now();
        let ttl = self.config.token_ttl;
        let access_token = self
            .tokens
            .issue(identity.id, identity.role, ttl, now)
            .map_err(AuthError::Token)?;

        tracing::debug!(user_id = %identity.id, role = %identity.role, "issued session token");
        Ok(SessionToken::bearer(access_token, now + ttl))
    }

    /// Admin-only: set `target`'s role. Admins cannot change their own role.
    pub fn change_role(&self, actor: &Principal, target: UserId, role: Role) -> Result<IdentitySummary, AuthError> {
        require(&[Role::Admin]).check(actor).inspect_err(|_| {
            tracing::warn!(actor = %actor.id, target = %target, "role change denied");
        })?;
        if actor.id == target {
            return Err(AuthzError::SelfRoleChange.into());
        }

        let updated = self.users.update_role(target, role)?.ok_or(AuthError::NotFound)?;
        tracing::info!(actor = %actor.id, target = %target, role = %role, "changed role");
        Ok(updated.summary())
    }

    /// Make sure an ADMIN with `email` exists, creating it if missing.
    ///
    /// An existing identity with that email is returned untouched, whatever
    /// its role.
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        if let Some(existing) = self.users.by_email(&email)? {
            if existing.role != Role::Admin {
                tracing::warn!(user_id = %existing.id, "bootstrap admin email belongs to a non-admin identity");
            }
            return Ok(existing);
        }
        if password.is_empty() {
            return Err(AuthError::Validation("admin password must not be empty".to_string()));
        }

        let credential = self.hasher.hash(password)?;
        let identity = self
            .users
            .create(NewIdentity {
                email,
                role: Role::Admin,
                credential: Some(credential),
            })
            .map_err(duplicate_on_conflict)?;

        tracing::info!(user_id = %identity.id, "created bootstrap admin");
        Ok(identity)
    }
}

fn duplicate_on_conflict(e: StoreError) -> AuthError {
    match e {
        StoreError::Conflict(_) => AuthError::DuplicateIdentity,
        other => AuthError::Store(other),
    }
}

/// Trim and lowercase; require a non-empty local part and domain around `@`.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(email),
        _ => Err(AuthError::Validation(format!("invalid email address '{email}'"))),
    }
}
