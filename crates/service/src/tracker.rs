//! The operation surface.
//!
//! Every issue operation takes the caller's session token, resolves it to a
//! principal and hands over to the lifecycle engine. Notifications go out on
//! an in-process bus; transports forward them to their own listeners via
//! [`IssueTracker::subscribe`].

use std::sync::Arc;

use issuetrack_auth::{
    Argon2Hasher, Hs256TokenCodec, Identity, IdentityResolver, IdentitySummary, Principal, Role,
    SessionToken, UserStore, require,
};
use issuetrack_core::{Clock, IssueId, SystemClock, UserId};
use issuetrack_events::{
    BusEventSink, EventBus, EventEnvelope, InMemoryEventBus, IssueNotification, Subscription,
};
use issuetrack_infra::{InMemoryAttachmentStore, InMemoryIssueStore, InMemoryUserStore};
use issuetrack_issues::{
    AttachmentStore, Issue, IssueLifecycleEngine, IssueStore, Severity, SeverityCounts, Status,
};

use crate::{ServiceError, Settings};

/// Fan-out for enveloped lifecycle notifications.
pub type NotificationBus = InMemoryEventBus<EventEnvelope<IssueNotification>>;

type Resolver<C> = IdentityResolver<Arc<dyn UserStore>, Argon2Hasher, Hs256TokenCodec, C>;
type Engine<C> = IssueLifecycleEngine<
    Arc<dyn IssueStore>,
    Arc<dyn AttachmentStore>,
    BusEventSink<Arc<NotificationBus>, C>,
    C,
>;

/// Storage collaborators.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub issues: Arc<dyn IssueStore>,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            issues: Arc::new(InMemoryIssueStore::new()),
            attachments: Arc::new(InMemoryAttachmentStore::new()),
        }
    }
}

pub struct IssueTracker<C = SystemClock> {
    identities: Resolver<C>,
    engine: Engine<C>,
    bus: Arc<NotificationBus>,
}

impl IssueTracker<SystemClock> {
    pub fn in_memory(settings: &Settings) -> Result<Self, ServiceError> {
        Self::new(settings, Stores::in_memory(), SystemClock)
    }
}

impl<C> IssueTracker<C>
where
    C: Clock + Clone,
{
    pub fn new(settings: &Settings, stores: Stores, clock: C) -> Result<Self, ServiceError> {
        let hasher = Argon2Hasher::with_memory_kib(settings.hash_memory_kib)?;
        let bus = Arc::new(NotificationBus::new());

        let identities = IdentityResolver::new(
            stores.users,
            hasher,
            Hs256TokenCodec::new(settings.secret_key.as_bytes()),
            clock.clone(),
            settings.resolver_config(),
        );
        let engine = IssueLifecycleEngine::new(
            stores.issues,
            stores.attachments,
            BusEventSink::with_clock(bus.clone(), clock.clone()),
            clock,
        );

        Ok(Self {
            identities,
            engine,
            bus,
        })
    }

    // ── Identity ────────────────────────────────────────────────────────────

    pub fn register(&self, email: &str, password: &str) -> Result<IdentitySummary, ServiceError> {
        Ok(self.identities.register(email, password)?.summary())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<SessionToken, ServiceError> {
        Ok(self.identities.authenticate(email, password)?)
    }

    /// Login with an email the external provider has already verified.
    pub fn federated_login(&self, email: &str, display_name: &str) -> Result<SessionToken, ServiceError> {
        Ok(self.identities.federated_login(email, display_name)?)
    }

    pub fn current_identity(&self, token: &str) -> Result<IdentitySummary, ServiceError> {
        Ok(self.identities.resolve_from_token(token)?.summary())
    }

    /// Admin-only. `role` is parsed case-insensitively, after the admin gate.
    pub fn change_role(&self, token: &str, target: UserId, role: &str) -> Result<IdentitySummary, ServiceError> {
        let actor = self.principal(token)?;
        require(&[Role::Admin]).check(&actor).map_err(ServiceError::Forbidden)?;
        let role: Role = role.parse()?;
        Ok(self.identities.change_role(&actor, target, role)?)
    }

    /// Create the bootstrap admin unless an identity with that email exists.
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<Identity, ServiceError> {
        Ok(self.identities.ensure_admin(email, password)?)
    }

    // ── Issues ──────────────────────────────────────────────────────────────

    pub fn create_issue(
        &self,
        token: &str,
        title: &str,
        description: &str,
        severity: Severity,
    ) -> Result<Issue, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.create(&actor, title, description, severity)?)
    }

    pub fn list_issues(&self, token: &str) -> Result<Vec<Issue>, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.list(&actor)?)
    }

    pub fn get_issue(&self, token: &str, id: IssueId) -> Result<Issue, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.get(&actor, id)?)
    }

    pub fn update_issue_status(
        &self,
        token: &str,
        id: IssueId,
        status: Status,
        severity: Severity,
    ) -> Result<Issue, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.update_status(&actor, id, status, severity)?)
    }

    pub fn update_issue_details(
        &self,
        token: &str,
        id: IssueId,
        title: &str,
        description: &str,
        severity: Severity,
    ) -> Result<Issue, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.update_details(&actor, id, title, description, severity)?)
    }

    pub fn delete_issue(&self, token: &str, id: IssueId) -> Result<(), ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.delete(&actor, id)?)
    }

    /// Record a file the storage collaborator has already saved.
    pub fn attach_file(
        &self,
        token: &str,
        id: IssueId,
        filename: &str,
        storage_path: &str,
    ) -> Result<Issue, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.attach(&actor, id, filename, storage_path)?)
    }

    /// Dashboard: open issues per severity.
    pub fn severity_counts(&self, token: &str) -> Result<SeverityCounts, ServiceError> {
        let actor = self.principal(token)?;
        Ok(self.engine.aggregate_counts(&actor, Status::Open)?)
    }

    // ── Notifications ───────────────────────────────────────────────────────

    /// Listen for lifecycle notifications. Drop the subscription to stop.
    pub fn subscribe(&self) -> Subscription<EventEnvelope<IssueNotification>> {
        self.bus.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    fn principal(&self, token: &str) -> Result<Principal, ServiceError> {
        Ok(self.identities.principal_from_token(token)?)
    }
}
