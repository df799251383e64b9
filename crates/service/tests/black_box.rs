use chrono::{Duration, TimeZone, Utc};
use issuetrack_auth::{JwtClaims, Role};
use issuetrack_core::{Clock, FixedClock, IssueId, UserId};
use issuetrack_events::{Event, IssueNotification};
use issuetrack_issues::{AttachmentStore, Severity, Status};
use issuetrack_service::{AdminSeed, IssueTracker, ServiceError, Settings, Stores, seed_admin};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;

const SECRET: &str = "black-box-secret";

struct Harness {
    tracker: IssueTracker<FixedClock>,
    stores: Stores,
    clock: FixedClock,
    admin_token: String,
}

impl Harness {
    fn new() -> Self {
        let settings = Settings {
            hash_memory_kib: 64,
            admin: Some(AdminSeed {
                email: "admin@example.com".to_string(),
                password: "admin-pw".to_string(),
            }),
            ..Settings::new(SECRET)
        };
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        let stores = Stores::in_memory();
        let tracker = IssueTracker::new(&settings, stores.clone(), clock.clone()).unwrap();
        seed_admin(&tracker, &settings).unwrap();

        let admin_token = tracker.login("admin@example.com", "admin-pw").unwrap().access_token;
        Self {
            tracker,
            stores,
            clock,
            admin_token,
        }
    }

    /// Register `email` and return (id, token), promoting when `role` is not REPORTER.
    fn user(&self, email: &str, role: Role) -> (UserId, String) {
        let created = self.tracker.register(email, "pw").unwrap();
        if role != Role::Reporter {
            self.tracker
                .change_role(&self.admin_token, created.id, role.as_str())
                .unwrap();
        }
        let token = self.tracker.login(email, "pw").unwrap().access_token;
        (created.id, token)
    }
}

fn mint(claims: &serde_json::Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[test]
fn register_login_and_current_identity() {
    let h = Harness::new();
    let summary = h.tracker.register("Reporter@Example.com", "pw").unwrap();
    assert_eq!(summary.role, Role::Reporter);
    assert_eq!(summary.email, "reporter@example.com");

    let session = h.tracker.login("reporter@example.com", "pw").unwrap();
    assert_eq!(session.token_type, "bearer");
    assert_eq!(session.expires_at, h.clock.now() + Duration::minutes(60));

    let me = h.tracker.current_identity(&session.access_token).unwrap();
    assert_eq!(me, summary);
    assert_eq!(
        serde_json::to_value(&me).unwrap(),
        json!({"id": summary.id, "email": "reporter@example.com", "role": "REPORTER"})
    );
}

#[test]
fn duplicate_registration_and_login_failures() {
    let h = Harness::new();
    h.tracker.register("a@example.com", "pw").unwrap();

    let dup = h.tracker.register("a@example.com", "pw").unwrap_err();
    assert_eq!(dup, ServiceError::DuplicateIdentity);
    assert_eq!(dup.status(), 400);

    let wrong = h.tracker.login("a@example.com", "nope").unwrap_err();
    let unknown = h.tracker.login("nobody@example.com", "pw").unwrap_err();
    assert_eq!(wrong.body(), unknown.body());
    assert_eq!(wrong.code(), "invalid_credentials");
}

#[test]
fn expired_and_forged_tokens_are_unauthenticated() {
    let h = Harness::new();
    let (id, _) = h.user("r@example.com", Role::Reporter);
    let now = h.clock.now();

    let expired = JwtClaims::new(id, Role::Reporter, now - Duration::hours(2), now - Duration::hours(1));
    let expired = mint(&serde_json::to_value(&expired).unwrap(), SECRET);
    let forged = mint(
        &serde_json::to_value(JwtClaims::new(id, Role::Admin, now, now + Duration::hours(1))).unwrap(),
        "some-other-secret",
    );
    let no_subject = mint(
        &json!({"role": "ADMIN", "issued_at": now, "expires_at": now + Duration::hours(1)}),
        SECRET,
    );

    for token in [expired, forged, no_subject, "not-a-jwt".to_string()] {
        let err = h.tracker.list_issues(&token).unwrap_err();
        assert_eq!(err, ServiceError::Unauthenticated);
        assert_eq!(err.status(), 401);
        assert_eq!(err.to_string(), "could not validate credentials");
    }
}

#[test]
fn tokens_expire_with_the_clock() {
    let h = Harness::new();
    let (_, token) = h.user("r@example.com", Role::Reporter);
    assert!(h.tracker.list_issues(&token).is_ok());

    h.clock.advance(Duration::minutes(61));
    assert_eq!(h.tracker.list_issues(&token), Err(ServiceError::Unauthenticated));
}

#[test]
fn reporter_creates_and_maintainer_triages() {
    let h = Harness::new();
    let (reporter_id, reporter) = h.user("r@example.com", Role::Reporter);
    let (_, maintainer) = h.user("m@example.com", Role::Maintainer);
    let listener = h.tracker.subscribe();

    let issue = h
        .tracker
        .create_issue(&reporter, "New Issue", "d", Severity::High)
        .unwrap();
    assert_eq!(issue.status, Status::Open);
    assert_eq!(issue.reporter_id, reporter_id);

    let updated = h
        .tracker
        .update_issue_status(&maintainer, issue.id, Status::Done, Severity::Medium)
        .unwrap();
    let json = serde_json::to_value(&updated).unwrap();
    assert_eq!(json["status"], "DONE");
    assert_eq!(json["severity"], "MEDIUM");

    let denied = h
        .tracker
        .update_issue_status(&reporter, issue.id, Status::Open, Severity::Low)
        .unwrap_err();
    assert_eq!(denied.status(), 403);

    let events = listener.drain();
    let types: Vec<_> = events.iter().map(|e| e.event_type().to_string()).collect();
    assert_eq!(types, vec!["issue_created", "issue_updated"]);
    assert_eq!(events[0].payload().event_type(), "issue_created");
    assert_eq!(events[0].occurred_at(), h.clock.now());
    assert_eq!(
        serde_json::to_value(events[0].payload()).unwrap()["type"],
        "issue_created"
    );
}

#[test]
fn reporters_are_confined_to_their_own_issues() {
    let h = Harness::new();
    let (_, alice) = h.user("alice@example.com", Role::Reporter);
    let (_, bob) = h.user("bob@example.com", Role::Reporter);
    let (_, maintainer) = h.user("m@example.com", Role::Maintainer);

    let theirs = h.tracker.create_issue(&bob, "bob's", "d", Severity::Low).unwrap();
    h.tracker.create_issue(&alice, "alice's", "d", Severity::Low).unwrap();

    let listed = h.tracker.list_issues(&alice).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "alice's");

    assert_eq!(h.tracker.get_issue(&alice, theirs.id).unwrap_err().status(), 403);
    assert_eq!(h.tracker.get_issue(&alice, IssueId::new(999)).unwrap_err().status(), 404);
    assert_eq!(h.tracker.list_issues(&maintainer).unwrap().len(), 2);

    assert_eq!(
        h.tracker
            .update_issue_details(&alice, theirs.id, "mine now", "d", Severity::High)
            .unwrap_err()
            .code(),
        "forbidden"
    );
    assert_eq!(h.tracker.delete_issue(&alice, theirs.id).unwrap_err().status(), 403);
    assert_eq!(
        h.tracker
            .create_issue(&maintainer, "t", "d", Severity::Low)
            .unwrap_err()
            .status(),
        403
    );
}

#[test]
fn admin_delete_cascades_the_attachment() {
    let h = Harness::new();
    let (_, reporter) = h.user("r@example.com", Role::Reporter);
    let issue = h.tracker.create_issue(&reporter, "t", "d", Severity::Low).unwrap();
    let with_file = h
        .tracker
        .attach_file(&reporter, issue.id, "crash.png", r"uploads\crash.png")
        .unwrap();
    assert_eq!(
        serde_json::to_value(&with_file).unwrap()["attachment"]["url"],
        "/uploads/crash.png"
    );

    let listener = h.tracker.subscribe();
    h.tracker.delete_issue(&h.admin_token, issue.id).unwrap();

    assert_eq!(
        h.tracker.get_issue(&h.admin_token, issue.id),
        Err(ServiceError::NotFound("issue not found".to_string()))
    );
    assert_eq!(h.stores.attachments.latest_for_issue(issue.id).unwrap(), None);
    let events = listener.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(
        serde_json::to_value(events[0].payload()).unwrap(),
        json!({"type": "issue_deleted", "issue_id": issue.id})
    );
    assert_eq!(
        events[0].payload(),
        &IssueNotification::IssueDeleted { issue_id: issue.id }
    );
}

#[test]
fn dashboard_counts_open_issues_by_severity() {
    let h = Harness::new();
    let (_, reporter) = h.user("r@example.com", Role::Reporter);
    let (_, other) = h.user("o@example.com", Role::Reporter);

    h.tracker.create_issue(&reporter, "a", "d", Severity::Low).unwrap();
    h.tracker.create_issue(&reporter, "b", "d", Severity::High).unwrap();
    let done = h.tracker.create_issue(&reporter, "c", "d", Severity::Low).unwrap();
    h.tracker.create_issue(&other, "d", "d", Severity::Medium).unwrap();
    h.tracker
        .update_issue_status(&h.admin_token, done.id, Status::Done, Severity::Low)
        .unwrap();

    let all = h.tracker.severity_counts(&h.admin_token).unwrap();
    assert_eq!(
        serde_json::to_value(&all).unwrap(),
        json!({"LOW": 1, "MEDIUM": 1, "HIGH": 1})
    );

    let own = h.tracker.severity_counts(&reporter).unwrap();
    assert_eq!(serde_json::to_value(&own).unwrap(), json!({"LOW": 1, "HIGH": 1}));
}

#[test]
fn role_changes_are_admin_gated() {
    let h = Harness::new();
    let (target, reporter) = h.user("r@example.com", Role::Reporter);
    let admin_id = h.tracker.current_identity(&h.admin_token).unwrap().id;

    assert_eq!(
        h.tracker.change_role(&reporter, target, "ADMIN").unwrap_err().status(),
        403
    );
    assert_eq!(
        h.tracker.change_role(&h.admin_token, target, "INVALIDROLE").unwrap_err().status(),
        422
    );
    assert_eq!(
        h.tracker
            .change_role(&h.admin_token, UserId::new(9999), "MAINTAINER")
            .unwrap_err()
            .status(),
        404
    );
    assert_eq!(
        h.tracker.change_role(&h.admin_token, admin_id, "REPORTER").unwrap_err().status(),
        403
    );

    let bogus = h.tracker.change_role(&reporter, target, "SUPERUSER").unwrap_err();
    assert_eq!((bogus.code(), bogus.status()), ("forbidden", 403));

    let changed = h.tracker.change_role(&h.admin_token, target, "maintainer").unwrap();
    assert_eq!(changed.role, Role::Maintainer);
}

#[test]
fn demotion_applies_to_existing_tokens() {
    let h = Harness::new();
    let (id, maintainer) = h.user("m@example.com", Role::Maintainer);
    let (_, reporter) = h.user("r@example.com", Role::Reporter);
    let issue = h.tracker.create_issue(&reporter, "t", "d", Severity::Low).unwrap();

    assert!(
        h.tracker
            .update_issue_status(&maintainer, issue.id, Status::Triaged, Severity::Low)
            .is_ok()
    );
    h.tracker.change_role(&h.admin_token, id, "REPORTER").unwrap();
    assert_eq!(
        h.tracker
            .update_issue_status(&maintainer, issue.id, Status::Done, Severity::Low)
            .unwrap_err()
            .status(),
        403
    );
}

#[test]
fn federated_login_creates_a_password_less_reporter() {
    let h = Harness::new();
    let session = h.tracker.federated_login("g@example.com", "G User").unwrap();
    let me = h.tracker.current_identity(&session.access_token).unwrap();
    assert_eq!(me.role, Role::Reporter);

    assert_eq!(h.tracker.login("g@example.com", ""), Err(ServiceError::InvalidCredentials));
    let again = h.tracker.federated_login("g@example.com", "G User").unwrap();
    assert_eq!(h.tracker.current_identity(&again.access_token).unwrap().id, me.id);
}

#[test]
fn bootstrap_admin_is_idempotent() {
    let h = Harness::new();
    let settings = Settings {
        hash_memory_kib: 64,
        admin: Some(AdminSeed {
            email: "admin@example.com".to_string(),
            password: "ignored".to_string(),
        }),
        ..Settings::new(SECRET)
    };
    seed_admin(&h.tracker, &settings).unwrap();

    assert!(h.tracker.login("admin@example.com", "admin-pw").is_ok());
    assert_eq!(
        h.tracker.current_identity(&h.admin_token).unwrap().role,
        Role::Admin
    );
}

#[test]
fn dropped_subscribers_never_block_mutations() {
    let h = Harness::new();
    let (_, reporter) = h.user("r@example.com", Role::Reporter);

    let listener = h.tracker.subscribe();
    drop(h.tracker.subscribe());
    for i in 0..50 {
        h.tracker
            .create_issue(&reporter, &format!("issue {i}"), "d", Severity::Low)
            .unwrap();
    }
    assert_eq!(h.tracker.subscriber_count(), 1);
    assert_eq!(listener.drain().len(), 50);
}
