use crate::dto::listing_dto::ListingResponse;
use crate::dto::swipe_dto::{GestureOutcome, PendingActionView, SwipeStateResponse};
use crate::error::{Error, Result};
use crate::models::action::ActionKind;
use crate::models::listing::Listing;
use crate::models::notification::Severity;
use crate::services::action_log::ActionLogService;
use crate::services::applications::ApplicationsService;
use crate::services::filter::{visible_queue, ListingFilters};
use crate::services::listings::ListingsService;
use crate::services::notifications::NotificationsService;
use crate::services::points::{PointsService, APPLY_REWARD_POINTS};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// How long a settled gesture can still be taken back.
pub const UNDO_WINDOW: Duration = Duration::from_millis(4000);

/// Minimum drag distance for a release to count as a swipe.
pub const SWIPE_THRESHOLD_PX: f64 = 100.0;

/// Classifies a release by the dominant axis, then by sign against the
/// threshold. Screen coordinates: positive `dy` points down. A release
/// inside the threshold is no gesture at all and the card snaps back.
pub fn classify_release(dx: f64, dy: f64) -> Option<ActionKind> {
    if dx.abs() >= dy.abs() {
        if dx > SWIPE_THRESHOLD_PX {
            Some(ActionKind::Applied)
        } else if dx < -SWIPE_THRESHOLD_PX {
            Some(ActionKind::Ignored)
        } else {
            None
        }
    } else if dy < -SWIPE_THRESHOLD_PX {
        Some(ActionKind::Saved)
    } else if dy > SWIPE_THRESHOLD_PX {
        Some(ActionKind::Blocked)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct PendingSwipe {
    pub listing_id: Uuid,
    pub action: ActionKind,
    pub created_at: DateTime<Utc>,
    pub deadline: Instant,
}

// Settling structurally holds the one in-flight action; there is no way to
// represent two.
#[derive(Debug, Clone)]
enum SessionPhase {
    Idle,
    Settling(PendingSwipe),
}

#[derive(Debug, Clone)]
struct SwipeSession {
    queue: Vec<Listing>,
    index: usize,
    phase: SessionPhase,
    fullscreen: bool,
}

// A settled action lifted out of its session so its effects can run after
// the session guard is released. `index_at_take` pins where the card sat so
// a failed append can put it back.
struct PendingCommit {
    user_id: Uuid,
    pending: PendingSwipe,
    listing: Option<Listing>,
    index_at_take: usize,
}

/// Walks a per-user queue of listings one card at a time. A gesture (or
/// button) parks the action in `Settling` for the undo window and advances
/// the card; the action only reaches the log, the ledger and the submission
/// path once the window runs out uncontested.
#[derive(Clone)]
pub struct SwipeService {
    listings: ListingsService,
    action_log: ActionLogService,
    points: PointsService,
    applications: ApplicationsService,
    notifications: NotificationsService,
    sessions: Arc<Mutex<HashMap<Uuid, SwipeSession>>>,
}

impl SwipeService {
    pub fn new(
        listings: ListingsService,
        action_log: ActionLogService,
        points: PointsService,
        applications: ApplicationsService,
        notifications: NotificationsService,
    ) -> Self {
        Self {
            listings,
            action_log,
            points,
            applications,
            notifications,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Builds a fresh queue for the user. An in-flight action from a
    /// previous session is committed first, not dropped.
    pub async fn start_session(
        &self,
        user_id: Uuid,
        filters: ListingFilters,
    ) -> Result<SwipeStateResponse> {
        // The old session comes out of the map before its commit runs, so
        // the map is never locked while the commit does I/O. Requests that
        // land mid-rebuild see no session, which is what they would see a
        // moment later anyway.
        let commit = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .remove(&user_id)
                .and_then(|mut session| take_pending(user_id, &mut session))
        };
        if let Some(commit) = commit {
            self.run_commit(commit).await;
        }

        if let Some(granted) = self.points.ensure_welcome_grant(user_id).await? {
            self.notifications
                .notify(
                    user_id,
                    Severity::Success,
                    &format!("Welcome! You start with {} points", granted.amount),
                )
                .await;
        }

        let all = self.listings.browse(&ListingFilters::default()).await?;
        let excluded = self.action_log.excluded_ids(user_id).await?;
        let queue = visible_queue(&all, &excluded, &filters);

        let session = SwipeSession {
            queue,
            index: 0,
            phase: SessionPhase::Idle,
            fullscreen: false,
        };
        let state = snapshot(&session);
        self.sessions.lock().await.insert(user_id, session);
        Ok(state)
    }

    pub async fn current_state(&self, user_id: Uuid) -> Result<SwipeStateResponse> {
        let (state, commit) = {
            let mut sessions = self.sessions.lock().await;
            let session = get_session(&mut sessions, user_id)?;
            let commit = take_if_expired(user_id, session);
            (snapshot(session), commit)
        };
        if let Some(commit) = commit {
            self.run_commit(commit).await;
        }
        Ok(state)
    }

    /// A raw pointer release. Returns what the classifier made of it; an
    /// under-threshold release is accepted as "no gesture" without touching
    /// the machine.
    pub async fn gesture(&self, user_id: Uuid, dx: f64, dy: f64) -> Result<GestureOutcome> {
        match classify_release(dx, dy) {
            Some(action) => self.register(user_id, action).await,
            None => {
                let (state, commit) = {
                    let mut sessions = self.sessions.lock().await;
                    let session = get_session(&mut sessions, user_id)?;
                    let commit = take_if_expired(user_id, session);
                    (snapshot(session), commit)
                };
                if let Some(commit) = commit {
                    self.run_commit(commit).await;
                }
                Ok(GestureOutcome {
                    accepted: false,
                    notice: None,
                    state,
                })
            }
        }
    }

    /// A control button press; the threshold never applies.
    pub async fn act(&self, user_id: Uuid, action: ActionKind) -> Result<GestureOutcome> {
        self.register(user_id, action).await
    }

    async fn register(&self, user_id: Uuid, action: ActionKind) -> Result<GestureOutcome> {
        let commit = {
            let mut sessions = self.sessions.lock().await;
            let session = get_session(&mut sessions, user_id)?;
            take_if_expired(user_id, session)
        };
        if let Some(commit) = commit {
            self.run_commit(commit).await;
        }

        // Relocked; the session may have moved while the commit ran, so
        // every guard is checked against its current shape.
        let mut sessions = self.sessions.lock().await;
        let session = get_session(&mut sessions, user_id)?;
        if matches!(session.phase, SessionPhase::Settling(_)) {
            return Ok(reject(session, "previous action is still settling"));
        }
        let Some(listing) = session.queue.get(session.index).cloned() else {
            return Ok(reject(session, "no listings left to act on"));
        };

        if action == ActionKind::Applied {
            let balance = self.points.balance(user_id).await?;
            if balance < listing.minimum_points {
                let notice = format!(
                    "You need at least {} points to apply for {} (you have {})",
                    listing.minimum_points, listing.title, balance
                );
                self.notifications
                    .notify(user_id, Severity::Warning, &notice)
                    .await;
                return Ok(reject(session, &notice));
            }
        }

        session.phase = SessionPhase::Settling(PendingSwipe {
            listing_id: listing.id,
            action,
            created_at: Utc::now(),
            deadline: Instant::now() + UNDO_WINDOW,
        });
        session.index += 1;

        Ok(GestureOutcome {
            accepted: true,
            notice: None,
            state: snapshot(session),
        })
    }

    /// Takes back the in-flight action if the window is still open. Rolls
    /// the card back; nothing was persisted, so nothing is deleted.
    pub async fn undo(&self, user_id: Uuid) -> Result<GestureOutcome> {
        let (outcome, commit) = {
            let mut sessions = self.sessions.lock().await;
            let session = get_session(&mut sessions, user_id)?;
            match session.phase.clone() {
                SessionPhase::Settling(pending) if Instant::now() < pending.deadline => {
                    session.phase = SessionPhase::Idle;
                    session.index = session.index.saturating_sub(1);
                    let outcome = GestureOutcome {
                        accepted: true,
                        notice: Some("action undone".to_string()),
                        state: snapshot(session),
                    };
                    (outcome, None)
                }
                SessionPhase::Settling(_) => {
                    let commit = take_pending(user_id, session);
                    let outcome = reject(session, "too late to undo, the action went through");
                    (outcome, commit)
                }
                SessionPhase::Idle => (reject(session, "nothing to undo"), None),
            }
        };
        if let Some(commit) = commit {
            self.run_commit(commit).await;
        }
        Ok(outcome)
    }

    /// Presentation only: flips the flag and leaves the index and any
    /// pending action untouched.
    pub async fn toggle_fullscreen(&self, user_id: Uuid) -> Result<SwipeStateResponse> {
        let mut sessions = self.sessions.lock().await;
        let session = get_session(&mut sessions, user_id)?;
        session.fullscreen = !session.fullscreen;
        Ok(snapshot(session))
    }

    /// Settles every expired pending action across sessions in one pass
    /// over the map, then runs the commits with the map unlocked. Runs
    /// from the background sweeper; handlers also settle lazily on access.
    pub async fn sweep_expired(&self) {
        let commits: Vec<PendingCommit> = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .iter_mut()
                .filter_map(|(user_id, session)| take_if_expired(*user_id, session))
                .collect()
        };
        for commit in commits {
            self.run_commit(commit).await;
        }
    }

    // The one place deferred actions become durable. Callers have already
    // released the session guard: a slow submission here must not block
    // anyone else's requests. Store failures roll the card back and surface
    // as notifications; they never propagate out.
    async fn run_commit(&self, commit: PendingCommit) {
        let PendingCommit {
            user_id,
            pending,
            listing,
            index_at_take,
        } = commit;

        if let Err(err) = self
            .action_log
            .append(user_id, pending.listing_id, pending.action)
            .await
        {
            warn!(
                user_id = %user_id,
                listing_id = %pending.listing_id,
                error = %err,
                "failed to persist swipe action, rolling the card back"
            );
            self.roll_back_card(user_id, pending.listing_id, index_at_take)
                .await;
            self.notifications
                .notify(
                    user_id,
                    Severity::Error,
                    "Your last swipe could not be saved, the card is back in the deck",
                )
                .await;
            return;
        }

        if pending.action != ActionKind::Applied {
            if let Some(listing) = listing {
                match pending.action {
                    ActionKind::Saved => {
                        self.notifications
                            .notify(
                                user_id,
                                Severity::Success,
                                &format!("Saved {}", listing.title),
                            )
                            .await;
                    }
                    ActionKind::Blocked => {
                        self.notifications
                            .notify(
                                user_id,
                                Severity::Info,
                                "You won't see this listing again",
                            )
                            .await;
                    }
                    _ => {}
                }
            }
            return;
        }

        let listing = match listing {
            Some(listing) => listing,
            None => match self.listings.get(pending.listing_id).await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!(
                        listing_id = %pending.listing_id,
                        error = %err,
                        "applied listing vanished before commit"
                    );
                    return;
                }
            },
        };

        match self
            .points
            .credit(
                user_id,
                APPLY_REWARD_POINTS,
                &format!("Applied to {}", listing.title),
                "apply",
            )
            .await
        {
            Ok(_) => {
                self.notifications
                    .notify(
                        user_id,
                        Severity::Success,
                        &format!(
                            "Applied to {} (+{} points)",
                            listing.title, APPLY_REWARD_POINTS
                        ),
                    )
                    .await;
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "apply reward was not credited");
                self.notifications
                    .notify(
                        user_id,
                        Severity::Warning,
                        "Application recorded, but the points reward could not be credited",
                    )
                    .await;
            }
        }

        if let Err(err) = self.applications.submit(user_id, &listing).await {
            warn!(
                user_id = %user_id,
                listing_id = %listing.id,
                error = %err,
                "application submission failed after commit"
            );
            self.notifications
                .notify(
                    user_id,
                    Severity::Warning,
                    &format!(
                        "Your application to {} was recorded locally but not submitted",
                        listing.title
                    ),
                )
                .await;
        }
    }

    // Puts the card back only if the session is exactly where the take left
    // it. The user may have gestured on, undone, or rebuilt the queue while
    // the failed append ran; in those cases the index no longer refers to
    // this card.
    async fn roll_back_card(&self, user_id: Uuid, listing_id: Uuid, index_at_take: usize) {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&user_id) else {
            return;
        };
        let untouched = matches!(session.phase, SessionPhase::Idle)
            && session.index == index_at_take
            && index_at_take > 0
            && session
                .queue
                .get(index_at_take - 1)
                .map_or(false, |l| l.id == listing_id);
        if untouched {
            session.index -= 1;
        }
    }
}

fn get_session(
    sessions: &mut HashMap<Uuid, SwipeSession>,
    user_id: Uuid,
) -> Result<&mut SwipeSession> {
    sessions
        .get_mut(&user_id)
        .ok_or_else(|| Error::NotFound("no active swipe session".to_string()))
}

// Lifts the pending action out of the session and leaves it Idle. The queue
// lookup happens here, while the caller still holds the session.
fn take_pending(user_id: Uuid, session: &mut SwipeSession) -> Option<PendingCommit> {
    let SessionPhase::Settling(pending) = session.phase.clone() else {
        return None;
    };
    session.phase = SessionPhase::Idle;
    let listing = find_listing(session, pending.listing_id);
    Some(PendingCommit {
        user_id,
        pending,
        listing,
        index_at_take: session.index,
    })
}

fn take_if_expired(user_id: Uuid, session: &mut SwipeSession) -> Option<PendingCommit> {
    let expired = matches!(
        &session.phase,
        SessionPhase::Settling(pending) if Instant::now() >= pending.deadline
    );
    if expired {
        take_pending(user_id, session)
    } else {
        None
    }
}

fn find_listing(session: &SwipeSession, listing_id: Uuid) -> Option<Listing> {
    session.queue.iter().find(|l| l.id == listing_id).cloned()
}

fn reject(session: &SwipeSession, notice: &str) -> GestureOutcome {
    GestureOutcome {
        accepted: false,
        notice: Some(notice.to_string()),
        state: snapshot(session),
    }
}

fn snapshot(session: &SwipeSession) -> SwipeStateResponse {
    let phase = match &session.phase {
        SessionPhase::Settling(_) => "settling",
        SessionPhase::Idle if session.queue.is_empty() => "empty",
        SessionPhase::Idle if session.index >= session.queue.len() => "exhausted",
        SessionPhase::Idle => "idle",
    };
    let pending = match &session.phase {
        SessionPhase::Settling(p) => Some(PendingActionView {
            listing_id: p.listing_id,
            action: p.action,
            expires_in_ms: p
                .deadline
                .saturating_duration_since(Instant::now())
                .as_millis() as u64,
        }),
        SessionPhase::Idle => None,
    };
    SwipeStateResponse {
        phase: phase.to_string(),
        index: session.index,
        total: session.queue.len(),
        current: session
            .queue
            .get(session.index)
            .cloned()
            .map(ListingResponse::from),
        pending,
        fullscreen: session.fullscreen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::listing_dto::CreateListingPayload;
    use crate::models::listing::ListingKind;
    use crate::services::status_history::StatusHistoryService;
    use crate::services::webhook::WebhookService;
    use crate::store::{MemoryStore, RecordStore, SharedStore, StoreError};
    use async_trait::async_trait;
    use serde_json::Value as JsonValue;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Harness {
        swipe: SwipeService,
        listings: ListingsService,
        action_log: ActionLogService,
        points: PointsService,
        applications: ApplicationsService,
        notifications: NotificationsService,
        employer: Uuid,
        seeker: Uuid,
    }

    fn harness(welcome_grant: i64) -> Harness {
        harness_with(Arc::new(MemoryStore::new()), welcome_grant)
    }

    fn harness_with(store: SharedStore, welcome_grant: i64) -> Harness {
        let points = PointsService::new(store.clone(), welcome_grant);
        let listings = ListingsService::new(store.clone(), points.clone(), 50);
        let action_log = ActionLogService::new(store.clone());
        let notifications = NotificationsService::new(store.clone());
        let history = StatusHistoryService::new(store.clone(), Arc::new(MemoryStore::new()));
        let applications = ApplicationsService::new(
            store.clone(),
            history,
            notifications.clone(),
            WebhookService::new(None, None),
        );
        let swipe = SwipeService::new(
            listings.clone(),
            action_log.clone(),
            points.clone(),
            applications.clone(),
            notifications.clone(),
        );
        Harness {
            swipe,
            listings,
            action_log,
            points,
            applications,
            notifications,
            employer: Uuid::new_v4(),
            seeker: Uuid::new_v4(),
        }
    }

    // Forwards everything to a MemoryStore until armed, then refuses
    // action-log writes the way a broken backend would.
    struct RefusingActionWrites {
        inner: MemoryStore,
        refuse: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for RefusingActionWrites {
        async fn get(
            &self,
            namespace: &str,
        ) -> std::result::Result<Option<JsonValue>, StoreError> {
            self.inner.get(namespace).await
        }

        async fn put(&self, namespace: &str, doc: JsonValue) -> std::result::Result<(), StoreError> {
            if self.refuse.load(Ordering::SeqCst) && namespace.starts_with("actions/") {
                return Err(StoreError::Unavailable("action log offline".to_string()));
            }
            self.inner.put(namespace, doc).await
        }

        async fn delete(&self, namespace: &str) -> std::result::Result<(), StoreError> {
            self.inner.delete(namespace).await
        }
    }

    async fn seed(h: &Harness, title: &str, minimum_points: i64) -> Listing {
        h.listings
            .create(
                h.employer,
                CreateListingPayload {
                    kind: ListingKind::Job,
                    title: title.to_string(),
                    company: "Acme".to_string(),
                    location: "Remote".to_string(),
                    category: None,
                    experience_level: None,
                    education_level: None,
                    salary_from: None,
                    salary_to: None,
                    description: None,
                    minimum_points: Some(minimum_points),
                    requires_application: None,
                    status: Some("published".to_string()),
                },
            )
            .await
            .unwrap()
    }

    #[test]
    fn release_classification() {
        assert_eq!(classify_release(160.0, 5.0), Some(ActionKind::Applied));
        assert_eq!(classify_release(-150.0, 10.0), Some(ActionKind::Ignored));
        assert_eq!(classify_release(30.0, -140.0), Some(ActionKind::Saved));
        assert_eq!(classify_release(0.0, 120.0), Some(ActionKind::Blocked));
        // Inside the threshold nothing registers.
        assert_eq!(classify_release(99.0, 0.0), None);
        assert_eq!(classify_release(-80.0, 90.0), None);
        assert_eq!(classify_release(0.0, 0.0), None);
        // Landing exactly on the threshold still snaps back; it takes
        // strictly more to register.
        assert_eq!(classify_release(100.0, 0.0), None);
        assert_eq!(classify_release(0.0, -100.0), None);
        assert_eq!(classify_release(100.1, 0.0), Some(ActionKind::Applied));
        // Ties go to the horizontal axis.
        assert_eq!(classify_release(150.0, 150.0), Some(ActionKind::Applied));
    }

    #[tokio::test]
    async fn rejects_gesture_without_a_session() {
        let h = harness(100);
        let outcome = h.swipe.gesture(h.seeker, 160.0, 0.0).await;
        assert!(matches!(outcome, Err(Error::NotFound(_))));
    }

    // Scenario: balance 0, listing costs 50, right swipe must bounce with a
    // notice and zero mutation, however often it is repeated.
    #[tokio::test(start_paused = true)]
    async fn apply_guard_rejects_when_balance_is_short() {
        let h = harness(0);
        let expensive = seed(&h, "Expensive", 50).await;
        seed(&h, "Cheap", 0).await;

        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        assert_eq!(state.total, 2);
        assert_eq!(state.current.as_ref().unwrap().id, expensive.id);

        for _ in 0..3 {
            let outcome = h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();
            assert!(!outcome.accepted);
            assert!(outcome.notice.as_deref().unwrap().contains("points"));
            assert_eq!(outcome.state.index, 0);
            assert_eq!(outcome.state.phase, "idle");
            assert!(outcome.state.pending.is_none());
        }

        assert!(h.points.list(h.seeker).await.unwrap().is_empty());
        assert!(h.action_log.excluded_ids(h.seeker).await.unwrap().is_empty());
    }

    // Scenario: balance 100, cost 10; the swipe settles, the window runs
    // out, and exactly one applied action plus a 10 point credit land.
    #[tokio::test(start_paused = true)]
    async fn apply_commits_after_the_undo_window() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 10).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();

        let outcome = h.swipe.gesture(h.seeker, 160.0, 5.0).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.state.phase, "settling");
        assert_eq!(outcome.state.index, 1);
        let pending = outcome.state.pending.unwrap();
        assert_eq!(pending.listing_id, listing.id);
        assert_eq!(pending.action, ActionKind::Applied);

        tokio::time::advance(Duration::from_millis(4001)).await;

        let state = h.swipe.current_state(h.seeker).await.unwrap();
        assert_eq!(state.phase, "exhausted");
        assert_eq!(state.index, 1);
        assert!(state.pending.is_none());

        let applied = h
            .action_log
            .members(h.seeker, ActionKind::Applied)
            .await
            .unwrap();
        assert_eq!(applied, vec![listing.id]);

        let summary = h.points.summary(h.seeker).await.unwrap();
        assert_eq!(summary.earned, 110);

        let mine = h.applications.list_for_seeker(h.seeker).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].listing_id, listing.id);
    }

    // Scenario: undo at t=1s rolls the card back and nothing persists, even
    // after the original deadline would have passed.
    #[tokio::test(start_paused = true)]
    async fn undo_within_window_leaves_no_trace() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 10).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();

        tokio::time::advance(Duration::from_millis(1000)).await;
        let outcome = h.swipe.undo(h.seeker).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.state.index, 0);
        assert_eq!(outcome.state.phase, "idle");
        assert_eq!(outcome.state.current.as_ref().unwrap().id, listing.id);

        tokio::time::advance(Duration::from_millis(5000)).await;
        let state = h.swipe.current_state(h.seeker).await.unwrap();
        assert_eq!(state.index, 0);

        assert!(h.action_log.load(h.seeker).await.unwrap().history.is_empty());
        let entries = h.points.list(h.seeker).await.unwrap();
        assert_eq!(entries.len(), 1, "only the welcome grant");
        assert!(h.applications.list_for_seeker(h.seeker).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn undo_after_expiry_is_too_late() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 10).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();

        tokio::time::advance(Duration::from_millis(4500)).await;
        let outcome = h.swipe.undo(h.seeker).await.unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.notice.as_deref().unwrap().contains("too late"));

        let applied = h
            .action_log
            .members(h.seeker, ActionKind::Applied)
            .await
            .unwrap();
        assert_eq!(applied, vec![listing.id]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_gestures_are_ignored_while_settling() {
        let h = harness(100);
        let first = seed(&h, "First", 0).await;
        seed(&h, "Second", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        let outcome = h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();
        assert!(outcome.accepted);

        let second = h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();
        assert!(!second.accepted);
        assert!(second.notice.as_deref().unwrap().contains("settling"));
        assert_eq!(second.state.index, 1);
        assert_eq!(second.state.pending.as_ref().unwrap().listing_id, first.id);

        let button = h.swipe.act(h.seeker, ActionKind::Blocked).await.unwrap();
        assert!(!button.accepted);
    }

    #[tokio::test(start_paused = true)]
    async fn under_threshold_release_snaps_back() {
        let h = harness(100);
        seed(&h, "Backend Engineer", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        let outcome = h.swipe.gesture(h.seeker, 60.0, 20.0).await.unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.notice.is_none());
        assert_eq!(outcome.state.phase, "idle");
        assert_eq!(outcome.state.index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn buttons_bypass_the_threshold() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        let outcome = h.swipe.act(h.seeker, ActionKind::Blocked).await.unwrap();
        assert!(outcome.accepted);

        tokio::time::advance(Duration::from_millis(4001)).await;
        h.swipe.sweep_expired().await;

        let blocked = h
            .action_log
            .members(h.seeker, ActionKind::Blocked)
            .await
            .unwrap();
        assert_eq!(blocked, vec![listing.id]);

        // The blocked listing is excluded from the next queue.
        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        assert_eq!(state.phase, "empty");
        assert_eq!(state.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn saved_listings_stay_in_the_queue() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.act(h.seeker, ActionKind::Saved).await.unwrap();
        tokio::time::advance(Duration::from_millis(4001)).await;
        h.swipe.sweep_expired().await;

        let saved = h.action_log.members(h.seeker, ActionKind::Saved).await.unwrap();
        assert_eq!(saved, vec![listing.id]);

        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        assert_eq!(state.total, 1);
        assert_eq!(state.current.as_ref().unwrap().id, listing.id);
    }

    #[tokio::test(start_paused = true)]
    async fn fullscreen_toggle_preserves_index_and_timer() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 10).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();

        tokio::time::advance(Duration::from_millis(3500)).await;
        let state = h.swipe.toggle_fullscreen(h.seeker).await.unwrap();
        assert!(state.fullscreen);
        assert_eq!(state.index, 1);
        assert_eq!(state.pending.as_ref().unwrap().listing_id, listing.id);

        // The deadline was not reset by the toggle: 600ms later it fires.
        tokio::time::advance(Duration::from_millis(600)).await;
        let state = h.swipe.current_state(h.seeker).await.unwrap();
        assert!(state.pending.is_none());
        assert!(state.fullscreen);

        let applied = h
            .action_log
            .members(h.seeker, ActionKind::Applied)
            .await
            .unwrap();
        assert_eq!(applied, vec![listing.id]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_and_exhausted_states_are_distinct() {
        let h = harness(100);

        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        assert_eq!(state.phase, "empty");

        seed(&h, "Only One", 0).await;
        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, -160.0, 0.0).await.unwrap();
        tokio::time::advance(Duration::from_millis(4001)).await;

        let state = h.swipe.current_state(h.seeker).await.unwrap();
        assert_eq!(state.phase, "exhausted");
        assert_eq!(state.total, 1);

        let outcome = h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.notice.as_deref().unwrap().contains("left"));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_a_session_commits_the_pending_action() {
        let h = harness(100);
        let listing = seed(&h, "Backend Engineer", 10).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();

        // Well inside the undo window, the user rebuilds the queue.
        tokio::time::advance(Duration::from_millis(500)).await;
        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();

        let applied = h
            .action_log
            .members(h.seeker, ActionKind::Applied)
            .await
            .unwrap();
        assert_eq!(applied, vec![listing.id]);
        // And the committed listing is excluded from the fresh queue.
        assert_eq!(state.total, 0);
        assert_eq!(state.phase, "empty");
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_grant_arrives_once() {
        let h = harness(100);
        seed(&h, "Backend Engineer", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();

        assert_eq!(h.points.balance(h.seeker).await.unwrap(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_listing_is_gone_from_the_next_queue() {
        let h = harness(100);
        let first = seed(&h, "First", 0).await;
        let second = seed(&h, "Second", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        h.swipe.gesture(h.seeker, -170.0, 10.0).await.unwrap();
        tokio::time::advance(Duration::from_millis(4001)).await;
        h.swipe.sweep_expired().await;

        let state = h
            .swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        assert_eq!(state.total, 1);
        assert_eq!(state.current.as_ref().unwrap().id, second.id);

        let ignored = h
            .action_log
            .members(h.seeker, ActionKind::Ignored)
            .await
            .unwrap();
        assert_eq!(ignored, vec![first.id]);
    }

    // Scenario: the action-log backend goes down inside the undo window.
    // The settled swipe must not survive as a phantom: nothing lands in the
    // log, the card comes back, and the user hears about it.
    #[tokio::test(start_paused = true)]
    async fn failed_action_write_rolls_the_card_back() {
        let store = Arc::new(RefusingActionWrites {
            inner: MemoryStore::new(),
            refuse: AtomicBool::new(false),
        });
        let h = harness_with(store.clone(), 100);
        let listing = seed(&h, "Backend Engineer", 0).await;

        h.swipe
            .start_session(h.seeker, ListingFilters::default())
            .await
            .unwrap();
        let outcome = h.swipe.gesture(h.seeker, 160.0, 0.0).await.unwrap();
        assert!(outcome.accepted);

        store.refuse.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_millis(4001)).await;

        // The settling poll snapshots before the append's outcome is known;
        // the rollback is visible from the next poll on.
        let settling_poll = h.swipe.current_state(h.seeker).await.unwrap();
        assert_eq!(settling_poll.index, 1);

        let state = h.swipe.current_state(h.seeker).await.unwrap();
        assert_eq!(state.phase, "idle");
        assert_eq!(state.index, 0);
        assert_eq!(state.current.as_ref().unwrap().id, listing.id);

        assert!(h.action_log.load(h.seeker).await.unwrap().history.is_empty());
        let alerts = h.notifications.list(h.seeker, false).await.unwrap();
        assert!(alerts.iter().any(|n| n.severity == Severity::Error));
    }
}
