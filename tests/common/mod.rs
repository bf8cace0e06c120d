#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use fake::faker::name::en::LastName;
use fake::Fake;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use guest_seating::models::{
    Event, Guest, ManualOverride, NewGuest, NewTable, Rsvp, RsvpSubmission, Table,
    TableAssignment,
};
use guest_seating::repository::{InMemorySeatingRepository, RepoFuture, SeatingRepository};
use guest_seating::seating::SeatingPolicy;
use guest_seating::{AppState, Error};

/// One event on an in-memory store, with services wired the way `main` does.
pub struct Fixture {
    pub repo: Arc<dyn SeatingRepository>,
    pub state: Arc<AppState>,
    pub event: Event,
}

pub async fn fixture() -> Fixture {
    fixture_with(SeatingPolicy::default()).await
}

pub async fn fixture_with(policy: SeatingPolicy) -> Fixture {
    let repo: Arc<dyn SeatingRepository> = Arc::new(InMemorySeatingRepository::new());
    fixture_on(repo, policy).await
}

pub async fn fixture_on(repo: Arc<dyn SeatingRepository>, policy: SeatingPolicy) -> Fixture {
    let event = repo.create_event("Smith & Jones Wedding".to_string()).await.unwrap();
    let state = AppState::new(repo.clone(), policy);
    Fixture { repo, state, event }
}

impl Fixture {
    pub async fn guest(&self, max_attendees: i32) -> Guest {
        let name: String = LastName().fake();
        self.repo
            .create_guest(self.event.id, NewGuest::named(name, max_attendees))
            .await
            .unwrap()
    }

    /// Guest who confirmed online for `count` people.
    pub async fn confirmed(&self, max_attendees: i32, count: i32) -> Guest {
        let guest = self.guest(max_attendees).await;
        self.state
            .attendance
            .submit_rsvp(guest.id, RsvpSubmission::attending(Some(count)))
            .await
            .unwrap()
    }

    pub async fn table(&self, name: &str, capacity: i32) -> Table {
        self.repo
            .create_table(self.event.id, NewTable::new(name, capacity))
            .await
            .unwrap()
    }

    pub async fn remaining(&self, table_id: i64) -> u32 {
        self.state.seating.ledger(table_id).await.unwrap().remaining
    }

    pub fn app(&self) -> Router {
        guest_seating::app(self.state.clone())
    }
}

/// Store wrapper whose `assign_guests` can be told to report contention
/// before delegating.
pub struct FlakyRepository {
    inner: Arc<dyn SeatingRepository>,
    failures_left: AtomicU32,
    pub attempts: AtomicU32,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemorySeatingRepository::new()),
            failures_left: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    /// The next `failures` seating writes fail with `Contention`.
    pub fn fail_next(&self, failures: u32) {
        self.failures_left.store(failures, Ordering::SeqCst);
        self.attempts.store(0, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SeatingRepository for FlakyRepository {
    fn create_event(&self, title: String) -> RepoFuture<'_, Event> {
        self.inner.create_event(title)
    }

    fn event(&self, event_id: i64) -> RepoFuture<'_, Event> {
        self.inner.event(event_id)
    }

    fn create_guest(&self, event_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest> {
        self.inner.create_guest(event_id, guest)
    }

    fn update_guest(&self, guest_id: i64, guest: NewGuest) -> RepoFuture<'_, Guest> {
        self.inner.update_guest(guest_id, guest)
    }

    fn delete_guest(&self, guest_id: i64) -> RepoFuture<'_, ()> {
        self.inner.delete_guest(guest_id)
    }

    fn create_table(&self, event_id: i64, table: NewTable) -> RepoFuture<'_, Table> {
        self.inner.create_table(event_id, table)
    }

    fn update_table(&self, table_id: i64, table: NewTable) -> RepoFuture<'_, Table> {
        self.inner.update_table(table_id, table)
    }

    fn delete_table(&self, table_id: i64) -> RepoFuture<'_, ()> {
        self.inner.delete_table(table_id)
    }

    fn guest(&self, guest_id: i64) -> RepoFuture<'_, Guest> {
        self.inner.guest(guest_id)
    }

    fn table(&self, table_id: i64) -> RepoFuture<'_, Table> {
        self.inner.table(table_id)
    }

    fn event_guests(&self, event_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        self.inner.event_guests(event_id)
    }

    fn event_tables(&self, event_id: i64) -> RepoFuture<'_, Vec<Table>> {
        self.inner.event_tables(event_id)
    }

    fn event_assignments(&self, event_id: i64) -> RepoFuture<'_, Vec<TableAssignment>> {
        self.inner.event_assignments(event_id)
    }

    fn table_guests(&self, table_id: i64) -> RepoFuture<'_, Vec<Guest>> {
        self.inner.table_guests(table_id)
    }

    fn assignment_for(&self, guest_id: i64) -> RepoFuture<'_, Option<TableAssignment>> {
        self.inner.assignment_for(guest_id)
    }

    fn save_rsvp(&self, guest_id: i64, submission: RsvpSubmission) -> RepoFuture<'_, Rsvp> {
        self.inner.save_rsvp(guest_id, submission)
    }

    fn save_manual_override(
        &self,
        guest_id: i64,
        manual: Option<ManualOverride>,
    ) -> RepoFuture<'_, Guest> {
        self.inner.save_manual_override(guest_id, manual)
    }

    fn assign_guests(
        &self,
        table_id: i64,
        guest_ids: Vec<i64>,
        policy: SeatingPolicy,
    ) -> RepoFuture<'_, Vec<TableAssignment>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Box::pin(async { Err::<Vec<TableAssignment>, _>(Error::Contention) });
        }
        self.inner.assign_guests(table_id, guest_ids, policy)
    }

    fn remove_assignment(&self, guest_id: i64) -> RepoFuture<'_, TableAssignment> {
        self.inner.remove_assignment(guest_id)
    }
}

/* ---------- HTTP helpers ---------- */

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
