//! Work delegated off the dispatcher.
//!
//! Database calls run as tokio tasks and password hashing on the blocking
//! pool. Each job reports back as [`InboundEvent::Completed`] so that all
//! state changes still happen inside the dispatcher.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::events::{InboundEvent, Outcome};
use crate::db::{Database, IdentityRecord, NewIdentity};
use crate::error::WorkError;
use crate::security::{Credentials, Plaintext};
use crate::state::ConnectionId;

#[derive(Clone)]
pub struct Delegate {
    db: Database,
    credentials: Credentials,
    events: mpsc::Sender<InboundEvent>,
}

impl Delegate {
    pub fn new(db: Database, credentials: Credentials, events: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            db,
            credentials,
            events,
        }
    }

    /// Run `job` and post its outcome back to the dispatcher.
    fn complete<F>(&self, conn: ConnectionId, job: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = job.await;
            if events
                .send(InboundEvent::Completed(conn, outcome))
                .await
                .is_err()
            {
                debug!(%conn, "Dispatcher gone, outcome dropped");
            }
        });
    }

    /// Find an identity by name along with its last saved location.
    pub fn lookup_identity(&self, conn: ConnectionId, name: String) {
        let db = self.db.clone();
        self.complete(conn, async move {
            Outcome::IdentityLookup(lookup(&db, &name).await)
        });
    }

    pub fn hash_password(&self, conn: ConnectionId, password: Plaintext) {
        let credentials = self.credentials.clone();
        self.complete(conn, async move {
            let result = tokio::task::spawn_blocking(move || credentials.hash(&password)).await;
            Outcome::PasswordHashed(flatten(result))
        });
    }

    pub fn verify_password(&self, conn: ConnectionId, hash: String, password: Plaintext) {
        let credentials = self.credentials.clone();
        self.complete(conn, async move {
            let result =
                tokio::task::spawn_blocking(move || credentials.verify(&hash, &password)).await;
            Outcome::PasswordChecked(flatten(result))
        });
    }

    pub fn create_identity(&self, conn: ConnectionId, new: NewIdentity) {
        let db = self.db.clone();
        self.complete(conn, async move {
            let result = db.identities().create(&new).await.map_err(WorkError::from);
            Outcome::IdentityCreated(result)
        });
    }

    /// Save a location and tell the player when it is done.
    pub fn save_location(&self, conn: ConnectionId, identity_id: i64, room_id: i64) {
        let db = self.db.clone();
        self.complete(conn, async move {
            let result = db
                .identities()
                .save_location(identity_id, room_id)
                .await
                .map_err(WorkError::from);
            Outcome::Saved(result)
        });
    }

    /// Save a location with nobody waiting on the result.
    pub fn persist_location(&self, identity_id: i64, room_id: i64) {
        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = db.identities().save_location(identity_id, room_id).await {
                warn!(identity_id, error = %e, "Failed to save location");
            }
        });
    }

    pub fn touch_login(&self, identity_id: i64) {
        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = db.identities().touch_login(identity_id).await {
                warn!(identity_id, error = %e, "Failed to record login time");
            }
        });
    }

    /// Save every location, waiting for completion. Used at shutdown.
    pub async fn save_all(&self, locations: Vec<(i64, i64)>) -> Result<(), WorkError> {
        let identities = self.db.identities();
        for (identity_id, room_id) in locations {
            identities.save_location(identity_id, room_id).await?;
        }
        Ok(())
    }
}

async fn lookup(db: &Database, name: &str) -> Result<Option<IdentityRecord>, WorkError> {
    let identities = db.identities();
    let Some(mut identity) = identities.find_by_name(name).await? else {
        return Ok(None);
    };
    identity.room_id = identities.last_location(identity.id).await?;
    Ok(Some(identity))
}

fn flatten<T, E>(result: Result<Result<T, E>, tokio::task::JoinError>) -> Result<T, WorkError>
where
    WorkError: From<E>,
{
    Ok(result??)
}
