//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update of
//! movements), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::movements::MovementKind;

/// One desired detail line in a movement being created.
#[derive(Clone, Debug)]
pub struct DetailInput {
    pub supply_id: Uuid,
    pub quantity: i64,
    pub note: Option<String>,
}

impl DetailInput {
    #[must_use]
    pub fn new(supply_id: Uuid, quantity: i64) -> Self {
        Self {
            supply_id,
            quantity,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create a movement with its detail lines.
#[derive(Clone, Debug)]
pub struct CreateMovementCmd {
    pub kind: MovementKind,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub details: Vec<DetailInput>,
}

impl CreateMovementCmd {
    #[must_use]
    pub fn new(kind: MovementKind, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            occurred_at,
            note: None,
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: DetailInput) -> Self {
        self.details.push(detail);
        self
    }

    #[must_use]
    pub fn details(mut self, details: Vec<DetailInput>) -> Self {
        self.details = details;
        self
    }
}

/// One desired detail line in a movement being updated.
///
/// `id: Some(..)` of an existing line means "keep this line" (its content is
/// rewritten from the other fields); `None`, or an id the movement does not
/// own, means "create a new line". Persisted lines absent from the desired
/// list are deleted.
#[derive(Clone, Debug)]
pub struct DetailPatch {
    pub id: Option<Uuid>,
    pub supply_id: Uuid,
    pub quantity: i64,
    pub note: Option<String>,
}

impl DetailPatch {
    #[must_use]
    pub fn new(supply_id: Uuid, quantity: i64) -> Self {
        Self {
            id: None,
            supply_id,
            quantity,
            note: None,
        }
    }

    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Update an existing movement: header fields and the full desired detail
/// list. The engine diffs `details` against the persisted lines.
#[derive(Clone, Debug)]
pub struct UpdateMovementCmd {
    pub movement_id: Uuid,
    pub details: Vec<DetailPatch>,

    pub occurred_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl UpdateMovementCmd {
    #[must_use]
    pub fn new(movement_id: Uuid, details: Vec<DetailPatch>) -> Self {
        Self {
            movement_id,
            details,
            occurred_at: None,
            note: None,
        }
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
