use serde::{Deserialize, Serialize};

use crate::{MotorlotError, MotorlotResult, Timestamp};

/// Whether reads see soft-deleted rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadScope {
    #[default]
    ExcludeDeleted,
    IncludeDeleted,
}

impl ReadScope {
    pub fn includes_deleted(self) -> bool {
        matches!(self, ReadScope::IncludeDeleted)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RowState {
    Active,
    SoftDeleted { deleted_at: Timestamp },
}

/// What a delete does to one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteAction {
    /// Set `deletedAt`; the row stays in the table.
    SoftDelete,
    /// Physically remove the row.
    Remove,
}

impl RowState {
    pub fn from_deleted_at(deleted_at: Option<Timestamp>) -> Self {
        match deleted_at {
            Some(deleted_at) => RowState::SoftDeleted { deleted_at },
            None => RowState::Active,
        }
    }

    pub fn deleted_at(self) -> Option<Timestamp> {
        match self {
            RowState::Active => None,
            RowState::SoftDeleted { deleted_at } => Some(deleted_at),
        }
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, RowState::SoftDeleted { .. })
    }

    /// A soft-deleted row is invisible, so deleting it again reports it missing.
    pub fn soft_delete(self, now: Timestamp) -> MotorlotResult<RowState> {
        match self {
            RowState::Active => Ok(RowState::SoftDeleted { deleted_at: now }),
            RowState::SoftDeleted { .. } => {
                Err(MotorlotError::not_found("row is already soft-deleted"))
            }
        }
    }

    pub fn restore(self) -> MotorlotResult<RowState> {
        match self {
            RowState::SoftDeleted { .. } => Ok(RowState::Active),
            RowState::Active => Err(MotorlotError::conflict("row is not soft-deleted")),
        }
    }

    /// Updates only reach rows visible by default.
    pub fn check_writable(self) -> MotorlotResult<()> {
        match self {
            RowState::Active => Ok(()),
            RowState::SoftDeleted { .. } => Err(MotorlotError::not_found("row is soft-deleted")),
        }
    }

    pub fn visible(self, scope: ReadScope) -> bool {
        scope.includes_deleted() || !self.is_deleted()
    }
}

pub fn delete_action(paranoid: bool) -> DeleteAction {
    if paranoid {
        DeleteAction::SoftDelete
    } else {
        DeleteAction::Remove
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_delete_then_restore() {
        let now = Timestamp::from_micros(100);
        let deleted = RowState::Active.soft_delete(now).unwrap();
        assert_eq!(deleted.deleted_at(), Some(now));
        assert!(matches!(
            deleted.soft_delete(Timestamp::from_micros(200)),
            Err(MotorlotError::NotFound { .. })
        ));
        assert_eq!(deleted.restore().unwrap(), RowState::Active);
        assert!(matches!(
            RowState::Active.restore(),
            Err(MotorlotError::Conflict { .. })
        ));
    }

    #[test]
    fn default_scope_hides_deleted_rows() {
        let deleted = RowState::SoftDeleted {
            deleted_at: Timestamp::from_micros(1),
        };
        assert!(!deleted.visible(ReadScope::default()));
        assert!(deleted.visible(ReadScope::IncludeDeleted));
        assert!(RowState::Active.visible(ReadScope::ExcludeDeleted));
    }

    #[test]
    fn writes_to_deleted_rows_are_not_found() {
        let deleted = RowState::from_deleted_at(Some(Timestamp::from_micros(5)));
        assert!(matches!(
            deleted.check_writable(),
            Err(MotorlotError::NotFound { .. })
        ));
    }

    #[test]
    fn paranoid_flag_picks_the_action() {
        assert_eq!(delete_action(true), DeleteAction::SoftDelete);
        assert_eq!(delete_action(false), DeleteAction::Remove);
    }
}
