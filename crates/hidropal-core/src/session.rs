//! Interactive session state
//!
//! The last-deleted buffer lives here rather than in the engine: it belongs
//! to one user's session, is never persisted and is passed into the
//! operations that need it.

use hidropal_record::Measurement;

/// Rows removed by the most recent delete
///
/// Holds at most one delete's worth of rows. Overwritten by every delete,
/// emptied by undo.
#[derive(Debug, Clone, Default)]
pub struct LastDeletedBuffer {
    rows: Option<Vec<Measurement>>,
}

impl LastDeletedBuffer {
    /// Remember the rows of a delete, replacing anything held
    pub fn replace(&mut self, rows: Vec<Measurement>) {
        self.rows = Some(rows);
    }

    /// Take the held rows, leaving the buffer empty
    pub fn take(&mut self) -> Option<Vec<Measurement>> {
        self.rows.take().filter(|rows| !rows.is_empty())
    }

    /// Held rows, if any
    #[must_use]
    pub fn peek(&self) -> Option<&[Measurement]> {
        self.rows.as_deref().filter(|rows| !rows.is_empty())
    }

    /// Whether there is anything to undo
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    /// Drop the held rows
    pub fn clear(&mut self) {
        self.rows = None;
    }
}

/// One user's interactive session
#[derive(Debug, Clone, Default)]
pub struct Session {
    last_deleted: LastDeletedBuffer,
}

impl Session {
    /// Fresh session with nothing to undo
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last-deleted buffer
    #[inline]
    #[must_use]
    pub fn last_deleted(&self) -> &LastDeletedBuffer {
        &self.last_deleted
    }

    /// Mutable access to the last-deleted buffer
    #[inline]
    pub fn last_deleted_mut(&mut self) -> &mut LastDeletedBuffer {
        &mut self.last_deleted
    }

    /// Whether an undo would have something to restore
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.last_deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(level: f64) -> Measurement {
        Measurement::new(NaiveDate::from_ymd_opt(2024, 4, 3), Some(level), None, None)
    }

    #[test]
    fn replace_overwrites_previous_delete() {
        let mut buffer = LastDeletedBuffer::default();
        buffer.replace(vec![row(1.0)]);
        buffer.replace(vec![row(2.0)]);
        assert_eq!(buffer.peek().unwrap()[0].level, Some(2.0));
    }

    #[test]
    fn take_consumes() {
        let mut session = Session::new();
        assert!(!session.can_undo());
        session.last_deleted_mut().replace(vec![row(1.0)]);
        assert!(session.can_undo());
        assert_eq!(session.last_deleted_mut().take().unwrap().len(), 1);
        assert!(session.last_deleted_mut().take().is_none());
        assert!(!session.can_undo());
    }

    #[test]
    fn empty_delete_is_nothing_to_undo() {
        let mut buffer = LastDeletedBuffer::default();
        buffer.replace(Vec::new());
        assert!(buffer.is_empty());
        assert!(buffer.take().is_none());
    }
}
