use super::Document;
use crate::error::{GridlockError, Result};
use gridlock_engine::engine::{CellRef, Formula, Token};

fn validate_user(user: &str) -> Result<()> {
    if user.trim().is_empty() {
        return Err(GridlockError::InvalidRequest("user name must not be empty".into()));
    }
    Ok(())
}

fn validate_formula(formula: &[String]) -> Result<()> {
    match formula.iter().find(|t| matches!(Token::parse(t), Token::Unknown)) {
        Some(token) => Err(GridlockError::InvalidRequest(format!(
            "unrecognised formula token {:?}",
            token
        ))),
        None => Ok(()),
    }
}

impl Document {
    /// Take the edit lock on `cell` for `user`.
    ///
    /// Re-locking by the current holder succeeds. A lock held by someone else
    /// fails with [`GridlockError::CellAlreadyLocked`] naming the holder.
    pub fn lock_cell(&mut self, cell: CellRef, user: &str) -> Result<()> {
        validate_user(user)?;
        match self.locks.get(&cell) {
            Some(holder) if holder != user => {
                tracing::debug!(document = %self.name, %cell, %user, %holder, "lock denied");
                Err(GridlockError::CellAlreadyLocked {
                    cell,
                    holder: holder.clone(),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.locks.insert(cell, user.to_string());
                tracing::debug!(document = %self.name, %cell, %user, "lock granted");
                Ok(())
            }
        }
    }

    /// Release the lock on `cell`. Only the holder may release it.
    pub fn unlock_cell(&mut self, cell: CellRef, user: &str) -> Result<()> {
        validate_user(user)?;
        if self.locks.get(&cell).map(String::as_str) != Some(user) {
            return Err(GridlockError::LockNotHeld { cell });
        }
        self.locks.remove(&cell);
        tracing::debug!(document = %self.name, %cell, %user, "lock released");
        Ok(())
    }

    /// Commit a new formula for `cell`. The requester must hold its lock.
    ///
    /// Returns the new document version. An empty formula clears the cell.
    pub fn update_cell(&mut self, cell: CellRef, formula: Formula, user: &str) -> Result<u64> {
        validate_user(user)?;
        if self.locks.get(&cell).map(String::as_str) != Some(user) {
            return Err(GridlockError::LockNotHeld { cell });
        }
        validate_formula(&formula)?;

        if formula.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, formula);
        }
        self.version += 1;
        tracing::info!(document = %self.name, %cell, %user, version = self.version, "cell updated");
        Ok(self.version)
    }
}
