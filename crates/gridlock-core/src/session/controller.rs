use gridlock_engine::engine::{CalculationManager, CellRef, Sheet, SheetError};

use super::builder::FormulaBuilder;
use super::service::SheetService;
use crate::error::{GridlockError, Result};

/// One user's view of a sheet.
///
/// Keystrokes edit the working cell's formula through a [`FormulaBuilder`]
/// and every edit triggers a full recalculation. Sharing goes through a
/// [`SheetService`]: lock the working cell with [`begin_edit`], commit with
/// [`finish_edit`], and call [`poll`] periodically to pick up other users'
/// commits.
///
/// [`begin_edit`]: SpreadSheetController::begin_edit
/// [`finish_edit`]: SpreadSheetController::finish_edit
/// [`poll`]: SpreadSheetController::poll
pub struct SpreadSheetController {
    sheet: Sheet,
    builder: FormulaBuilder,
    calc: CalculationManager,
    user: String,
    /// True while this session holds the lock on the working cell.
    editing: bool,
    /// Server version the local formulas reflect.
    applied_version: u64,
    /// Version committed by `finish_edit` whose unlock has not gone through.
    committed: Option<u64>,
}

impl SpreadSheetController {
    pub fn new(columns: usize, rows: usize, user: impl Into<String>) -> Result<Self> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(GridlockError::InvalidRequest("user name must not be empty".into()));
        }
        Ok(SpreadSheetController {
            sheet: Sheet::new(columns, rows)?,
            builder: FormulaBuilder::new(),
            calc: CalculationManager::new(),
            user,
            editing: false,
            applied_version: 0,
            committed: None,
        })
    }

    /// Replace the calculation manager, e.g. to make `Rand` deterministic.
    pub fn with_calculation_manager(mut self, calc: CalculationManager) -> Self {
        self.calc = calc;
        self.recalculate();
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    fn recalculate(&mut self) {
        self.calc.evaluate_sheet(&mut self.sheet);
    }

    /// Write the builder into the working cell and recompute.
    fn store_formula(&mut self) {
        self.sheet.set_working_formula(self.builder.formula().to_vec());
        self.recalculate();
    }

    // =========================================================================
    // Formula editing
    // =========================================================================

    pub fn add_token(&mut self, token: &str) {
        self.builder.add_token(token);
        self.store_formula();
    }

    /// Append a reference to `label`.
    ///
    /// Returns false and leaves the formula unchanged when the label is not in
    /// the sheet, names the working cell, or would close a cycle.
    pub fn add_cell(&mut self, label: &str) -> bool {
        let Ok(target) = self.sheet.resolve(label) else {
            tracing::debug!("ignoring reference to {}: not in sheet", label);
            return false;
        };
        let working = self.sheet.working_cell();
        if target == working {
            return false;
        }
        if !self.calc.ok_to_add_new_dependency(&self.sheet, &working, &target) {
            return false;
        }
        self.add_token(label);
        true
    }

    pub fn remove_token(&mut self) {
        self.builder.remove_token();
        self.store_formula();
    }

    pub fn clear_formula(&mut self) {
        self.builder.clear();
        self.store_formula();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn set_working_cell_by_label(&mut self, label: &str) -> Result<()> {
        let target = self.sheet.resolve(label)?;
        self.move_to(target)
    }

    pub fn set_working_cell_by_coordinates(&mut self, column: usize, row: usize) -> Result<()> {
        let target = CellRef::new(column, row);
        if !self.sheet.contains(&target) {
            return Err(SheetError::OutOfBounds(target.to_string()).into());
        }
        self.move_to(target)
    }

    /// Flush the builder into the current cell and load `target` for editing.
    /// Moving is refused while the current cell is locked by this session.
    fn move_to(&mut self, target: CellRef) -> Result<()> {
        let working = self.sheet.working_cell();
        if target == working {
            return Ok(());
        }
        if self.editing {
            return Err(GridlockError::InvalidRequest(format!(
                "finish editing {} before moving to {}",
                working, target
            )));
        }
        self.sheet.set_working_formula(self.builder.formula().to_vec());
        self.sheet.set_working_cell(target)?;
        self.builder.set_formula(self.sheet.working_formula());
        if self.sheet.needs_recalc() {
            self.recalculate();
        }
        Ok(())
    }

    // =========================================================================
    // Display
    // =========================================================================

    pub fn formula_string(&self) -> String {
        self.builder.to_string()
    }

    /// Display string of the working cell.
    pub fn result_string(&self) -> String {
        self.sheet
            .cell(&self.sheet.working_cell())
            .map(|c| c.display_string())
            .unwrap_or_default()
    }

    pub fn working_cell_label(&self) -> String {
        self.sheet.working_cell().to_string()
    }

    /// Display strings, `[row][column]`.
    pub fn display_strings(&self) -> Vec<Vec<String>> {
        self.sheet.display_strings()
    }

    pub fn edit_status_string(&self) -> String {
        if self.editing {
            format!("editing: {}", self.working_cell_label())
        } else {
            format!("current cell: {}", self.working_cell_label())
        }
    }

    /// Who holds the working cell's lock, as last seen by this session.
    pub fn working_cell_holder(&self) -> Option<&str> {
        self.sheet
            .cell(&self.sheet.working_cell())
            .and_then(|c| c.lock_holder.as_deref())
    }

    fn set_holder(&mut self, cell: CellRef, holder: Option<String>) {
        if let Some(cell) = self.sheet.cell_mut(&cell) {
            cell.lock_holder = holder;
        }
    }

    // =========================================================================
    // Sharing
    // =========================================================================

    /// Lock the working cell and reload it from the shared document.
    ///
    /// On conflict the holder is recorded on the cell and the
    /// [`GridlockError::CellAlreadyLocked`] error is returned.
    pub fn begin_edit(&mut self, service: &dyn SheetService) -> Result<()> {
        if self.editing {
            return Ok(());
        }
        let cell = self.sheet.working_cell();
        if let Err(err) = service.lock_cell(cell, &self.user) {
            if let GridlockError::CellAlreadyLocked { holder, .. } = &err {
                self.set_holder(cell, Some(holder.clone()));
            }
            return Err(err);
        }

        // Start from the committed formula, not whatever was typed while unlocked.
        if let Err(err) = self.refresh(service) {
            if let Err(unlock_err) = service.unlock_cell(cell, &self.user) {
                tracing::warn!(user = %self.user, %cell, "failed to release lock: {}", unlock_err);
            }
            return Err(err);
        }
        self.editing = true;
        self.set_holder(cell, Some(self.user.clone()));
        tracing::debug!(user = %self.user, %cell, "editing");
        Ok(())
    }

    /// Commit the working cell's formula, then release its lock.
    ///
    /// Returns the version created by the commit. If the commit lands but the
    /// unlock fails, a retry only repeats the unlock.
    pub fn finish_edit(&mut self, service: &dyn SheetService) -> Result<u64> {
        let cell = self.sheet.working_cell();
        if !self.editing {
            return Err(GridlockError::LockNotHeld { cell });
        }

        let version = match self.committed {
            Some(version) => version,
            None => {
                let version = service.update_cell(cell, self.builder.formula(), &self.user)?;
                // Anything between our last fetch and this commit must still be pulled.
                if version == self.applied_version + 1 {
                    self.applied_version = version;
                }
                self.committed = Some(version);
                version
            }
        };
        service.unlock_cell(cell, &self.user)?;

        self.committed = None;
        self.editing = false;
        self.set_holder(cell, None);
        tracing::debug!(user = %self.user, %cell, version, "committed");
        Ok(version)
    }

    /// Release the working cell's lock without committing and restore the
    /// shared formulas.
    pub fn cancel_edit(&mut self, service: &dyn SheetService) -> Result<()> {
        if !self.editing {
            return Ok(());
        }
        let cell = self.sheet.working_cell();
        service.unlock_cell(cell, &self.user)?;
        self.committed = None;
        self.editing = false;
        self.set_holder(cell, None);
        self.refresh(service)
    }

    /// Pull the shared formulas when the document has moved past the version
    /// applied locally. Returns true when a new snapshot was loaded.
    pub fn poll(&mut self, service: &dyn SheetService) -> Result<bool> {
        let cell = self.sheet.working_cell();
        let holder = service.lock_status(cell)?;
        self.set_holder(cell, holder);

        let version = service.version()?;
        if version <= self.applied_version {
            return Ok(false);
        }
        self.refresh(service)?;
        Ok(true)
    }

    fn refresh(&mut self, service: &dyn SheetService) -> Result<()> {
        let snapshot = service.full_state()?;
        let working = self.sheet.working_cell();

        self.sheet
            .load_formulas(&snapshot.cells, self.editing.then_some(working));
        if !self.editing {
            self.builder.set_formula(self.sheet.working_formula());
        }
        tracing::debug!(
            user = %self.user,
            from = self.applied_version,
            to = snapshot.version,
            "applied snapshot"
        );
        self.applied_version = snapshot.version;

        if self.sheet.needs_recalc() {
            self.recalculate();
        }
        Ok(())
    }
}
