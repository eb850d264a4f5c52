//! Whole-sheet recalculation.
//!
//! Every committed formula change triggers one full pass:
//!
//! 1. re-extract `depends_on` for every cell,
//! 2. order cells so each one follows everything it references,
//! 3. evaluate cells in that order, writing value and error back.
//!
//! Editing only pays for the cycle check on a new reference; the graph is
//! rebuilt here.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::cycle::{can_add_dependency, detect_cycle};
use super::deps::extract_dependencies;
use super::error::FormulaError;
use super::eval::{FormulaEvaluator, RandomSource};
use super::{CellRef, Sheet};

/// Order in which cells must be evaluated: dependencies before dependents.
///
/// Depth-first post-order over all cells, starting from each unvisited cell
/// in row-major order. Cells caught in a cycle still appear exactly once.
pub fn computation_order(sheet: &Sheet) -> Vec<CellRef> {
    let mut order = Vec::with_capacity(sheet.columns() * sheet.rows());
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();

    for cell_ref in sheet.cell_refs() {
        visit(sheet, cell_ref, &mut visited, &mut on_stack, &mut order);
    }
    order
}

fn visit(
    sheet: &Sheet,
    cell_ref: CellRef,
    visited: &mut HashSet<CellRef>,
    on_stack: &mut HashSet<CellRef>,
    order: &mut Vec<CellRef>,
) {
    if on_stack.contains(&cell_ref) {
        if let Some(path) = detect_cycle(sheet, &cell_ref) {
            let labels: Vec<String> = path.iter().map(CellRef::to_string).collect();
            tracing::warn!("circular reference: {}", labels.join(" -> "));
        }
        return;
    }
    if !visited.insert(cell_ref) {
        return;
    }
    let Some(cell) = sheet.cell(&cell_ref) else {
        return;
    };

    on_stack.insert(cell_ref);
    for dep in &cell.depends_on {
        visit(sheet, *dep, visited, on_stack, order);
    }
    on_stack.remove(&cell_ref);
    order.push(cell_ref);
}

/// Drives dependency tracking and evaluation for a [`Sheet`].
pub struct CalculationManager {
    random: Box<dyn RandomSource + Send>,
}

impl CalculationManager {
    /// Manager whose `Rand` operator draws from an entropy-seeded generator.
    pub fn new() -> Self {
        Self::with_random(StdRng::from_entropy())
    }

    pub fn with_random(random: impl RandomSource + Send + 'static) -> Self {
        CalculationManager {
            random: Box::new(random),
        }
    }

    /// Check whether `current` may reference `new_dependency`.
    pub fn ok_to_add_new_dependency(
        &self,
        sheet: &Sheet,
        current: &CellRef,
        new_dependency: &CellRef,
    ) -> bool {
        let ok = can_add_dependency(sheet, current, new_dependency);
        if !ok {
            tracing::debug!("rejected {} -> {}: would create a cycle", current, new_dependency);
        }
        ok
    }

    /// Re-extract `depends_on` for every cell from its formula.
    pub fn update_dependencies(&self, sheet: &mut Sheet) {
        for cell in sheet.cells_mut() {
            cell.depends_on = extract_dependencies(&cell.formula);
        }
    }

    pub fn computation_order(&self, sheet: &Sheet) -> Vec<CellRef> {
        computation_order(sheet)
    }

    /// Recompute every cell in dependency order.
    pub fn evaluate_sheet(&mut self, sheet: &mut Sheet) {
        self.update_dependencies(sheet);
        let order = computation_order(sheet);

        for cell in sheet.cells_mut() {
            cell.reset_value();
        }

        for cell_ref in &order {
            let Some(cell) = sheet.cell(cell_ref) else {
                continue;
            };

            let (value, error) = if cell.is_empty() {
                (None, Some(FormulaError::EmptyFormula))
            } else if cell
                .depends_on
                .iter()
                .any(|dep| sheet.cell(dep).and_then(|d| d.value).is_none())
            {
                (Some(0.0), Some(FormulaError::InvalidCell))
            } else {
                let formula = cell.formula.clone();
                let result = FormulaEvaluator::new(&*sheet, self.random.as_mut()).evaluate(&formula);
                (Some(result.value), result.error)
            };

            if let Some(cell) = sheet.cell_mut(cell_ref) {
                cell.value = value;
                cell.error = error;
            }
        }

        sheet.reset_recalc();
        tracing::trace!("recalculated {} cells", order.len());
    }
}

impl Default for CalculationManager {
    fn default() -> Self {
        Self::new()
    }
}
