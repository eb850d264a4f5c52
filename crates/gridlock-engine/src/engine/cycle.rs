//! Circular dependency checks for formula edits.
//!
//! Before a cell reference is appended to a formula we verify the new edge
//! would not close a loop (e.g., A1 references B1, B1 references C1, and C1
//! is about to reference A1). The walk uses the `depends_on` sets from the
//! last recalculation pass.

use std::collections::HashSet;

use super::{CellRef, Sheet};

/// True when `from` may start referencing `to` without creating a cycle.
pub fn can_add_dependency(sheet: &Sheet, from: &CellRef, to: &CellRef) -> bool {
    let mut visited = HashSet::new();
    !reaches(sheet, to, from, &mut visited)
}

fn reaches(sheet: &Sheet, current: &CellRef, target: &CellRef, visited: &mut HashSet<CellRef>) -> bool {
    if current == target {
        return true;
    }
    if !visited.insert(*current) {
        return false;
    }
    let Some(cell) = sheet.cell(current) else {
        return false;
    };
    cell.depends_on
        .iter()
        .any(|dep| reaches(sheet, dep, target, visited))
}

/// Detect a circular dependency through `start`.
/// Returns Some(cycle_path) if one is found, None otherwise.
pub fn detect_cycle(sheet: &Sheet, start: &CellRef) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(sheet, start, &mut visiting, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    sheet: &Sheet,
    current: &CellRef,
    visiting: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(*current);
        return true;
    }

    let Some(cell) = sheet.cell(current) else {
        return false;
    };

    visiting.insert(*current);
    path.push(*current);

    for dep in &cell.depends_on {
        if detect_cycle_dfs(sheet, dep, visiting, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::extract_dependencies;

    fn sheet_with(formulas: &[(&str, &[&str])]) -> Sheet {
        let mut sheet = Sheet::new(5, 5).unwrap();
        for (label, tokens) in formulas {
            let formula: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
            let cell_ref = CellRef::from_label(label).unwrap();
            let cell = sheet.cell_mut(&cell_ref).unwrap();
            cell.depends_on = extract_dependencies(&formula);
            cell.formula = formula;
        }
        sheet
    }

    fn cell(label: &str) -> CellRef {
        CellRef::from_label(label).unwrap()
    }

    #[test]
    fn test_chain_rejects_closing_edge() {
        // A1 -> B1 -> C1; C1 must not reference A1.
        let sheet = sheet_with(&[("A1", &["B1"]), ("B1", &["C1"]), ("C1", &["1"])]);
        assert!(!can_add_dependency(&sheet, &cell("C1"), &cell("A1")));
        assert!(!can_add_dependency(&sheet, &cell("C1"), &cell("B1")));
        assert!(can_add_dependency(&sheet, &cell("A1"), &cell("C1")));
        assert!(can_add_dependency(&sheet, &cell("C1"), &cell("D1")));
    }

    #[test]
    fn test_self_reference_rejected() {
        let sheet = sheet_with(&[]);
        assert!(!can_add_dependency(&sheet, &cell("A1"), &cell("A1")));
    }

    #[test]
    fn test_diamond_is_fine() {
        let sheet = sheet_with(&[("A1", &["B1", "+", "C1"]), ("B1", &["D1"]), ("C1", &["D1"])]);
        assert!(can_add_dependency(&sheet, &cell("E1"), &cell("A1")));
        assert!(!can_add_dependency(&sheet, &cell("D1"), &cell("A1")));
    }

    #[test]
    fn test_detect_cycle_direct() {
        let sheet = sheet_with(&[("A1", &["B1"]), ("B1", &["A1"])]);
        assert!(detect_cycle(&sheet, &cell("A1")).is_some());
        assert!(detect_cycle(&sheet, &cell("B1")).is_some());
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let sheet = sheet_with(&[("A1", &["B1"]), ("B1", &["C1"]), ("C1", &["A1"])]);
        let path = detect_cycle(&sheet, &cell("A1")).unwrap();
        assert!(path.len() >= 3);
    }

    #[test]
    fn test_detect_cycle_none() {
        let sheet = sheet_with(&[("A1", &["10"]), ("A2", &["20"]), ("A3", &["A1", "+", "A2"])]);
        assert!(detect_cycle(&sheet, &cell("A3")).is_none());
    }
}
