//! Flat input tables for the hierarchy builder

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::builder::{build_forest, BuildOptions};
use super::node::HierarchyView;
use crate::entity::{department, employee, position, position_department, position_position};

/// All rows the hierarchy is built from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgTables {
    pub departments: Vec<department::Model>,
    pub positions: Vec<position::Model>,
    pub position_departments: Vec<position_department::Model>,
    pub position_positions: Vec<position_position::Model>,
    pub employees: Vec<employee::Model>,
}

/// Borrowed view over the five collections
#[derive(Clone, Copy, Debug)]
pub struct TableSet<'a> {
    pub departments: &'a [department::Model],
    pub positions: &'a [position::Model],
    pub position_departments: &'a [position_department::Model],
    pub position_positions: &'a [position_position::Model],
    pub employees: &'a [employee::Model],
}

impl OrgTables {
    pub fn view(&self) -> TableSet<'_> {
        TableSet {
            departments: &self.departments,
            positions: &self.positions,
            position_departments: &self.position_departments,
            position_positions: &self.position_positions,
            employees: &self.employees,
        }
    }

    /// SHA-256 over the JSON encoding of every row, hex encoded
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Collections as they arrive from an asynchronous loader.
///
/// A collection stays `None` until it has been loaded successfully. The
/// hierarchy is only built once every collection is present.
#[derive(Clone, Debug, Default)]
pub struct OrgSources {
    pub departments: Option<Vec<department::Model>>,
    pub positions: Option<Vec<position::Model>>,
    pub position_departments: Option<Vec<position_department::Model>>,
    pub position_positions: Option<Vec<position_position::Model>>,
    pub employees: Option<Vec<employee::Model>>,
}

impl OrgSources {
    pub fn is_ready(&self) -> bool {
        self.view().is_some()
    }

    pub fn view(&self) -> Option<TableSet<'_>> {
        Some(TableSet {
            departments: self.departments.as_deref()?,
            positions: self.positions.as_deref()?,
            position_departments: self.position_departments.as_deref()?,
            position_positions: self.position_positions.as_deref()?,
            employees: self.employees.as_deref()?,
        })
    }

    pub fn into_tables(self) -> Option<OrgTables> {
        Some(OrgTables {
            departments: self.departments?,
            positions: self.positions?,
            position_departments: self.position_departments?,
            position_positions: self.position_positions?,
            employees: self.employees?,
        })
    }

    /// Names of the collections still missing
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.departments.is_none() {
            missing.push("departments");
        }
        if self.positions.is_none() {
            missing.push("positions");
        }
        if self.position_departments.is_none() {
            missing.push("positiondepartments");
        }
        if self.position_positions.is_none() {
            missing.push("positionpositions");
        }
        if self.employees.is_none() {
            missing.push("employees");
        }
        missing
    }
}

impl From<OrgTables> for OrgSources {
    fn from(tables: OrgTables) -> Self {
        Self {
            departments: Some(tables.departments),
            positions: Some(tables.positions),
            position_departments: Some(tables.position_departments),
            position_positions: Some(tables.position_positions),
            employees: Some(tables.employees),
        }
    }
}

/// Build the hierarchy, deferring while any collection is still loading
pub fn build_hierarchy(sources: &OrgSources, options: &BuildOptions) -> HierarchyView {
    match sources.view() {
        None => HierarchyView::Loading,
        Some(tables) => HierarchyView::from_nodes(build_forest(tables, options)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrgTables {
        OrgTables {
            departments: vec![department::Model {
                department_id: 1,
                name: "Head Office".to_string(),
                parent_department_id: None,
                parent_position_id: None,
                is_organization: true,
                logo_path: None,
                deleted: false,
            }],
            positions: vec![position::Model {
                position_id: 10,
                name: "Director".to_string(),
                deleted: false,
            }],
            position_departments: vec![position_department::Model {
                id: 1,
                position_id: 10,
                department_id: 1,
                staff_units: 1,
                current_count: 0,
                vacancies: 1,
                sort: 0,
                deleted: false,
            }],
            position_positions: vec![],
            employees: vec![],
        }
    }

    #[test]
    fn test_sources_not_ready_until_all_loaded() {
        let mut sources = OrgSources::default();
        assert!(!sources.is_ready());
        assert_eq!(sources.missing().len(), 5);

        let tables = sample();
        sources.departments = Some(tables.departments.clone());
        sources.positions = Some(tables.positions.clone());
        sources.position_departments = Some(tables.position_departments.clone());
        sources.position_positions = Some(vec![]);
        assert!(!sources.is_ready());
        assert_eq!(sources.missing(), vec!["employees"]);

        let view = build_hierarchy(&sources, &BuildOptions::new(2));
        assert_eq!(view, HierarchyView::Loading);

        sources.employees = Some(vec![]);
        assert!(sources.is_ready());
        assert!(matches!(
            build_hierarchy(&sources, &BuildOptions::new(2)),
            HierarchyView::Ready(_)
        ));
    }

    #[test]
    fn test_empty_tables_build_to_empty_view() {
        let sources = OrgSources::from(OrgTables::default());
        assert_eq!(
            build_hierarchy(&sources, &BuildOptions::new(3)),
            HierarchyView::Empty
        );
    }

    #[test]
    fn test_into_tables_round_trip() {
        let tables = sample();
        let sources = OrgSources::from(tables.clone());
        assert_eq!(sources.into_tables(), Some(tables));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let tables = sample();
        let a = tables.fingerprint().unwrap();
        assert_eq!(a, tables.clone().fingerprint().unwrap());
        assert_eq!(a.len(), 64);

        let mut changed = tables;
        changed.position_departments[0].vacancies = 2;
        assert_ne!(a, changed.fingerprint().unwrap());
    }
}
