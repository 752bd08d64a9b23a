//! Test case records parsed from a case-set manifest.

use serde::{Deserialize, Serialize};

/// One parsed manifest row.
///
/// Records surviving the parse always carry a non-empty `case_name` and
/// `case_number` (rows missing either are dropped). `case_number` is the
/// reconciliation key matched against script file names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Human-readable case title.
    pub case_name: String,
    /// Unique case identifier within the set.
    pub case_number: String,
    /// Logical network topology the case runs against.
    pub network_topology: String,
    /// Business category label.
    pub business_category: String,
    /// Application under test.
    pub app_name: String,
    /// Test step description.
    pub test_steps: String,
    /// Expected result description.
    pub expected_result: String,
}
