//! Case-number to script-file reconciliation.

use std::collections::{HashMap, HashSet};

/// Outcome of matching case numbers against script file names.
///
/// `match_map` holds one entry per distinct input case number; `missing_scripts`
/// is exactly the subset of keys mapped to `false`, in input order;
/// `extra_scripts` holds the file names of scripts with no corresponding case,
/// in archive scan order.
#[derive(Clone, Debug, Default)]
pub struct ReconciliationResult {
    match_map: HashMap<String, bool>,
    missing_scripts: Vec<String>,
    extra_scripts: Vec<String>,
}

impl ReconciliationResult {
    /// Whether a script exists for the given case number.
    ///
    /// Case numbers absent from the input report `false`.
    pub fn script_exists(&self, case_number: &str) -> bool {
        self.match_map.get(case_number).copied().unwrap_or(false)
    }

    /// Per-case match table.
    pub fn match_map(&self) -> &HashMap<String, bool> {
        &self.match_map
    }

    /// Case numbers with no corresponding script, in input order.
    pub fn missing_scripts(&self) -> &[String] {
        &self.missing_scripts
    }

    /// Script file names with no corresponding case, in scan order.
    pub fn extra_scripts(&self) -> &[String] {
        &self.extra_scripts
    }

    /// Number of cases with a matching script.
    pub fn matched_count(&self) -> usize {
        self.match_map.values().filter(|matched| **matched).count()
    }

    /// Number of cases without a matching script.
    pub fn missing_count(&self) -> usize {
        self.missing_scripts.len()
    }

    /// Number of scripts without a matching case.
    pub fn extra_count(&self) -> usize {
        self.extra_scripts.len()
    }

    /// Number of distinct input case numbers.
    pub fn total_cases(&self) -> usize {
        self.match_map.len()
    }

    /// True when every case has a script.
    pub fn is_fully_matched(&self) -> bool {
        self.missing_scripts.is_empty()
    }
}

/// Strip a trailing script extension, matched case-insensitively.
///
/// Returns the input unchanged when no extension is present.
fn strip_script_extension(file_name: &str) -> &str {
    let ext_len = crate::SCRIPT_EXTENSION.len();
    if file_name.len() >= ext_len && file_name.is_char_boundary(file_name.len() - ext_len) {
        let (stem, ext) = file_name.split_at(file_name.len() - ext_len);
        if ext.eq_ignore_ascii_case(crate::SCRIPT_EXTENSION) {
            return stem;
        }
    }
    file_name
}

/// Match each case number against the set of script file names.
///
/// Duplicate case numbers in the input collapse to a single `match_map`
/// entry; the value is a pure membership test against the script set, so
/// first and last occurrence agree. Duplicate script names for the same case
/// key likewise collapse.
pub fn reconcile(case_numbers: &[String], script_file_names: &[String]) -> ReconciliationResult {
    let mut by_case_key: HashMap<&str, &str> = HashMap::new();
    for file_name in script_file_names {
        by_case_key.insert(strip_script_extension(file_name), file_name);
    }

    let mut match_map = HashMap::new();
    let mut missing_scripts = Vec::new();
    for case_number in case_numbers {
        if match_map.contains_key(case_number) {
            continue;
        }
        let exists = by_case_key.contains_key(case_number.as_str());
        match_map.insert(case_number.clone(), exists);
        if !exists {
            missing_scripts.push(case_number.clone());
        }
    }

    let case_set: HashSet<&str> = case_numbers.iter().map(String::as_str).collect();
    let mut extra_scripts = Vec::new();
    let mut seen_extra: HashSet<&str> = HashSet::new();
    for file_name in script_file_names {
        let key = strip_script_extension(file_name);
        if !case_set.contains(key) && seen_extra.insert(key) {
            extra_scripts.push(file_name.clone());
        }
    }

    ReconciliationResult {
        match_map,
        missing_scripts,
        extra_scripts,
    }
}

/// Whether any script file name maps to the given case number.
///
/// Shares the case-insensitive extension-suffix matching of [`reconcile`].
/// Empty case numbers never match.
pub fn has_script_for_case(case_number: &str, script_file_names: &[String]) -> bool {
    script_file_name_for_case(case_number, script_file_names).is_some()
}

/// The script file name matching the given case number, if any.
///
/// A file name matches when stripping its script extension yields the case
/// number exactly; files without the extension never match.
pub fn script_file_name_for_case<'a>(
    case_number: &str,
    script_file_names: &'a [String],
) -> Option<&'a str> {
    if case_number.is_empty() {
        return None;
    }
    script_file_names.iter().map(String::as_str).find(|name| {
        let stem = strip_script_extension(name);
        stem.len() != name.len() && stem == case_number
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reconcile_basic() {
        let cases = strings(&["TC001", "TC002", "TC003"]);
        let scripts = strings(&["TC001.py", "TC003.py", "TC099.py"]);
        let result = reconcile(&cases, &scripts);

        assert!(result.script_exists("TC001"));
        assert!(!result.script_exists("TC002"));
        assert!(result.script_exists("TC003"));
        assert_eq!(result.missing_scripts(), &["TC002".to_string()]);
        assert_eq!(result.extra_scripts(), &["TC099.py".to_string()]);
        assert_eq!(result.matched_count(), 2);
        assert_eq!(result.total_cases(), 3);
    }

    #[test]
    fn test_partition_invariant() {
        let cases = strings(&["A", "B", "C", "D"]);
        let scripts = strings(&["B.py", "D.py", "E.py"]);
        let result = reconcile(&cases, &scripts);

        assert_eq!(
            result.matched_count() + result.missing_count(),
            result.total_cases()
        );
        for extra in result.extra_scripts() {
            let key = extra.strip_suffix(".py").unwrap();
            assert!(!result.missing_scripts().contains(&key.to_string()));
        }
    }

    #[test]
    fn test_extension_case_insensitive() {
        let cases = strings(&["TC001"]);
        let result = reconcile(&cases, &strings(&["TC001.PY"]));
        assert!(result.script_exists("TC001"));
        assert!(result.is_fully_matched());
    }

    #[test]
    fn test_empty_cases_all_scripts_extra() {
        let result = reconcile(&[], &strings(&["a.py", "b.py"]));
        assert_eq!(result.total_cases(), 0);
        assert_eq!(result.missing_count(), 0);
        assert_eq!(result.extra_scripts(), &["a.py".to_string(), "b.py".to_string()]);
    }

    #[test]
    fn test_empty_scripts_all_cases_missing() {
        let cases = strings(&["A", "B"]);
        let result = reconcile(&cases, &[]);
        assert_eq!(result.matched_count(), 0);
        assert_eq!(result.missing_scripts(), cases.as_slice());
        assert_eq!(result.extra_count(), 0);
    }

    #[test]
    fn test_duplicate_case_numbers_collapse() {
        let cases = strings(&["TC001", "TC001", "TC002", "TC002"]);
        let result = reconcile(&cases, &strings(&["TC001.py"]));
        assert_eq!(result.total_cases(), 2);
        assert_eq!(result.missing_scripts(), &["TC002".to_string()]);
    }

    #[test]
    fn test_extras_preserve_scan_order() {
        let scripts = strings(&["z.py", "a.py", "m.py"]);
        let result = reconcile(&[], &scripts);
        assert_eq!(result.extra_scripts(), scripts.as_slice());
    }

    #[test]
    fn test_has_script_for_case() {
        let scripts = strings(&["TC001.py", "TC002.PY"]);
        assert!(has_script_for_case("TC001", &scripts));
        assert!(has_script_for_case("TC002", &scripts));
        assert!(!has_script_for_case("TC003", &scripts));
        assert!(!has_script_for_case("", &scripts));
    }

    #[test]
    fn test_script_file_name_for_case() {
        let scripts = strings(&["TC001.py"]);
        assert_eq!(
            script_file_name_for_case("TC001", &scripts),
            Some("TC001.py")
        );
        assert_eq!(script_file_name_for_case("TC002", &scripts), None);
        // A bare name with no extension is not a script.
        let bare = strings(&["TC001"]);
        assert_eq!(script_file_name_for_case("TC001", &bare), None);
    }
}
