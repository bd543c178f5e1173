//! Selection of one installed version per caller intent.

use crate::catalog::InstalledVersion;

/// Pick a version from a most-recent-first catalog.
///
/// With no request, the newest entry wins. A requested version matches the
/// first entry that contains it once `.` separators are stripped from both
/// sides, so partial requests resolve to the newest satisfying install
/// (`"19"` finds `"19.1"` before `"19.0"`, `"190"` and `"19.0"` are the
/// same token). A request that matches nothing is handed back unchanged:
/// an explicit top dir may still stand in for it, and otherwise the
/// resolver fails carrying the locations it searched.
///
/// Returns `None` only for an empty catalog with no request; whether that
/// is a soft decline or an error is the pipeline's call, not ours.
pub fn select(versions: &[InstalledVersion], requested: Option<&str>) -> Option<String> {
    match requested {
        None => versions.first().map(|v| v.version.clone()),
        Some(request) => {
            let token = normalize(request);
            versions
                .iter()
                .find(|v| normalize(&v.version).contains(&token))
                .map(|v| v.version.clone())
                .or_else(|| Some(request.to_string()))
        }
    }
}

fn normalize(version: &str) -> String {
    version.chars().filter(|c| *c != '.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InstallOrigin;

    fn catalog(versions: &[&str]) -> Vec<InstalledVersion> {
        versions
            .iter()
            .map(|v| InstalledVersion {
                version: v.to_string(),
                origin: InstallOrigin::RegistryLegacy,
            })
            .collect()
    }

    #[test]
    fn test_no_request_takes_newest() {
        let versions = catalog(&["2021.3", "19.1", "19.0"]);
        assert_eq!(select(&versions, None).as_deref(), Some("2021.3"));
    }

    #[test]
    fn test_no_request_empty_catalog() {
        assert_eq!(select(&[], None), None);
    }

    #[test]
    fn test_partial_request_takes_newest_match() {
        let versions = catalog(&["2021.3", "19.1", "19.0"]);
        assert_eq!(select(&versions, Some("19")).as_deref(), Some("19.1"));
    }

    #[test]
    fn test_separators_stripped_on_both_sides() {
        let versions = catalog(&["19.0"]);
        assert_eq!(select(&versions, Some("19.0")).as_deref(), Some("19.0"));
        assert_eq!(select(&versions, Some("190")).as_deref(), Some("19.0"));
    }

    #[test]
    fn test_unmatched_request_passes_through() {
        let versions = catalog(&["2021.3"]);
        assert_eq!(select(&versions, Some("99.9")).as_deref(), Some("99.9"));
        assert_eq!(select(&[], Some("99.9")).as_deref(), Some("99.9"));
    }
}
