//! Pure response-merging steps, separated from process wiring for testing.

use rgo_core::{DriverResponse, PackageDescriptor};

/// Drop packages the default driver could not resolve under the project
/// module: those are the IDE-visible stubs for services the generator hasn't
/// produced (or re-produced) yet, and reporting them broken would surface
/// spurious diagnostics.
pub fn drop_broken_project_packages(packages: &mut Vec<PackageDescriptor>, project_module: &str) {
    let prefix = format!("{project_module}/");
    packages.retain(|pkg| !(pkg.has_errors() && pkg.pkg_path.starts_with(&prefix)));
}

/// Prepend the generated descriptors and make each of them a root.
pub fn inject_generated(response: &mut DriverResponse, injected: Vec<PackageDescriptor>) {
    response.roots.extend(injected.iter().map(|p| p.id.clone()));
    let mut packages = injected;
    packages.append(&mut response.packages);
    response.packages = packages;
}

/// The allow-listed packages the response doesn't contain yet.
pub fn missing_allowlist(response: &DriverResponse, allowlist: &[&str]) -> Vec<String> {
    allowlist
        .iter()
        .filter(|pkg| !response.packages.iter().any(|p| p.pkg_path == **pkg))
        .map(|pkg| (*pkg).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn package(pkg_path: &str, broken: bool) -> PackageDescriptor {
        PackageDescriptor {
            id: pkg_path.to_string(),
            pkg_path: pkg_path.to_string(),
            errors: if broken {
                vec![serde_json::json!({"Msg": "no Go files"})]
            } else {
                vec![]
            },
            ..Default::default()
        }
    }

    #[test]
    fn only_broken_project_packages_are_dropped() {
        let mut packages = vec![
            package("demo/svc_one", true),
            package("demo/svc_two", false),
            package("github.com/other/pkg", true),
        ];
        drop_broken_project_packages(&mut packages, "demo");
        let paths: Vec<&str> = packages.iter().map(|p| p.pkg_path.as_str()).collect();
        assert_eq!(paths, ["demo/svc_two", "github.com/other/pkg"]);
    }

    #[test]
    fn the_module_prefix_is_parameterized() {
        let mut packages = vec![package("rgo/svc_one", true)];
        drop_broken_project_packages(&mut packages, "demo");
        assert_eq!(packages.len(), 1, "other modules' packages must survive");
    }

    #[test]
    fn injected_packages_come_first_and_become_roots() {
        let mut response = DriverResponse {
            roots: vec!["demo".to_string()],
            packages: vec![package("demo", false)],
            ..Default::default()
        };
        inject_generated(
            &mut response,
            vec![package("demo/svc_one", false), package("context", false)],
        );

        assert_eq!(response.roots, ["demo", "demo/svc_one", "context"]);
        let paths: Vec<&str> = response.packages.iter().map(|p| p.pkg_path.as_str()).collect();
        assert_eq!(paths, ["demo/svc_one", "context", "demo"]);
    }

    #[test]
    fn allowlist_reports_only_absent_packages() {
        let response = DriverResponse {
            roots: vec![],
            packages: vec![package("context", false)],
            ..Default::default()
        };
        let missing = missing_allowlist(&response, &["context", "fmt"]);
        assert_eq!(missing, ["fmt"]);
    }
}
