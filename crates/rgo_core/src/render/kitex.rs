use std::process::Command;

use camino::Utf8Path;
use tracing::debug;

use crate::{Error, Result};

/// Invocation of the external Kitex code generator, which populates
/// `kitex_gen/…` with the base types of an IDL file.
///
/// The option set is fixed: slim templates, frugal tags, no generated
/// serdes/fmt/setters, and the package prefix rooted at the project module.
#[derive(Debug)]
pub struct KitexCommand<'a> {
    idl_path: &'a Utf8Path,
    service_dir: &'a Utf8Path,
    project_module: &'a str,
}

impl<'a> KitexCommand<'a> {
    pub fn new(
        idl_path: &'a Utf8Path,
        service_dir: &'a Utf8Path,
        project_module: &'a str,
    ) -> Self {
        Self {
            idl_path,
            service_dir,
            project_module,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-module".into(), self.project_module.into()];
        for thrift_opt in [
            "template=slim",
            "frugal_tag",
            "gen_deep_equal=false",
            "gen_setter=false",
            "no_default_serdes",
            "no_fmt",
        ] {
            args.push("-thrift".into());
            args.push(thrift_opt.into());
        }
        args.push("-frugal-pretouch".into());
        args.push(self.idl_path.as_str().into());
        args
    }

    /// Run `kitex` in the service directory.
    pub fn run(&self) -> Result<()> {
        let args = self.args();
        debug!("running kitex {} in {}", args.join(" "), self.service_dir);

        let output = Command::new("kitex")
            .current_dir(self.service_dir)
            .args(&args)
            .output()
            .map_err(|e| Error::Toolchain {
                tool: "kitex".to_string(),
                output: format!("cannot run kitex: {e}. Is it installed?"),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Toolchain {
                tool: "kitex".to_string(),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_option_set_is_passed() {
        let cmd = KitexCommand::new(
            Utf8Path::new("/cache/idl/orders/svc/one.thrift"),
            Utf8Path::new("/cache/repo/svc_one"),
            "rgo",
        );
        let args = cmd.args();
        assert_eq!(args[..2], ["-module".to_string(), "rgo".to_string()]);
        assert!(args.contains(&"template=slim".to_string()));
        assert!(args.contains(&"no_default_serdes".to_string()));
        assert!(args.contains(&"no_fmt".to_string()));
        assert!(args.contains(&"frugal_tag".to_string()));
        assert!(args.contains(&"-frugal-pretouch".to_string()));
        assert_eq!(args.last().unwrap(), "/cache/idl/orders/svc/one.thrift");
    }
}
