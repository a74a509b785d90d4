//! Data packages: unpacked files copied into the install dir.

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::BuildSystem;
use crate::core::BuildSystemKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Data;

impl BuildSystem for Data {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Data
    }

    fn build(&self, _ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(Vec::new())
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let patterns = ctx.expand_all(&ctx.package.build_settings().files)?;
        Ok(vec![StepAction::CopyFiles {
            from: ctx.work_dir().to_path_buf(),
            patterns,
            to: ctx.install_dir(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::BuildContext;
    use crate::test_support::{manifest, package_at};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_data_copies_declared_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("measures");
        let pkg = package_at(
            &dir,
            &manifest("measures", "data", &[], "files = [\"ephemerides/*\", \"geodetic\"]\n"),
        );
        let build = BuildContext::new(tmp.path().to_path_buf());
        let ctx = PackageContext::new(&pkg, &build, BTreeMap::new()).unwrap();

        Data.check_tools(&ctx).unwrap();
        assert!(Data.configure(&ctx).unwrap().is_empty());
        assert_eq!(
            Data.install(&ctx).unwrap(),
            vec![StepAction::CopyFiles {
                from: dir.clone(),
                patterns: vec!["ephemerides/*".to_string(), "geodetic".to_string()],
                to: dir.join("install"),
            }]
        );
    }
}
