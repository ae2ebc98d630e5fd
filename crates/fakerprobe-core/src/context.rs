//! Immutable per-run test context built from fixture files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::fixture::{self, FixtureError};
use crate::request::ParamValue;
use crate::resource::{Resource, ResourceDescriptor};

/// Fixture file shared by every suite.
pub const COMMON_FIXTURE: &str = "common.json";

/// Locales, quantities and seeds every suite is parameterized over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFixtures {
    pub locales: Vec<String>,
    pub quantities: Vec<u32>,
    pub seeds: Vec<i64>,
}

impl CommonFixtures {
    /// Read `locales`, `valid_qty` and `seeds` from `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file or any key is missing, or a value has the
    /// wrong type. Quantities must be non-negative.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let map = fixture::load(path)?;
        let locales = fixture::strings(&fixture::array(&map, path, "locales")?, path, "locales")?;
        let quantities = fixture::integers(
            &fixture::array(&map, path, "valid_qty")?,
            path,
            "valid_qty",
        )?
        .into_iter()
        .map(|q| {
            u32::try_from(q).map_err(|_| FixtureError::InvalidValue {
                path: path.to_path_buf(),
                key: "valid_qty".to_string(),
                value: q.to_string(),
                expected: "non-negative integer",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
        let seeds = fixture::integers(&fixture::array(&map, path, "seeds")?, path, "seeds")?;

        Ok(Self {
            locales,
            quantities,
            seeds,
        })
    }
}

/// Valid and invalid values for one resource-specific parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisValues {
    pub param: &'static str,
    pub valid: Vec<ParamValue>,
    pub invalid: Vec<ParamValue>,
}

/// All fixture data for a run. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    pub data_dir: PathBuf,
    pub common: CommonFixtures,
    axes: BTreeMap<Resource, Vec<AxisValues>>,
}

impl TestContext {
    /// Load the common fixture and the axis fixtures of `descriptors`.
    ///
    /// # Errors
    ///
    /// Returns the first fixture error; no partial context is produced.
    pub fn load(data_dir: &Path, descriptors: &[ResourceDescriptor]) -> Result<Self, FixtureError> {
        let common = CommonFixtures::load(&data_dir.join(COMMON_FIXTURE))?;

        let mut axes = BTreeMap::new();
        for descriptor in descriptors {
            axes.insert(descriptor.resource, load_axes(data_dir, descriptor)?);
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            common,
            axes,
        })
    }

    /// Axis values for `resource`, in descriptor order. Empty when the
    /// resource has no axes or was not loaded.
    #[must_use]
    pub fn axes(&self, resource: Resource) -> &[AxisValues] {
        self.axes.get(&resource).map_or(&[], Vec::as_slice)
    }
}

fn load_axes(
    data_dir: &Path,
    descriptor: &ResourceDescriptor,
) -> Result<Vec<AxisValues>, FixtureError> {
    let Some(file) = descriptor.fixture_file else {
        return Ok(Vec::new());
    };
    if descriptor.axes.is_empty() {
        return Ok(Vec::new());
    }

    let path = data_dir.join(file);
    let map = fixture::load(&path)?;

    descriptor
        .axes
        .iter()
        .map(|axis| {
            let valid = fixture::param_values(
                &fixture::array(&map, &path, axis.valid_key)?,
                &path,
                axis.valid_key,
            )?;
            let invalid = match axis.invalid_key {
                Some(key) => fixture::param_values(&fixture::array(&map, &path, key)?, &path, key)?,
                None => Vec::new(),
            };
            Ok(AxisValues {
                param: axis.param,
                valid,
                invalid,
            })
        })
        .collect()
}
