//! Concrete benchmark workloads.

pub mod black_scholes;
pub mod byte_copy;
pub mod vector_add;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::estimator::DEFAULT_DEVIATION_THRESHOLD;

pub use black_scholes::{BlackScholesDataset, OptionKind, OptionParams};
pub use byte_copy::ByteCopyDataset;
pub use vector_add::VectorAddDataset;

/// Workload families selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Family {
    #[value(name = "vvadd")]
    #[serde(rename = "vvadd")]
    VectorAdd,
    #[value(name = "copy")]
    #[serde(rename = "copy")]
    ByteCopy,
    #[value(name = "blackscholes")]
    #[serde(rename = "blackscholes")]
    BlackScholes,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::VectorAdd, Family::ByteCopy, Family::BlackScholes];

    pub fn name(&self) -> &'static str {
        match self {
            Family::VectorAdd => "vvadd",
            Family::ByteCopy => "copy",
            Family::BlackScholes => "blackscholes",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Family::VectorAdd => "Element-wise addition of two i32 vectors",
            Family::ByteCopy => "Byte buffer copy",
            Family::BlackScholes => "Black-Scholes European option pricing (f32)",
        }
    }

    /// `nstd` used for this family unless one is configured. Byte copies are
    /// filtered more tightly.
    pub fn default_deviation_threshold(&self) -> u32 {
        match self {
            Family::ByteCopy => 2,
            Family::VectorAdd | Family::BlackScholes => DEFAULT_DEVIATION_THRESHOLD,
        }
    }

    /// Short names of the family's implementations, in reporting order.
    pub fn implementation_names(&self) -> Vec<String> {
        match self {
            Family::VectorAdd => vector_add::kernels().names(),
            Family::ByteCopy => byte_copy::kernels().names(),
            Family::BlackScholes => black_scholes::kernels().names(),
        }
    }

    /// Long labels of the family's implementations, as used in report and
    /// file names.
    pub fn implementation_labels(&self) -> Vec<&'static str> {
        match self {
            Family::VectorAdd => vector_add::kernels().labels(),
            Family::ByteCopy => byte_copy::kernels().labels(),
            Family::BlackScholes => black_scholes::kernels().labels(),
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implementation_names() {
        assert_eq!(
            Family::VectorAdd.implementation_names(),
            vec!["naive", "opt", "vec", "para"]
        );
        assert_eq!(Family::ByteCopy.implementation_names(), vec!["naive", "opt", "para"]);
        assert_eq!(Family::BlackScholes.implementation_names(), vec!["scalar", "para"]);
    }

    #[test]
    fn test_implementation_labels() {
        assert_eq!(
            Family::VectorAdd.implementation_labels(),
            vec!["scalar_naive", "scalar_opt", "vectorized", "parallelized"]
        );
        assert_eq!(
            Family::ByteCopy.implementation_labels(),
            vec!["scalar_naive", "scalar_opt", "parallelized"]
        );
        assert_eq!(
            Family::BlackScholes.implementation_labels(),
            vec!["scalar", "parallelized"]
        );
    }

    #[test]
    fn test_default_deviation_thresholds() {
        assert_eq!(Family::VectorAdd.default_deviation_threshold(), 3);
        assert_eq!(Family::ByteCopy.default_deviation_threshold(), 2);
        assert_eq!(Family::BlackScholes.default_deviation_threshold(), 3);
    }

    #[test]
    fn test_family_parses_from_cli_name() {
        assert_eq!(Family::from_str("vvadd", false).unwrap(), Family::VectorAdd);
        assert_eq!(Family::BlackScholes.to_string(), "blackscholes");
    }
}
