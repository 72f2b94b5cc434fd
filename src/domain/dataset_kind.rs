// ============================================================
// Layer 3 — Dataset Kinds
// ============================================================
// MNIST and Fashion-MNIST share the IDX file format, the
// 28x28 image size and the number of classes. They differ
// only in what the ten labels mean.
//
// Both enums implement FromStr + Display so the CLI layer
// can parse them without this layer depending on clap.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const DIGIT_CLASSES: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const FASHION_CLASSES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

/// Which image dataset a directory of IDX files holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    /// Handwritten digits 0-9
    Mnist,
    /// Zalando clothing items
    FashionMnist,
}

impl DatasetKind {
    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Mnist        => &DIGIT_CLASSES,
            DatasetKind::FashionMnist => &FASHION_CLASSES,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.class_names().len()
    }

    /// Human readable name for a class index, falling back to the index itself
    pub fn class_name(&self, index: usize) -> String {
        self.class_names()
            .get(index)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("class {index}"))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Mnist        => write!(f, "mnist"),
            DatasetKind::FashionMnist => write!(f, "fashion-mnist"),
        }
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "mnist"                    => Ok(DatasetKind::Mnist),
            "fashion-mnist" | "fashion" => Ok(DatasetKind::FashionMnist),
            other => Err(format!(
                "unknown dataset '{other}', expected 'mnist' or 'fashion-mnist'"
            )),
        }
    }
}

/// The two splits shipped with both datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// File name prefix used by the IDX distribution
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "t10k",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test  => write!(f, "test"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_names() {
        assert_eq!("mnist".parse::<DatasetKind>(), Ok(DatasetKind::Mnist));
        assert_eq!("Fashion_MNIST".parse::<DatasetKind>(), Ok(DatasetKind::FashionMnist));
        assert!("cifar".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for kind in [DatasetKind::Mnist, DatasetKind::FashionMnist] {
            assert_eq!(kind.to_string().parse::<DatasetKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_class_names() {
        assert_eq!(DatasetKind::Mnist.num_classes(), 10);
        assert_eq!(DatasetKind::FashionMnist.class_name(9), "Ankle boot");
        assert_eq!(DatasetKind::Mnist.class_name(12), "class 12");
    }
}
