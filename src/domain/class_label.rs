// ============================================================
// Layer 3 — ClassLabel Domain Type
// ============================================================
// The ten CIFAR-10 categories. The discriminant is the class
// index the network is trained to predict (0..=9).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of output classes of the classifier.
pub const NUM_CLASSES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    Airplane   = 0,
    Automobile = 1,
    Bird       = 2,
    Cat        = 3,
    Deer       = 4,
    Dog        = 5,
    Frog       = 6,
    Horse      = 7,
    Ship       = 8,
    Truck      = 9,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; NUM_CLASSES] = [
        ClassLabel::Airplane,
        ClassLabel::Automobile,
        ClassLabel::Bird,
        ClassLabel::Cat,
        ClassLabel::Deer,
        ClassLabel::Dog,
        ClassLabel::Frog,
        ClassLabel::Horse,
        ClassLabel::Ship,
        ClassLabel::Truck,
    ];

    /// Look up a label by its class index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a label by its lowercase CIFAR-10 name, e.g. "automobile".
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::Airplane   => "airplane",
            ClassLabel::Automobile => "automobile",
            ClassLabel::Bird       => "bird",
            ClassLabel::Cat        => "cat",
            ClassLabel::Deer       => "deer",
            ClassLabel::Dog        => "dog",
            ClassLabel::Frog       => "frog",
            ClassLabel::Horse      => "horse",
            ClassLabel::Ship       => "ship",
            ClassLabel::Truck      => "truck",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_name_agree() {
        for (i, label) in ClassLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(ClassLabel::from_index(i), Some(*label));
            assert_eq!(ClassLabel::from_name(label.name()), Some(*label));
        }
    }

    #[test]
    fn test_unknown_lookups() {
        assert_eq!(ClassLabel::from_index(10), None);
        assert_eq!(ClassLabel::from_name("platypus"), None);
    }
}
