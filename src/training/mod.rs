//! Model training: regression trees, the bagged forest, cross-validation,
//! and evaluation metrics

pub mod cross_validation;
pub mod decision_tree;
pub mod metrics;
pub mod random_forest;

pub use cross_validation::{CvScores, FoldSplit, KFold};
pub use decision_tree::{RegressionTree, TreeNode};
pub use metrics::{evaluate, Metrics};
pub use random_forest::{ForestConfig, ForestRegressor};
