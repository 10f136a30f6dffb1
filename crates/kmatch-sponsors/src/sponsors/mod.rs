mod key;
mod normalizer;
mod registry;
mod rules;
mod store;

pub use key::{derive_key, DerivedKey};
pub use normalizer::normalize_name;
pub use registry::{MergeOutcome, MergeSummary, SponsorRegistry};
pub use rules::{KeyRule, KeyRules, MergePolicy, RulePolicies, RulesError};
pub use store::{JsonRegistryStore, RegistryStore};
