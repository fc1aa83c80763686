//! Storage entity traits

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Key of a stored entity
///
/// Keys double as file names in the JSON backend, so `as_str` must only yield
/// characters that are safe in a path component.
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    fn as_str(&self) -> &str;
}

/// Entity that can be persisted by a `Storage` backend
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: StorageKey;

    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{ExperimentId, ExperimentTest, Variant};

    #[test]
    fn test_experiment_key() {
        let test = ExperimentTest::new(
            ExperimentId::new("checkout-copy").unwrap(),
            "Checkout copy",
            Variant::new("short", "Short", "Buy now").unwrap(),
            Variant::new("long", "Long", "Complete your purchase").unwrap(),
        )
        .unwrap();

        assert_eq!(test.key().as_str(), "checkout-copy");
    }
}
