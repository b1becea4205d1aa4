//! Observer set registry: the roster of addresses allowed to vote.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use xchain_types::Address;

use crate::error::ObserverError;

/// Ordered list of unique observer addresses.
///
/// Order is insertion order; a ballot's voter list is a copy of this list, so
/// every replica assigns the same slot to the same observer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverSet {
    observer_list: Vec<Address>,
}

impl ObserverSet {
    /// Build a set, rejecting malformed or duplicate addresses.
    pub fn new(observers: Vec<Address>) -> Result<Self, ObserverError> {
        let set = Self {
            observer_list: observers,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn observers(&self) -> &[Address] {
        &self.observer_list
    }

    pub fn len(&self) -> usize {
        self.observer_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observer_list.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.observer_list.contains(address)
    }

    /// Copy of the roster for a new ballot's voter list.
    pub fn snapshot(&self) -> Vec<Address> {
        self.observer_list.clone()
    }

    pub fn add(&mut self, address: Address) -> Result<(), ObserverError> {
        if !address.is_valid() {
            return Err(xchain_types::XchainError::InvalidAddress(address.to_string()).into());
        }
        if self.contains(&address) {
            return Err(ObserverError::ObserverAlreadyExists(address));
        }
        self.observer_list.push(address);
        Ok(())
    }

    pub fn remove(&mut self, address: &Address) -> Result<(), ObserverError> {
        let index = self
            .observer_list
            .iter()
            .position(|a| a == address)
            .ok_or_else(|| ObserverError::ObserverNotFound(address.clone()))?;
        self.observer_list.remove(index);
        Ok(())
    }

    /// Replace `old` with `new` in place, keeping its position.
    pub fn replace(&mut self, old: &Address, new: Address) -> Result<(), ObserverError> {
        if !new.is_valid() {
            return Err(xchain_types::XchainError::InvalidAddress(new.to_string()).into());
        }
        if self.contains(&new) {
            return Err(ObserverError::ObserverAlreadyExists(new));
        }
        let index = self
            .observer_list
            .iter()
            .position(|a| a == old)
            .ok_or_else(|| ObserverError::ObserverNotFound(old.clone()))?;
        self.observer_list[index] = new;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ObserverError> {
        if let Some(bad) = self.observer_list.iter().find(|a| !a.is_valid()) {
            return Err(xchain_types::XchainError::InvalidAddress(bad.to_string()).into());
        }
        let mut seen = BTreeSet::new();
        for addr in &self.observer_list {
            if !seen.insert(addr) {
                return Err(ObserverError::ObserverAlreadyExists(addr.clone()));
            }
        }
        Ok(())
    }
}

/// Roster size recorded at the last membership change, for drift detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastObserverCount {
    pub count: u64,
    pub last_change_height: i64,
}
