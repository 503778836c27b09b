use crate::domain::error::PersistenceError;

/// String key-value persistence, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the whole value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

pub trait IdGenerator {
    fn new_id(&self) -> String;
}
