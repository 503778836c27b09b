use crate::domain::traits::IdGenerator;
use std::cell::Cell;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable ids (`id-1`, `id-2`, ...) for fixtures and tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: Cell<u64>,
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.get() + 1;
        self.next.set(n);
        format!("id-{n}")
    }
}
